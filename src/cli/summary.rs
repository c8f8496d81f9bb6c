use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{print_filters, section, Context, FilterArgs};
use crate::error::Result;
use crate::fmt::{bar, count, money, percent};
use crate::metrics::{self, entity_label, weekday_name};

const BAR_WIDTH: usize = 30;

pub fn run(args: &FilterArgs) -> Result<()> {
    let ctx = Context::load(args)?;
    let records = ctx.dataset.filter(&ctx.selection);

    println!("{}", "BanVic Summary".bold());
    print_filters(&ctx);

    section("Key Indicators", || {
        let k = metrics::kpis(&records);
        let mut table = Table::new();
        table.set_header(vec!["Indicator", "Value"]);
        table.add_row(vec![Cell::new("Transactions"), Cell::new(count(k.count))]);
        table.add_row(vec![Cell::new("Total volume"), Cell::new(money(k.total))]);
        table.add_row(vec![Cell::new("Average ticket"), Cell::new(money(k.mean))]);
        table.add_row(vec![Cell::new("Approval rate"), Cell::new(percent(k.approval_rate))]);
        Ok(Some(table))
    });

    section("Monthly Volume", || {
        let months = metrics::monthly(&records);
        if months.is_empty() {
            return Ok(None);
        }
        let max = months.iter().map(|b| b.total).fold(0.0, f64::max);
        let mut table = Table::new();
        table.set_header(vec!["Month", "Transactions", "Volume", ""]);
        for b in &months {
            table.add_row(vec![
                Cell::new(b.key),
                Cell::new(count(b.count)).set_alignment(CellAlignment::Right),
                Cell::new(money(b.total)).set_alignment(CellAlignment::Right),
                Cell::new(bar(b.total, max, BAR_WIDTH).blue()),
            ]);
        }
        Ok(Some(table))
    });

    section("Weekday Seasonality", || {
        let days = metrics::weekday(&records);
        if days.is_empty() {
            return Ok(None);
        }
        let mut table = Table::new();
        table.set_header(vec!["Weekday", "Transactions", "Volume", "Average"]);
        for b in &days {
            table.add_row(vec![
                Cell::new(weekday_name(b.key)),
                Cell::new(count(b.count)).set_alignment(CellAlignment::Right),
                Cell::new(money(b.total)).set_alignment(CellAlignment::Right),
                Cell::new(money(b.mean)).set_alignment(CellAlignment::Right),
            ]);
        }
        Ok(Some(table))
    });

    let top = ctx.settings.chart_top;
    let months = ctx.settings.trailing_months;
    section(&format!("Top {top} Branches (last {months} months)"), || {
        let branches = ctx.dataset.branches.as_ref();
        let ranking = metrics::rank_recent(&records, months, |r| {
            entity_label(r.branch_ref.as_deref(), branches)
        });
        if ranking.is_empty() {
            return Ok(None);
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "Branch", "Transactions", "Volume"]);
        for (i, row) in ranking.head(top).iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&row.label),
                Cell::new(count(row.count)).set_alignment(CellAlignment::Right),
                Cell::new(money(row.total)).set_alignment(CellAlignment::Right),
            ]);
        }
        Ok(Some(table))
    });

    Ok(())
}
