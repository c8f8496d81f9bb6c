use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{print_filters, section, Context, FilterArgs};
use crate::error::Result;
use crate::fmt::{bar, count, date_br, money};
use crate::metrics::{self, entity_label};

const BAR_WIDTH: usize = 30;

pub fn run(args: &FilterArgs) -> Result<()> {
    let ctx = Context::load(args)?;
    let records = ctx.dataset.filter(&ctx.selection);
    let months = ctx.settings.trailing_months;
    let branches = ctx.dataset.branches.as_ref();
    let ranking = metrics::rank_recent(&records, months, |r| {
        entity_label(r.branch_ref.as_deref(), branches)
    });

    println!("{}", "Branch Ranking".bold());
    print_filters(&ctx);
    if let Some(start) = ranking.window_start {
        println!("Window:  last {months} months (since {})", date_br(start.date()));
    }

    if let (Some(best), Some(worst)) = (ranking.leader(), ranking.laggard()) {
        println!(
            "\n{} {} ({} transactions)",
            "Most active:".green().bold(),
            best.label,
            count(best.count)
        );
        println!(
            "{} {} ({} transactions)",
            "Least active:".red().bold(),
            worst.label,
            count(worst.count)
        );
    }

    let top = ctx.settings.chart_top;
    section(&format!("Top {top} by Transactions"), || {
        if ranking.is_empty() {
            return Ok(None);
        }
        let rows = ranking.head(top);
        let max = rows.iter().map(|r| r.count).max().unwrap_or(0) as f64;
        let mut table = Table::new();
        table.set_header(vec!["Branch", "Transactions", ""]);
        for row in rows {
            table.add_row(vec![
                Cell::new(&row.label),
                Cell::new(count(row.count)).set_alignment(CellAlignment::Right),
                Cell::new(bar(row.count as f64, max, BAR_WIDTH).cyan()),
            ]);
        }
        Ok(Some(table))
    });

    section("Ranking", || {
        if ranking.is_empty() {
            return Ok(None);
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "Branch", "Transactions", "Volume", "Average"]);
        for (i, row) in ranking.head(ctx.settings.table_top).iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&row.label),
                Cell::new(count(row.count)).set_alignment(CellAlignment::Right),
                Cell::new(money(row.total)).set_alignment(CellAlignment::Right),
                Cell::new(money(row.mean)).set_alignment(CellAlignment::Right),
            ]);
        }
        Ok(Some(table))
    });

    Ok(())
}
