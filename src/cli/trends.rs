use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{print_filters, section, Context, FilterArgs};
use crate::error::Result;
use crate::fmt::{bar, count, money};
use crate::metrics::{self, weekday_name};

const HISTOGRAM_BINS: usize = 10;
const BAR_WIDTH: usize = 30;

fn opt_money(v: Option<f64>) -> String {
    v.map_or_else(|| "N/A".to_string(), money)
}

pub fn run(args: &FilterArgs) -> Result<()> {
    let ctx = Context::load(args)?;
    let records = ctx.dataset.filter(&ctx.selection);

    println!("{}", "Trends".bold());
    print_filters(&ctx);

    section("Even vs Odd Months", || {
        let test = metrics::even_odd_months(&records);
        if test.even_months + test.odd_months == 0 {
            return Ok(None);
        }
        let mut table = Table::new();
        table.set_header(vec!["", "Value"]);
        table.add_row(vec![
            Cell::new("Even months"),
            Cell::new(format!("{} (mean {})", test.even_months, opt_money(test.mean_even))),
        ]);
        table.add_row(vec![
            Cell::new("Odd months"),
            Cell::new(format!("{} (mean {})", test.odd_months, opt_money(test.mean_odd))),
        ]);
        let verdict = match (test.t, test.p) {
            (Some(t), Some(p)) if test.significant() => {
                format!("t = {t:.2}, p = {p:.3}: significant").green()
            }
            (Some(t), Some(p)) => format!("t = {t:.2}, p = {p:.3}: not significant").normal(),
            _ => "Not enough months to compare".yellow(),
        };
        table.add_row(vec![Cell::new("Welch test"), Cell::new(verdict)]);
        Ok(Some(table))
    });

    section("Average Ticket by Weekday", || {
        let days = metrics::weekday(&records);
        if days.is_empty() {
            return Ok(None);
        }
        let max = days.iter().map(|b| b.mean).fold(0.0, f64::max);
        let mut table = Table::new();
        table.set_header(vec!["Weekday", "Average", ""]);
        for b in &days {
            table.add_row(vec![
                Cell::new(weekday_name(b.key)),
                Cell::new(money(b.mean)).set_alignment(CellAlignment::Right),
                Cell::new(bar(b.mean, max, BAR_WIDTH).blue()),
            ]);
        }
        Ok(Some(table))
    });

    section("Transactions by Hour", || {
        let hours = metrics::hourly(&records);
        if hours.is_empty() {
            return Ok(None);
        }
        let max = hours.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        let mut table = Table::new();
        table.set_header(vec!["Hour", "Transactions", ""]);
        for b in &hours {
            table.add_row(vec![
                Cell::new(format!("{:02}h", b.key)),
                Cell::new(count(b.count)).set_alignment(CellAlignment::Right),
                Cell::new(bar(b.count as f64, max, BAR_WIDTH).cyan()),
            ]);
        }
        Ok(Some(table))
    });

    let dist = metrics::distribution(&records, HISTOGRAM_BINS);

    section("Amount Quartiles", || {
        let Some(d) = &dist else {
            return Ok(None);
        };
        let mut table = Table::new();
        table.set_header(vec!["Min", "Q1", "Median", "Q3", "Max"]);
        table.add_row(vec![
            Cell::new(money(d.min)),
            Cell::new(money(d.q1)),
            Cell::new(money(d.median)),
            Cell::new(money(d.q3)),
            Cell::new(money(d.max)),
        ]);
        Ok(Some(table))
    });

    section("Amount Distribution", || {
        let Some(d) = &dist else {
            return Ok(None);
        };
        let max = d.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        let mut table = Table::new();
        table.set_header(vec!["Range", "Transactions", ""]);
        for b in &d.bins {
            table.add_row(vec![
                Cell::new(format!("{} - {}", money(b.lower), money(b.upper))),
                Cell::new(count(b.count)).set_alignment(CellAlignment::Right),
                Cell::new(bar(b.count as f64, max, BAR_WIDTH).magenta()),
            ]);
        }
        Ok(Some(table))
    });

    Ok(())
}
