use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::fmt::{count, date_br};
use crate::models::ReferenceTable;
use crate::normalize::Role;
use crate::settings::{load_settings, resolve_data_dir};

fn source(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

pub fn run(data_dir: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let dir = resolve_data_dir(&settings, data_dir);
    let ds = Dataset::load(&dir)?;

    println!("Data dir:      {}", dir.display());
    println!("Transactions:  {}", source(&ds.sources.transactions));
    println!("Branches:      {}", source(&ds.sources.branches));
    println!("Clients:       {}", source(&ds.sources.clients));

    println!();
    println!("Rows:          {}", count(ds.records.len()));
    println!("Headers:       {}", list(&ds.headers));
    println!(
        "Branch names:  {}",
        count(ds.branches.as_ref().map_or(0, ReferenceTable::len))
    );
    println!(
        "Client names:  {}",
        count(ds.clients.as_ref().map_or(0, ReferenceTable::len))
    );
    match ds.date_bounds() {
        Some((lo, hi)) => println!("Dates:         {} to {}", date_br(lo.date()), date_br(hi.date())),
        None => println!("Dates:         {}", "no parseable dates".yellow()),
    }
    let undated = ds.records.iter().filter(|r| r.timestamp.is_none()).count();
    let no_amount = ds.records.iter().filter(|r| r.amount.is_none()).count();
    if undated > 0 || no_amount > 0 {
        println!(
            "{}",
            format!("Unparsed:      {undated} dates, {no_amount} amounts").yellow()
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Role", "Column", "Match"]);
    for role in Role::ALL {
        let (column, how) = match ds.mapping.get(role) {
            Some(m) if m.is_fallback() => (m.column().to_string(), "fallback (first column)".yellow()),
            Some(m) => (m.column().to_string(), "keyword".green()),
            None => ("-".to_string(), "none".red()),
        };
        table.add_row(vec![Cell::new(role.label()), Cell::new(column), Cell::new(how)]);
    }
    println!("\n{}\n{table}", "Column Mapping".bold());

    println!("\n{}", "Filter Options".bold());
    println!("Branches:  {}", list(&ds.branch_options()));
    println!("Clients:   {}", list(&ds.client_options()));
    Ok(())
}
