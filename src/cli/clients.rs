use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use crate::cli::{print_filters, section, Context, FilterArgs};
use crate::error::Result;
use crate::fmt::{bar, count, money};
use crate::metrics::{self, entity_label, RankOrder, RankRow};

const CHART_TOP: usize = 20;
const TABLE_TOP: usize = 100;
const BAR_WIDTH: usize = 30;

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: usize,
    client: &'a str,
    transactions: usize,
    volume: f64,
    average: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn write_csv(path: &Path, rows: &[RankRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for (i, row) in rows.iter().enumerate() {
        wtr.serialize(CsvRow {
            rank: i + 1,
            client: &row.label,
            transactions: row.count,
            volume: round2(row.total),
            average: round2(row.mean),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(args: &FilterArgs, csv_path: Option<&str>) -> Result<()> {
    let ctx = Context::load(args)?;
    let records = ctx.dataset.filter(&ctx.selection);
    let clients = ctx.dataset.clients.as_ref();
    let ranking = metrics::rank(
        &records,
        |r| entity_label(r.client_ref.as_deref(), clients),
        RankOrder::Volume,
    );

    println!("{}", "Client Ranking".bold());
    print_filters(&ctx);

    if let Some(best) = ranking.leader() {
        let volume: f64 = ranking.rows.iter().map(|r| r.total).sum();
        println!();
        println!("Clients:       {}", count(ranking.rows.len()));
        println!("Top client:    {} ({})", best.label, money(best.total));
        println!("Total volume:  {}", money(volume));
    }

    section(&format!("Top {CHART_TOP} by Volume"), || {
        if ranking.is_empty() {
            return Ok(None);
        }
        let rows = ranking.head(CHART_TOP);
        let max = rows.first().map_or(0.0, |r| r.total);
        let mut table = Table::new();
        table.set_header(vec!["Client", "Volume", ""]);
        for row in rows {
            table.add_row(vec![
                Cell::new(&row.label),
                Cell::new(money(row.total)).set_alignment(CellAlignment::Right),
                Cell::new(bar(row.total, max, BAR_WIDTH).green()),
            ]);
        }
        Ok(Some(table))
    });

    section("Ranking", || {
        if ranking.is_empty() {
            return Ok(None);
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "Client", "Transactions", "Volume", "Average"]);
        for (i, row) in ranking.head(TABLE_TOP).iter().enumerate() {
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

    if let Some(path) = csv_path {
        write_csv(Path::new(path), &ranking.rows)?;
        println!("\nWrote {path}");
    }
    Ok(())
}
