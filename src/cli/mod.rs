pub mod branches;
pub mod clients;
#[cfg(feature = "pdf")]
pub mod export;
pub mod inspect;
pub mod use_dir;
pub mod summary;
pub mod trends;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use comfy_table::Table;

use crate::dataset::Dataset;
use crate::error::{BanvicError, Result};
use crate::fmt::{date_br, parse_cli_date};
use crate::models::{DateRange, FilterSelection, Selection};
use crate::settings::{load_settings, resolve_data_dir, Settings};

#[derive(Parser)]
#[command(
    name = "banvic",
    about = "Banking transaction analytics: KPIs, rankings and PDF reports from CSV exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// KPIs, monthly volume, weekday seasonality and top branches.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Branch ranking over the trailing window.
    Branches {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Client ranking by volume.
    Clients {
        #[command(flatten)]
        filters: FilterArgs,
        /// Also write the ranking to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Even vs odd months, weekday and hourly patterns, amount distribution.
    Trends {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show discovered files, the guessed column mapping and filter options.
    Inspect {
        /// Directory containing the CSV files (default: from settings)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Remember a data directory for later runs.
    Use {
        /// Directory containing transacoes.csv (or transactions.csv)
        path: String,
    },
    /// Export the filtered view as a PDF report.
    #[cfg(feature = "pdf")]
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date: DD/MM/YYYY or YYYY-MM-DD
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date (inclusive): DD/MM/YYYY or YYYY-MM-DD
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Branch display name (or raw id when no branch table exists)
    #[arg(long)]
    pub branch: Option<String>,
    /// Client display name (or raw id when no client table exists)
    #[arg(long)]
    pub client: Option<String>,
    /// Directory containing the CSV files (default: from settings)
    #[arg(long = "data-dir")]
    pub data_dir: Option<String>,
}

/// Loaded state shared by every reporting command.
pub(crate) struct Context {
    pub data_dir: PathBuf,
    pub settings: Settings,
    pub dataset: Dataset,
    pub selection: FilterSelection,
}

impl Context {
    pub fn load(args: &FilterArgs) -> Result<Self> {
        let settings = load_settings();
        let dir = resolve_data_dir(&settings, args.data_dir.as_deref());
        let dataset = Dataset::load(&dir)?;
        let selection = selection_from_args(args, &dataset)?;
        Ok(Self {
            data_dir: dir,
            settings,
            dataset,
            selection,
        })
    }

    pub fn period_label(&self) -> String {
        match &self.selection.dates {
            Some(range) => format!("{} to {}", date_br(range.start), date_br(range.end)),
            None => "All dates".to_string(),
        }
    }
}

/// A missing bound defaults to the dataset's first/last date.
pub(crate) fn selection_from_args(args: &FilterArgs, dataset: &Dataset) -> Result<FilterSelection> {
    let from = args.from_date.as_deref().map(parse_cli_date).transpose()?;
    let to = args.to_date.as_deref().map(parse_cli_date).transpose()?;
    let bounds = dataset.date_bounds().map(|(lo, hi)| (lo.date(), hi.date()));

    let dates = match (from, to) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        (Some(start), None) => Some(DateRange {
            start,
            end: bounds.map_or(start, |(_, hi)| hi),
        }),
        (None, Some(end)) => Some(DateRange {
            start: bounds.map_or(end, |(lo, _)| lo),
            end,
        }),
    };
    if let Some(range) = &dates {
        if range.start > range.end {
            return Err(BanvicError::Other(format!(
                "--from ({}) is after --to ({})",
                date_br(range.start),
                date_br(range.end)
            )));
        }
    }

    Ok(FilterSelection {
        dates,
        branch: Selection::from_arg(args.branch.as_deref()),
        client: Selection::from_arg(args.client.as_deref()),
    })
}

/// Prints one report section. Sections fail independently: an error is shown
/// inline and the caller moves on to the next one.
pub(crate) fn section<F>(title: &str, build: F)
where
    F: FnOnce() -> Result<Option<Table>>,
{
    match build() {
        Ok(Some(table)) => println!("\n{}\n{table}", title.bold()),
        Ok(None) => println!(
            "\n{}\n{}",
            title.bold(),
            "No data in the selected period.".yellow()
        ),
        Err(e) => println!("\n{}\n{}", title.bold(), format!("Error: {e}").red()),
    }
}

pub(crate) fn print_filters(ctx: &Context) {
    println!("Period:  {}", ctx.period_label());
    println!("Branch:  {}", ctx.selection.branch.label("All"));
    println!("Client:  {}", ctx.selection.client.label("All"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_flags_means_no_filter() {
        let sel = selection_from_args(&FilterArgs::default(), &sample()).unwrap();
        assert_eq!(sel, FilterSelection::everything());
    }

    #[test]
    fn test_single_bound_defaults_to_dataset_bounds() {
        let args = FilterArgs {
            from_date: Some("01/03/2024".into()),
            ..Default::default()
        };
        let sel = selection_from_args(&args, &sample()).unwrap();
        assert_eq!(sel.dates, Some(DateRange { start: ymd(2024, 3, 1), end: ymd(2024, 3, 11) }));

        let args = FilterArgs {
            to_date: Some("2024-02-29".into()),
            ..Default::default()
        };
        let sel = selection_from_args(&args, &sample()).unwrap();
        assert_eq!(sel.dates, Some(DateRange { start: ymd(2024, 2, 1), end: ymd(2024, 2, 29) }));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let args = FilterArgs {
            from_date: Some("10/03/2024".into()),
            to_date: Some("01/03/2024".into()),
            ..Default::default()
        };
        assert!(selection_from_args(&args, &sample()).is_err());
    }

    #[test]
    fn test_branch_and_client_flags() {
        let args = FilterArgs {
            branch: Some("Centro".into()),
            client: Some("All".into()),
            ..Default::default()
        };
        let sel = selection_from_args(&args, &sample()).unwrap();
        assert_eq!(sel.branch, Selection::Named("Centro".into()));
        assert_eq!(sel.client, Selection::Named("All".into()));

        let args = FilterArgs {
            client: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(selection_from_args(&args, &sample()).unwrap().client, Selection::All);
    }
}
