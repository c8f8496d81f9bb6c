use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::cli::{Context, FilterArgs};
use crate::error::Result;
use crate::metrics::{self, entity_label};
use crate::pdf::{render_report, ReportData};

const REPORT_TOP: usize = 10;
const STAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

fn stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// `report-<start>_<end>.pdf` under `<data_dir>/exports`, dates as dd-mm-yyyy.
fn default_path(ctx: &Context) -> PathBuf {
    let bounds = match &ctx.selection.dates {
        Some(range) => Some((range.start, range.end)),
        None => ctx.dataset.date_bounds().map(|(lo, hi)| (lo.date(), hi.date())),
    };
    let name = match bounds {
        Some((start, end)) => format!(
            "report-{}_{}.pdf",
            start.format("%d-%m-%Y"),
            end.format("%d-%m-%Y")
        ),
        None => "report-all.pdf".to_string(),
    };
    ctx.data_dir.join("exports").join(name)
}

fn write_pdf(bytes: &[u8], path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    let display = format!("{}", path.display());
    println!("Wrote {display}");
    Ok(display)
}

/// Renders the filtered view to PDF. Returns the written path.
pub fn run(args: &FilterArgs, output: Option<String>) -> Result<String> {
    let ctx = Context::load(args)?;
    let records = ctx.dataset.filter(&ctx.selection);
    let months = ctx.settings.trailing_months;

    let kpis = metrics::kpis(&records);
    let monthly = metrics::monthly(&records);
    let branches = ctx.dataset.branches.as_ref();
    let ranking = metrics::rank_recent(&records, months, |r| {
        entity_label(r.branch_ref.as_deref(), branches)
    });

    let data = ReportData {
        period: ctx.period_label(),
        branch: ctx.selection.branch.label("All"),
        client: ctx.selection.client.label("All"),
        generated_at: stamp(Local::now().naive_local()),
        kpis: &kpis,
        monthly: &monthly,
        top_branches: ranking.head(REPORT_TOP),
        trailing_months: months,
    };
    let bytes = render_report(&data)?;

    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(&ctx));
    write_pdf(&bytes, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_stamp_includes_seconds() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 3)
            .unwrap();
        assert_eq!(stamp(at), "05/03/2024 09:07:03");
    }
}
