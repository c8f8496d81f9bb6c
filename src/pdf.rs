use std::io::BufWriter;

use printpdf::*;

use crate::error::{BanvicError, Result};
use crate::fmt::{count, money, percent};
use crate::metrics::{Bucket, Kpis, RankRow, YearMonth};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 25.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 20.0;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const CHART_H: f32 = 90.0;
const FOOTER: &str = "Report generated automatically - BanVic Analytics";

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| BanvicError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| BanvicError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        self.footer();
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        self.text_at(s, x, self.pdf_y(), size, bold);
    }

    /// Text at absolute PDF coordinates (origin bottom-left).
    fn text_at(&self, s: &str, x: f32, y: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer().use_text(s, size, Mm(x), Mm(y), font);
    }

    fn polyline(&self, points: &[(f32, f32)], thickness: f32) {
        let layer = self.layer();
        layer.set_outline_thickness(thickness);
        let line = Line {
            points: points
                .iter()
                .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let y = self.pdf_y();
        self.polyline(&[(x1, y), (x2, y)], 0.5);
    }

    fn footer(&self) {
        self.text_at(FOOTER, MARGIN_LEFT, MARGIN_BOTTOM / 2.0, 8.0, false);
    }

    fn heading(&mut self, label: &str) {
        self.ensure_space(ROW_H * 3.0);
        self.text(label, MARGIN_LEFT, HEADING_SIZE, true);
        self.y += 10.0;
    }

    fn line_item(&mut self, label: &str) {
        self.ensure_space(ROW_H);
        self.text(label, MARGIN_LEFT, FONT_SIZE, false);
        self.y += ROW_H;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        self.row(cols, headers, true);
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str]) {
        self.ensure_space(ROW_H);
        self.row(cols, values, false);
    }

    fn row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            match col.align {
                Align::Left => self.text(value, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(value, FONT_SIZE);
                    self.text(value, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    /// Line chart of monthly totals with point markers and min/max labels.
    fn monthly_chart(&mut self, monthly: &[Bucket<YearMonth>]) -> Result<()> {
        if monthly.is_empty() {
            return Err(BanvicError::Chart("no dated transactions in the period".into()));
        }
        self.ensure_space(CHART_H + 15.0);
        let max = monthly.iter().map(|b| b.total).fold(0.0_f64, f64::max);
        let min = monthly.iter().map(|b| b.total).fold(0.0_f64, f64::min);
        let span = if max - min > 0.0 { max - min } else { 1.0 };

        let left = MARGIN_LEFT + 25.0;
        let right = PAGE_W - MARGIN_RIGHT;
        let top = self.pdf_y();
        let bottom = top - CHART_H;

        // Axes
        self.polyline(&[(left, top), (left, bottom), (right, bottom)], 0.5);
        self.text_at(&money(max), MARGIN_LEFT, top - 2.0, 7.0, false);
        self.text_at(&money(min), MARGIN_LEFT, bottom, 7.0, false);

        let step = if monthly.len() > 1 {
            (right - left - 10.0) / (monthly.len() - 1) as f32
        } else {
            0.0
        };
        let points: Vec<(f32, f32)> = monthly
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let x = left + 5.0 + step * i as f32;
                let y = bottom + ((b.total - min) / span) as f32 * (CHART_H - 5.0);
                (x, y)
            })
            .collect();

        self.layer()
            .set_outline_color(Color::Rgb(Rgb::new(0.12, 0.47, 0.71, None)));
        if points.len() > 1 {
            self.polyline(&points, 1.2);
        }
        for &(x, y) in &points {
            self.polyline(&[(x - 1.0, y - 1.0), (x + 1.0, y + 1.0)], 0.8);
            self.polyline(&[(x - 1.0, y + 1.0), (x + 1.0, y - 1.0)], 0.8);
        }
        self.layer()
            .set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

        // Label at most ~12 months so the axis stays legible.
        let every = monthly.len().div_ceil(12).max(1);
        for (i, (b, &(x, _))) in monthly.iter().zip(&points).enumerate() {
            if i % every == 0 {
                let label = b.key.to_string();
                let tw = approx_text_width(&label, 7.0);
                self.text_at(&label, x - tw / 2.0, bottom - 5.0, 7.0, false);
            }
        }

        self.y += CHART_H + 10.0;
        Ok(())
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        self.footer();
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| BanvicError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| BanvicError::Pdf(e.to_string()))
    }
}

/// Everything the report shows, already filtered and aggregated.
pub struct ReportData<'a> {
    pub period: String,
    pub branch: String,
    pub client: String,
    pub generated_at: String,
    pub kpis: &'a Kpis,
    pub monthly: &'a [Bucket<YearMonth>],
    pub top_branches: &'a [RankRow],
    pub trailing_months: u32,
}

pub fn render_report(data: &ReportData<'_>) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("BanVic Analytics Report")?;

    // Cover
    pdf.text("BanVic - Analytics Report", MARGIN_LEFT, TITLE_SIZE, true);
    pdf.y += 12.0;
    pdf.line_item(&format!("Period: {}", data.period));
    pdf.line_item(&format!("Branch filter: {}", data.branch));
    pdf.line_item(&format!("Client filter: {}", data.client));
    pdf.line_item(&format!("Generated at: {}", data.generated_at));
    pdf.y += 2.0;
    pdf.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
    pdf.new_page();

    // KPIs
    pdf.heading("KPIs");
    let cols = &[
        Col { width: 110.0, align: Align::Left },
        Col { width: 60.0, align: Align::Right },
    ];
    pdf.table_header(cols, &["Indicator", "Value"]);
    let rows = [
        ("Total transactions", count(data.kpis.count)),
        ("Total volume", money(data.kpis.total)),
        ("Average ticket", money(data.kpis.mean)),
        ("Approval rate", percent(data.kpis.approval_rate)),
    ];
    for &(label, ref value) in &rows {
        pdf.table_row(cols, &[label, value.as_str()]);
    }
    pdf.new_page();

    // Monthly volume; a failed chart leaves a message and the report goes on.
    pdf.heading("Monthly Volume");
    if let Err(e) = pdf.monthly_chart(data.monthly) {
        pdf.line_item(&format!("Could not draw chart: {e}"));
    }

    // Top branches
    pdf.heading(&format!(
        "Top {} Branches (last {} months)",
        data.top_branches.len(),
        data.trailing_months
    ));
    if data.top_branches.is_empty() {
        pdf.line_item("No transactions in the ranking window.");
    } else {
        let cols = &[
            Col { width: 10.0, align: Align::Left },
            Col { width: 90.0, align: Align::Left },
            Col { width: 30.0, align: Align::Right },
            Col { width: 40.0, align: Align::Right },
        ];
        pdf.table_header(cols, &["#", "Branch", "Transactions", "Volume"]);
        for (i, row) in data.top_branches.iter().enumerate() {
            let pos = (i + 1).to_string();
            let n = count(row.count);
            let vol = money(row.total);
            pdf.table_row(cols, &[&pos, &row.label, &n, &vol]);
        }
    }

    pdf.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample;
    use crate::metrics::{entity_label, kpis, monthly, rank_recent};
    use crate::models::FilterSelection;

    fn render(records_empty: bool) -> Vec<u8> {
        let ds = sample();
        let records = if records_empty {
            Vec::new()
        } else {
            ds.filter(&FilterSelection::everything())
        };
        let k = kpis(&records);
        let m = monthly(&records);
        let ranking = rank_recent(&records, 6, |r| {
            entity_label(r.branch_ref.as_deref(), ds.branches.as_ref())
        });
        let data = ReportData {
            period: "01/02/2024 to 11/03/2024".into(),
            branch: "All".into(),
            client: "All".into(),
            generated_at: "19/10/2026 10:00:00".into(),
            kpis: &k,
            monthly: &m,
            top_branches: ranking.head(10),
            trailing_months: 6,
        };
        render_report(&data).unwrap()
    }

    #[test]
    fn test_render_report_produces_pdf() {
        assert!(render(false).starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_report_survives_empty_data() {
        assert!(render(true).starts_with(b"%PDF"));
    }

    #[test]
    fn test_chart_without_data_is_an_error() {
        let mut pdf = PdfWriter::new("t").unwrap();
        let err = pdf.monthly_chart(&[]).unwrap_err();
        assert!(matches!(err, BanvicError::Chart(_)));
    }
}
