use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Months, NaiveDateTime, Timelike, Weekday};

use crate::models::{ReferenceTable, TransactionRecord};

pub const UNKNOWN_LABEL: &str = "(unknown)";

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub count: usize,
    pub total: f64,
    /// Total divided by every record, null amounts included.
    pub mean: f64,
    /// Percent approved; `None` for an empty set.
    pub approval_rate: Option<f64>,
}

pub fn kpis(records: &[&TransactionRecord]) -> Kpis {
    let count = records.len();
    let total: f64 = records.iter().filter_map(|r| r.amount).sum();
    let approved = records.iter().filter(|r| r.approved).count();
    Kpis {
        count,
        total,
        mean: if count > 0 { total / count as f64 } else { 0.0 },
        approval_rate: (count > 0).then(|| approved as f64 / count as f64 * 100.0),
    }
}

// ---------------------------------------------------------------------------
// Time buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<K> {
    pub key: K,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    count: usize,
    total: f64,
}

impl Acc {
    fn add(&mut self, record: &TransactionRecord) {
        self.count += 1;
        self.total += record.amount.unwrap_or(0.0);
    }

    fn finish<K>(self, key: K) -> Bucket<K> {
        Bucket {
            key,
            count: self.count,
            total: self.total,
            mean: if self.count > 0 { self.total / self.count as f64 } else { 0.0 },
        }
    }
}

fn bucket_by<K, F>(records: &[&TransactionRecord], key_of: F) -> Vec<Bucket<K>>
where
    K: Ord,
    F: Fn(&NaiveDateTime) -> K,
{
    let mut groups: BTreeMap<K, Acc> = BTreeMap::new();
    for r in records {
        if let Some(ts) = &r.timestamp {
            groups.entry(key_of(ts)).or_default().add(r);
        }
    }
    groups.into_iter().map(|(k, acc)| acc.finish(k)).collect()
}

/// Calendar-month buckets, oldest first. Undated records are skipped.
pub fn monthly(records: &[&TransactionRecord]) -> Vec<Bucket<YearMonth>> {
    bucket_by(records, YearMonth::of)
}

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Buckets for the weekdays that occur, Monday first.
pub fn weekday(records: &[&TransactionRecord]) -> Vec<Bucket<Weekday>> {
    bucket_by(records, |ts| ts.weekday().num_days_from_monday())
        .into_iter()
        .map(|b| Bucket {
            key: WEEK[b.key as usize],
            count: b.count,
            total: b.total,
            mean: b.mean,
        })
        .collect()
}

/// Hour-of-day buckets; empty unless the timestamps carry more than one hour.
pub fn hourly(records: &[&TransactionRecord]) -> Vec<Bucket<u32>> {
    let buckets = bucket_by(records, |ts| ts.hour());
    if buckets.len() > 1 {
        buckets
    } else {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Count,
    Volume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankRow {
    pub label: String,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub rows: Vec<RankRow>,
    /// Start of the trailing window the ranking was computed over, if any.
    pub window_start: Option<NaiveDateTime>,
}

impl Ranking {
    pub fn head(&self, n: usize) -> &[RankRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn leader(&self) -> Option<&RankRow> {
        self.rows.first()
    }

    pub fn laggard(&self) -> Option<&RankRow> {
        self.rows.last()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reference display name, else the raw id, else a placeholder.
pub fn entity_label(id: Option<&str>, reference: Option<&ReferenceTable>) -> String {
    match id {
        Some(id) => reference
            .and_then(|r| r.label_for(id))
            .unwrap_or(id)
            .to_string(),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// Records no older than `months` calendar months before the latest timestamp.
pub fn trailing_window<'a>(
    records: &[&'a TransactionRecord],
    months: u32,
) -> (Option<NaiveDateTime>, Vec<&'a TransactionRecord>) {
    let Some(latest) = records.iter().filter_map(|r| r.timestamp).max() else {
        return (None, Vec::new());
    };
    let start = latest
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MIN);
    let window = records
        .iter()
        .copied()
        .filter(|r| r.timestamp.is_some_and(|ts| ts >= start))
        .collect();
    (Some(start), window)
}

/// Groups by label, then sorts descending. The sort is stable, so ties stay
/// in order of first appearance.
pub fn rank<F>(records: &[&TransactionRecord], label_of: F, order: RankOrder) -> Ranking
where
    F: Fn(&TransactionRecord) -> String,
{
    let mut labels: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for r in records {
        let label = label_of(r);
        let acc = groups.entry(label.clone()).or_insert_with(|| {
            labels.push(label);
            Acc::default()
        });
        acc.add(r);
    }

    let mut rows: Vec<RankRow> = labels
        .into_iter()
        .filter_map(|label| {
            let acc = *groups.get(&label)?;
            let b = acc.finish(label);
            Some(RankRow {
                label: b.key,
                count: b.count,
                total: b.total,
                mean: b.mean,
            })
        })
        .collect();
    match order {
        RankOrder::Count => rows.sort_by(|a, b| b.count.cmp(&a.count)),
        RankOrder::Volume => rows.sort_by(|a, b| b.total.total_cmp(&a.total)),
    }
    Ranking {
        rows,
        window_start: None,
    }
}

/// Count ranking over the trailing window.
pub fn rank_recent<F>(records: &[&TransactionRecord], months: u32, label_of: F) -> Ranking
where
    F: Fn(&TransactionRecord) -> String,
{
    let (start, window) = trailing_window(records, months);
    Ranking {
        window_start: start,
        ..rank(&window, label_of, RankOrder::Count)
    }
}

// ---------------------------------------------------------------------------
// Even vs odd months
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EvenOddTest {
    pub even_months: usize,
    pub odd_months: usize,
    pub mean_even: Option<f64>,
    pub mean_odd: Option<f64>,
    pub t: Option<f64>,
    pub p: Option<f64>,
}

impl EvenOddTest {
    pub fn significant(&self) -> bool {
        self.p.is_some_and(|p| p < 0.05)
    }
}

fn mean(xs: &[f64]) -> Option<f64> {
    (!xs.is_empty()).then(|| xs.iter().sum::<f64>() / xs.len() as f64)
}

fn sample_variance(xs: &[f64], m: f64) -> f64 {
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() as f64 - 1.0)
}

// Abramowitz & Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Compares monthly volume of even vs odd calendar months with a Welch t
/// statistic and a normal-approximation two-sided p value.
pub fn even_odd_months(records: &[&TransactionRecord]) -> EvenOddTest {
    let (even, odd): (Vec<_>, Vec<_>) = monthly(records)
        .into_iter()
        .partition(|b| b.key.month % 2 == 0);
    let even: Vec<f64> = even.iter().map(|b| b.total).collect();
    let odd: Vec<f64> = odd.iter().map(|b| b.total).collect();

    let (mean_even, mean_odd) = (mean(&even), mean(&odd));
    let mut t = None;
    let mut p = None;
    if let (Some(mx), Some(my)) = (mean_even, mean_odd) {
        if even.len() >= 2 && odd.len() >= 2 {
            let se = (sample_variance(&even, mx) / even.len() as f64
                + sample_variance(&odd, my) / odd.len() as f64)
                .sqrt();
            if se > 0.0 {
                let stat = (mx - my) / se;
                let z = stat.abs();
                t = Some(stat);
                p = Some(2.0 * (1.0 - 0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))));
            }
        }
    }
    EvenOddTest {
        even_months: even.len(),
        odd_months: odd.len(),
        mean_even,
        mean_odd,
        t,
        p,
    }
}

// ---------------------------------------------------------------------------
// Amount distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub bins: Vec<HistogramBin>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear-interpolated quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Equal-width histogram and five-number summary of the non-null amounts.
pub fn distribution(records: &[&TransactionRecord], bins: usize) -> Option<Distribution> {
    let mut values: Vec<f64> = records.iter().filter_map(|r| r.amount).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let min = values[0];
    let max = values[values.len() - 1];

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let mut hist: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in &values {
        let idx = if width > 0.0 {
            (((v - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        hist[idx].count += 1;
    }

    Some(Distribution {
        bins: hist,
        min,
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max,
    })
}
