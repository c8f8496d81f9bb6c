use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use regex::Regex;

use crate::models::{RawTable, ReferenceTable, TransactionRecord};

// ---------------------------------------------------------------------------
// Column roles and keyword rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Date,
    Amount,
    BranchId,
    ClientId,
    Status,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Date,
        Role::Amount,
        Role::BranchId,
        Role::ClientId,
        Role::Status,
    ];

    /// Keywords in priority order; matched as lower-case substrings of header names.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["data", "date", "dt", "timestamp", "created"],
            Self::Amount => &["valor", "amount", "vlr", "montante", "price"],
            Self::BranchId => &["agencia", "branch", "agency", "branch_id"],
            Self::ClientId => &["cliente", "client", "customer", "cust_id"],
            Self::Status => &["status", "situacao", "resultado", "aprov"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::BranchId => "branch id",
            Self::ClientId => "client id",
            Self::Status => "status",
        }
    }
}

pub const BRANCH_ID_KEYWORDS: &[&str] = &["id", "agencia", "branch", "branch_id"];
pub const BRANCH_NAME_KEYWORDS: &[&str] = &["nome", "name", "descricao", "city", "cidade"];
pub const CLIENT_ID_KEYWORDS: &[&str] = &["id", "cliente", "customer"];
pub const CLIENT_NAME_KEYWORDS: &[&str] = &["nome", "name", "razao", "cliente"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMatch {
    Keyword { column: String, keyword: &'static str },
    /// Nothing matched; the first column stands in. Known to be wrong at times.
    Fallback(String),
}

impl ColumnMatch {
    pub fn column(&self) -> &str {
        match self {
            Self::Keyword { column, .. } => column,
            Self::Fallback(column) => column,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Keyword-major scan: the first keyword that hits any header wins.
pub fn guess_column(headers: &[String], keywords: &[&'static str]) -> Option<ColumnMatch> {
    for kw in keywords {
        if let Some(h) = headers.iter().find(|h| h.to_lowercase().contains(kw)) {
            return Some(ColumnMatch::Keyword {
                column: h.clone(),
                keyword: kw,
            });
        }
    }
    headers.first().map(|h| ColumnMatch::Fallback(h.clone()))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMapping {
    pub date: Option<ColumnMatch>,
    pub amount: Option<ColumnMatch>,
    pub branch: Option<ColumnMatch>,
    pub client: Option<ColumnMatch>,
    pub status: Option<ColumnMatch>,
}

impl ColumnMapping {
    pub fn guess(headers: &[String]) -> Self {
        let mapping = Self {
            date: guess_column(headers, Role::Date.keywords()),
            amount: guess_column(headers, Role::Amount.keywords()),
            branch: guess_column(headers, Role::BranchId.keywords()),
            client: guess_column(headers, Role::ClientId.keywords()),
            status: guess_column(headers, Role::Status.keywords()),
        };
        for role in Role::ALL {
            debug!("column for {}: {:?}", role.label(), mapping.get(role));
        }
        mapping
    }

    pub fn get(&self, role: Role) -> Option<&ColumnMatch> {
        match role {
            Role::Date => self.date.as_ref(),
            Role::Amount => self.amount.as_ref(),
            Role::BranchId => self.branch.as_ref(),
            Role::ClientId => self.client.as_ref(),
            Role::Status => self.status.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// %y before %Y: "%d/%m/%y" rejects four-digit years, "%d/%m/%Y" accepts two.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

// Zone names some exports append after the time; the clock value is kept as is.
const ZONE_SUFFIXES: &[&str] = &[" UTC", " GMT", " Z"];

/// Day-first date parsing: `03/04/2024` is the 3rd of April.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    let s = ZONE_SUFFIXES
        .iter()
        .find_map(|zone| s.strip_suffix(zone))
        .map_or(s, str::trim_end);
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z")
        .ok()
        .map(|dt| dt.naive_local())
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s
        .strip_prefix("R$")
        .or_else(|| s.strip_prefix('$'))
        .unwrap_or(s)
        .trim();
    if s.is_empty() {
        return None;
    }
    let decimal_comma;
    let s = if s.contains(',') && !s.contains('.') {
        decimal_comma = s.replace(',', ".");
        decimal_comma.as_str()
    } else {
        s
    };
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trims an id cell and drops the `.0` left behind by float-typed exports.
pub fn normalize_id(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    let s = s
        .strip_suffix(".0")
        .filter(|head| !head.is_empty() && head.chars().all(|c| c.is_ascii_digit() || c == '-'))
        .unwrap_or(s);
    Some(s.to_string())
}

const APPROVAL_PATTERN: &str = "aprova|aprov|ok|sucess|conclu";

pub fn is_approved(raw: &str) -> bool {
    static APPROVAL: OnceLock<Option<Regex>> = OnceLock::new();
    let lower = raw.to_lowercase();
    APPROVAL
        .get_or_init(|| Regex::new(APPROVAL_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(&lower))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Table normalization
// ---------------------------------------------------------------------------

/// One record per raw row. Unmapped or unparseable cells become `None`; a
/// missing status column leaves every record approved.
pub fn normalize(table: &RawTable, mapping: &ColumnMapping) -> Vec<TransactionRecord> {
    let index = |m: Option<&ColumnMatch>| m.and_then(|m| table.column_index(m.column()));
    let date_idx = index(mapping.date.as_ref());
    let amount_idx = index(mapping.amount.as_ref());
    let branch_idx = index(mapping.branch.as_ref());
    let client_idx = index(mapping.client.as_ref());
    let status_idx = index(mapping.status.as_ref().filter(|m| !m.is_fallback()));

    (0..table.rows.len())
        .map(|row| TransactionRecord {
            timestamp: date_idx.and_then(|c| parse_date_dayfirst(table.cell(row, c))),
            amount: amount_idx.and_then(|c| parse_amount(table.cell(row, c))),
            branch_ref: branch_idx.and_then(|c| normalize_id(table.cell(row, c))),
            client_ref: client_idx.and_then(|c| normalize_id(table.cell(row, c))),
            approved: status_idx.map_or(true, |c| is_approved(table.cell(row, c))),
        })
        .collect()
}

/// Builds an id → name lookup from a branches or clients table.
pub fn reference_table(
    table: &RawTable,
    id_keywords: &[&'static str],
    name_keywords: &[&'static str],
) -> ReferenceTable {
    let id_col = guess_column(&table.headers, id_keywords)
        .and_then(|m| table.column_index(m.column()));
    let name_col = guess_column(&table.headers, name_keywords)
        .and_then(|m| table.column_index(m.column()));
    let (Some(id_col), Some(name_col)) = (id_col, name_col) else {
        return ReferenceTable::default();
    };

    let mut entries = Vec::new();
    for row in 0..table.rows.len() {
        let Some(id) = normalize_id(table.cell(row, id_col)) else {
            continue;
        };
        let name = table.cell(row, name_col).trim();
        if name.is_empty() {
            continue;
        }
        entries.push((id, name.to_string()));
    }
    ReferenceTable { entries }
}
