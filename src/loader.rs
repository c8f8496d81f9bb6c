use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{BanvicError, Result};
use crate::models::RawTable;

// ---------------------------------------------------------------------------
// Table discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Transactions,
    Branches,
    Clients,
}

impl TableKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Branches => "branches",
            Self::Clients => "clients",
        }
    }

    /// Filenames tried in order inside the data directory.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Transactions => &["transacoes.csv", "transactions.csv", "transacao.csv"],
            Self::Branches => &["agencias.csv", "agencias_brv.csv", "agencia.csv", "branches.csv"],
            Self::Clients => &["clientes.csv", "cliente.csv", "customers.csv"],
        }
    }
}

pub fn find_file(dir: &Path, kind: TableKind) -> Option<PathBuf> {
    kind.candidates()
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// Reading with delimiter / encoding fallback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, Copy)]
struct ReadAttempt {
    delimiter: u8,
    encoding: Encoding,
}

const ATTEMPTS: &[ReadAttempt] = &[
    ReadAttempt { delimiter: b',', encoding: Encoding::Utf8 },
    ReadAttempt { delimiter: b';', encoding: Encoding::Utf8 },
    ReadAttempt { delimiter: b';', encoding: Encoding::Latin1 },
];

fn decode(bytes: &[u8], encoding: Encoding) -> Option<String> {
    match encoding {
        Encoding::Utf8 => {
            let text = std::str::from_utf8(bytes).ok()?;
            Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
        // Latin-1 maps every byte to the code point of the same value.
        Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn parse_delimited(text: &str, delimiter: u8) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// A comma parse of a semicolon file "succeeds" with one column; treat it as a miss.
fn collapsed(table: &RawTable, delimiter: u8) -> bool {
    delimiter == b',' && table.headers.len() == 1 && table.headers[0].contains(';')
}

pub fn read_table(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path)?;
    let mut reason = String::from("no read attempt succeeded");

    for attempt in ATTEMPTS {
        let delim = attempt.delimiter as char;
        let Some(text) = decode(&bytes, attempt.encoding) else {
            debug!("{}: not valid {:?}", path.display(), attempt.encoding);
            reason = format!("not valid {:?} text", attempt.encoding);
            continue;
        };
        match parse_delimited(&text, attempt.delimiter) {
            Ok(table) if collapsed(&table, attempt.delimiter) => {
                debug!("{}: '{delim}' yields a single column, retrying", path.display());
                reason = format!("'{delim}' produced a single column");
            }
            Ok(table) => {
                debug!(
                    "{}: read {} rows with '{delim}' / {:?}",
                    path.display(),
                    table.rows.len(),
                    attempt.encoding
                );
                return Ok(table);
            }
            Err(e) => {
                debug!("{}: '{delim}' / {:?} failed: {e}", path.display(), attempt.encoding);
                reason = e.to_string();
            }
        }
    }

    Err(BanvicError::Unreadable {
        path: path.display().to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// Loading the three tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub table: RawTable,
}

pub struct LoadedTables {
    pub transactions: SourceTable,
    pub branches: Option<SourceTable>,
    pub clients: Option<SourceTable>,
}

/// Transactions are required; branches and clients degrade to `None`.
pub fn load_tables(dir: &Path) -> Result<LoadedTables> {
    let kind = TableKind::Transactions;
    let path = find_file(dir, kind).ok_or_else(|| BanvicError::MissingTable {
        table: kind.label(),
        dir: dir.display().to_string(),
        candidates: kind.candidates().join(", "),
    })?;
    let table = read_table(&path)?;
    let transactions = SourceTable { path, table };

    Ok(LoadedTables {
        transactions,
        branches: load_optional(dir, TableKind::Branches),
        clients: load_optional(dir, TableKind::Clients),
    })
}

fn load_optional(dir: &Path, kind: TableKind) -> Option<SourceTable> {
    let Some(path) = find_file(dir, kind) else {
        debug!("no {} table in {}", kind.label(), dir.display());
        return None;
    };
    match read_table(&path) {
        Ok(table) => Some(SourceTable { path, table }),
        Err(e) => {
            warn!("ignoring {} table: {e}", kind.label());
            None
        }
    }
}
