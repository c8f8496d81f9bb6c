use thiserror::Error;

#[derive(Error, Debug)]
pub enum BanvicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No {table} file found in {dir}. Add one of: {candidates}")]
    MissingTable {
        table: &'static str,
        dir: String,
        candidates: String,
    },

    #[error("Could not read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Invalid date: {0} (expected DD/MM/YYYY or YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[cfg(feature = "pdf")]
    #[error("Chart unavailable: {0}")]
    Chart(String),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BanvicError>;
