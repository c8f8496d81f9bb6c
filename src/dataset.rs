use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::info;

use crate::error::Result;
use crate::filter;
use crate::loader::{load_tables, LoadedTables};
use crate::models::{FilterSelection, RawTable, ReferenceTable, TransactionRecord};
use crate::normalize::{
    normalize, reference_table, ColumnMapping, BRANCH_ID_KEYWORDS, BRANCH_NAME_KEYWORDS,
    CLIENT_ID_KEYWORDS, CLIENT_NAME_KEYWORDS,
};

#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub transactions: Option<PathBuf>,
    pub branches: Option<PathBuf>,
    pub clients: Option<PathBuf>,
}

/// Everything loaded at startup. Read-only once built; every command filters
/// and aggregates against a shared reference to it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub records: Vec<TransactionRecord>,
    pub branches: Option<ReferenceTable>,
    pub clients: Option<ReferenceTable>,
    pub sources: Sources,
}

impl Dataset {
    pub fn load(dir: &Path) -> Result<Self> {
        let LoadedTables {
            transactions,
            branches,
            clients,
        } = load_tables(dir)?;
        let mut dataset = Self::from_tables(
            &transactions.table,
            branches.as_ref().map(|s| &s.table),
            clients.as_ref().map(|s| &s.table),
        );
        dataset.sources = Sources {
            transactions: Some(transactions.path),
            branches: branches.map(|s| s.path),
            clients: clients.map(|s| s.path),
        };
        info!(
            "loaded {} transactions ({} branches, {} clients)",
            dataset.records.len(),
            dataset.branches.as_ref().map_or(0, ReferenceTable::len),
            dataset.clients.as_ref().map_or(0, ReferenceTable::len),
        );
        Ok(dataset)
    }

    pub fn from_tables(
        transactions: &RawTable,
        branches: Option<&RawTable>,
        clients: Option<&RawTable>,
    ) -> Self {
        let mapping = ColumnMapping::guess(&transactions.headers);
        let records = normalize(transactions, &mapping);
        Self {
            headers: transactions.headers.clone(),
            mapping,
            records,
            branches: branches.map(|t| reference_table(t, BRANCH_ID_KEYWORDS, BRANCH_NAME_KEYWORDS)),
            clients: clients.map(|t| reference_table(t, CLIENT_ID_KEYWORDS, CLIENT_NAME_KEYWORDS)),
            sources: Sources::default(),
        }
    }

    pub fn filter(&self, selection: &FilterSelection) -> Vec<&TransactionRecord> {
        filter::apply(
            &self.records,
            selection,
            self.branches.as_ref(),
            self.clients.as_ref(),
        )
    }

    /// Earliest and latest parsed timestamps, if any row has one.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut stamps = self.records.iter().filter_map(|r| r.timestamp);
        let first = stamps.next()?;
        Some(stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub fn branch_options(&self) -> Vec<String> {
        filter::options(&self.records, self.branches.as_ref(), |r| r.branch_ref.as_deref())
    }

    pub fn client_options(&self) -> Vec<String> {
        filter::options(&self.records, self.clients.as_ref(), |r| r.client_ref.as_deref())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn raw(names: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: names.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Small dataset with branch and client reference tables.
    pub fn sample() -> Dataset {
        let transactions = raw(
            &["data_transacao", "valor", "agencia_id", "cliente_id", "status"],
            &[
                &["01/02/2024", "100", "7", "1", "Aprovada"],
                &["05/02/2024", "", "7", "2", "Negada"],
                &["10/03/2024 14:00", "50", "8", "1", "OK"],
                &["11/03/2024 09:30", "25", "9", "3", "aprovada"],
                &["garbage", "10", "8", "2", "aprovada"],
            ],
        );
        let branches = raw(
            &["agencia_id", "nome"],
            &[&["7", "Centro"], &["8", "Norte"], &["10", "Centro"]],
        );
        let clients = raw(&["cod_cliente", "nome"], &[&["1", "Ana"], &["2", "Bruno"]]);
        Dataset::from_tables(&transactions, Some(&branches), Some(&clients))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_from_tables_builds_references() {
        let ds = sample();
        assert_eq!(ds.records.len(), 5);
        assert_eq!(ds.branches.as_ref().unwrap().ids_for_name("Centro"), vec!["7", "10"]);
        assert_eq!(ds.clients.as_ref().unwrap().label_for("2"), Some("Bruno"));
    }

    #[test]
    fn test_date_bounds_skip_nulls() {
        let (lo, hi) = sample().date_bounds().unwrap();
        assert_eq!((lo.month(), lo.day()), (2, 1));
        assert_eq!((hi.month(), hi.day()), (3, 11));
    }

    #[test]
    fn test_options_use_reference_names_or_raw_ids() {
        let mut ds = sample();
        assert_eq!(ds.branch_options(), vec!["Centro", "Norte"]);
        ds.branches = None;
        assert_eq!(ds.branch_options(), vec!["7", "8", "9"]);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("transacoes.csv"),
            "data;valor;agencia\n01/02/2024;100;7\n02/02/2024;50;7\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("agencias.csv"), "agencia_id,nome\n7,Centro\n").unwrap();
        let ds = Dataset::load(dir.path()).unwrap();
        assert_eq!(ds.records.len(), 2);
        assert!(ds.sources.branches.is_some());
        assert!(ds.sources.clients.is_none());
        assert!(ds.clients.is_none());
    }
}
