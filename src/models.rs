use chrono::{NaiveDate, NaiveDateTime};

/// A delimited file as read from disk: trimmed headers plus string cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `(row, col)`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One normalized transaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub amount: Option<f64>,
    pub branch_ref: Option<String>,
    pub client_ref: Option<String>,
    pub approved: bool,
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self {
            timestamp: None,
            amount: None,
            branch_ref: None,
            client_ref: None,
            approved: true,
        }
    }
}

/// Id → display name lookup for branches or clients.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub entries: Vec<(String, String)>,
}

impl ReferenceTable {
    /// Every id whose display name equals `name`. Duplicate names are kept as a set.
    pub fn ids_for_name(&self, name: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for (id, label) in &self.entries {
            if label == name && !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, label)| label.as_str())
    }

    /// Sorted unique display names, used to populate selectors.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|(_, n)| n.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single branch or client choice. `All` disables the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Named(String),
}

impl Selection {
    pub fn from_arg(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(v) => Self::Named(v.to_string()),
        }
    }

    pub fn label(&self, all_label: &str) -> String {
        match self {
            Self::All => all_label.to_string(),
            Self::Named(name) => name.clone(),
        }
    }
}

/// Inclusive calendar-day interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let day = ts.date();
        day >= self.start && day <= self.end
    }
}

/// What the user asked to see; built once per command and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub dates: Option<DateRange>,
    pub branch: Selection,
    pub client: Selection,
}

#[cfg(test)]
impl FilterSelection {
    pub fn everything() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_for_name_collects_collisions() {
        let table = ReferenceTable {
            entries: vec![
                ("1".into(), "Centro".into()),
                ("2".into(), "Norte".into()),
                ("3".into(), "Centro".into()),
                ("1".into(), "Centro".into()),
            ],
        };
        assert_eq!(table.ids_for_name("Centro"), vec!["1", "3"]);
        assert!(table.ids_for_name("Sul").is_empty());
        assert_eq!(table.names(), vec!["Centro", "Norte"]);
    }

    #[test]
    fn test_selection_from_arg() {
        assert_eq!(Selection::from_arg(None), Selection::All);
        assert_eq!(Selection::from_arg(Some("")), Selection::All);
        assert_eq!(Selection::from_arg(Some("All")), Selection::Named("All".into()));
        assert_eq!(Selection::from_arg(Some(" ")), Selection::All);
        assert_eq!(
            Selection::from_arg(Some("Centro")),
            Selection::Named("Centro".into())
        );
    }

    #[test]
    fn test_date_range_is_inclusive_of_whole_end_day() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };
        let late = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(range.contains(&late));
        assert!(!range.contains(&after));
    }
}
