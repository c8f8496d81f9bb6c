use std::collections::HashSet;

use crate::models::{FilterSelection, ReferenceTable, Selection, TransactionRecord};

/// How a branch/client selection is compared against record ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch<'a> {
    /// The display name resolved through the reference table to these ids.
    Resolved(HashSet<&'a str>),
    /// No reference table, or the name resolved to nothing: compare the
    /// selection against the raw id text.
    Literal(&'a str),
}

impl IdMatch<'_> {
    pub fn matches(&self, id: Option<&str>) -> bool {
        let Some(id) = id else {
            return false;
        };
        match self {
            Self::Resolved(ids) => ids.contains(id),
            Self::Literal(value) => id == *value,
        }
    }
}

pub fn resolve<'a>(name: &'a str, reference: Option<&'a ReferenceTable>) -> IdMatch<'a> {
    match reference {
        Some(table) => {
            let ids: HashSet<&str> = table.ids_for_name(name).into_iter().collect();
            if ids.is_empty() {
                IdMatch::Literal(name)
            } else {
                IdMatch::Resolved(ids)
            }
        }
        None => IdMatch::Literal(name),
    }
}

fn predicate<'a>(selection: &'a Selection, reference: Option<&'a ReferenceTable>) -> Option<IdMatch<'a>> {
    match selection {
        Selection::All => None,
        Selection::Named(name) => Some(resolve(name, reference)),
    }
}

/// Applies every active predicate (AND). Input order is kept and the
/// records themselves are never touched.
pub fn apply<'a>(
    records: &'a [TransactionRecord],
    selection: &FilterSelection,
    branches: Option<&ReferenceTable>,
    clients: Option<&ReferenceTable>,
) -> Vec<&'a TransactionRecord> {
    let branch = predicate(&selection.branch, branches);
    let client = predicate(&selection.client, clients);

    records
        .iter()
        .filter(|r| match &selection.dates {
            Some(range) => r.timestamp.as_ref().is_some_and(|ts| range.contains(ts)),
            None => true,
        })
        .filter(|r| branch.as_ref().map_or(true, |m| m.matches(r.branch_ref.as_deref())))
        .filter(|r| client.as_ref().map_or(true, |m| m.matches(r.client_ref.as_deref())))
        .collect()
}

/// Values offered to the user for a selector: reference display names when
/// the table exists, otherwise the raw ids seen in the transactions.
pub fn options<F>(
    records: &[TransactionRecord],
    reference: Option<&ReferenceTable>,
    id_of: F,
) -> Vec<String>
where
    F: Fn(&TransactionRecord) -> Option<&str>,
{
    if let Some(table) = reference.filter(|t| !t.is_empty()) {
        return table.names();
    }
    let mut ids: Vec<String> = records.iter().filter_map(|r| id_of(r).map(str::to_string)).collect();
    ids.sort();
    ids.dedup();
    ids
}
