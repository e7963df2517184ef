//! Layout of the data grid, derived from the records alone.
//!
//! The grid has no schema of its own: its columns are the keys of the
//! first record, in order.

use contracts::crud::Record;
use serde_json::Value;

/// Column headers: the keys of the first record, or nothing when there are no records
pub fn headers_of(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default()
}

/// What the grid renders: the header row and one body row per record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub headers: Vec<String>,
    pub body_rows: usize,
}

impl GridLayout {
    /// Data columns plus the trailing "Actions" column
    pub fn columns(&self) -> usize {
        self.headers.len() + 1
    }
}

/// `None` when the grid renders nothing
pub fn grid_layout(records: &[Record]) -> Option<GridLayout> {
    if records.is_empty() {
        return None;
    }
    Some(GridLayout {
        headers: headers_of(records),
        body_rows: records.len(),
    })
}

/// Text shown in a cell: strings unquoted, null as empty, anything else as JSON
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
