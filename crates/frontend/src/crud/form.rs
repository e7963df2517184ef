//! Fields of the editing modal and conversion of their text back to JSON.

use contracts::crud::{affinity, Affinity, ColumnInfo, Record};
use serde_json::{Number, Value};

use super::grid::cell_text;

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    /// Column metadata when the table's schema knows this field
    pub column: Option<ColumnInfo>,
    /// Value the field started from; `None` when creating
    pub original: Option<Value>,
    pub initial_text: String,
    pub read_only: bool,
}

impl FormField {
    pub fn label(&self) -> String {
        match &self.column {
            Some(c) if c.primary_key => format!("{} (key)", self.name),
            Some(c) if !c.data_type.is_empty() => format!("{} ({})", self.name, c.data_type),
            _ => self.name.clone(),
        }
    }
}

/// One field per column, pre-filled from `initial` when editing.
///
/// Without column metadata the fields are the keys of `initial`. Key columns
/// are read-only while editing: the row is addressed by its original key.
pub fn form_fields(columns: &[ColumnInfo], initial: Option<&Record>) -> Vec<FormField> {
    let editing = initial.is_some();
    let field = |name: &str, column: Option<&ColumnInfo>| {
        let original = initial.and_then(|r| r.get(name)).cloned();
        FormField {
            name: name.to_string(),
            column: column.cloned(),
            initial_text: cell_text(original.as_ref()),
            original,
            read_only: editing && column.is_some_and(|c| c.primary_key),
        }
    };

    if columns.is_empty() {
        initial
            .map(|r| r.keys().map(|k| field(k, None)).collect())
            .unwrap_or_default()
    } else {
        columns.iter().map(|c| field(&c.name, Some(c))).collect()
    }
}

/// Converts the text of one input back to a JSON value.
///
/// Numbers are recognised by the column's affinity (or by the original value
/// when the column is untyped or unknown); booleans stay booleans. `None` means the field is
/// left out of the record.
pub fn coerce_input(field: &FormField, text: &str) -> Option<Value> {
    if text.is_empty() {
        return match (&field.original, &field.column) {
            // New rows leave blanks to the column default
            (None, _) => None,
            (Some(_), Some(c)) if !c.nullable => Some(Value::String(String::new())),
            (Some(_), _) => Some(Value::Null),
        };
    }

    if let Some(Value::Bool(_)) = field.original {
        if let Ok(b) = text.parse::<bool>() {
            return Some(Value::Bool(b));
        }
    }

    // Untyped columns (and fields without a schema) follow the value they started from
    let numeric = match field.column.as_ref().map(|c| affinity(&c.data_type)) {
        Some(Affinity::Blob) | None if matches!(field.original, Some(Value::Number(_))) => {
            Affinity::Numeric
        }
        Some(column_affinity) => column_affinity,
        None => Affinity::Text,
    };

    let number = match numeric {
        Affinity::Integer => text.parse::<i64>().ok().map(Value::from),
        Affinity::Real => parse_f64(text),
        Affinity::Numeric => text.parse::<i64>().ok().map(Value::from).or_else(|| parse_f64(text)),
        Affinity::Text | Affinity::Blob => None,
    };

    Some(number.unwrap_or_else(|| Value::String(text.to_string())))
}

fn parse_f64(text: &str) -> Option<Value> {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Builds the record sent on save from the fields and their current texts
pub fn build_record<'a>(fields: impl IntoIterator<Item = (&'a FormField, String)>) -> Record {
    let mut record = Record::new();
    for (field, text) in fields {
        if let Some(value) = coerce_input(field, &text) {
            record.insert(field.name.clone(), value);
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, data_type: &str, nullable: bool, primary_key: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            primary_key,
            default_value: None,
        }
    }

    fn columns() -> Vec<ColumnInfo> {
        vec![
            column("id", "INTEGER", false, true),
            column("name", "TEXT", false, false),
            column("price", "REAL", true, false),
            column("active", "BOOLEAN", true, false),
        ]
    }

    fn row() -> Record {
        serde_json::from_value(json!({ "id": 5, "name": "Widget", "price": 2.5, "active": true }))
            .unwrap()
    }

    #[test]
    fn test_fields_for_new_record() {
        let fields = form_fields(&columns(), None);
        assert_eq!(fields.len(), 4);
        assert!(fields.iter().all(|f| f.initial_text.is_empty() && !f.read_only));
    }

    #[test]
    fn test_fields_for_edit_prefill_and_lock_key() {
        let row = row();
        let fields = form_fields(&columns(), Some(&row));
        assert_eq!(fields[0].initial_text, "5");
        assert!(fields[0].read_only);
        assert_eq!(fields[1].initial_text, "Widget");
        assert!(!fields[1].read_only);
        assert_eq!(fields[0].label(), "id (key)");
        assert_eq!(fields[2].label(), "price (REAL)");
    }

    #[test]
    fn test_fields_without_schema_follow_record() {
        let row = row();
        let fields = form_fields(&[], Some(&row));
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "price", "active"]);
        assert!(form_fields(&[], None).is_empty());
    }

    #[test]
    fn test_coerce_by_affinity() {
        let fields = form_fields(&columns(), None);
        assert_eq!(coerce_input(&fields[0], "12"), Some(json!(12)));
        assert_eq!(coerce_input(&fields[1], "12"), Some(json!("12")));
        assert_eq!(coerce_input(&fields[2], "9.75"), Some(json!(9.75)));
        assert_eq!(coerce_input(&fields[2], "cheap"), Some(json!("cheap")));
    }

    #[test]
    fn test_untyped_column_keeps_number_type() {
        let untyped = vec![column("qty", "", true, false), column("memo", "", true, false)];
        let row: Record = serde_json::from_value(json!({ "qty": 5, "memo": "7" })).unwrap();
        let fields = form_fields(&untyped, Some(&row));
        assert_eq!(coerce_input(&fields[0], "5"), Some(json!(5)));
        assert_eq!(coerce_input(&fields[0], "2.5"), Some(json!(2.5)));
        assert_eq!(coerce_input(&fields[1], "7"), Some(json!("7")));

        let created = form_fields(&untyped, None);
        assert_eq!(coerce_input(&created[0], "5"), Some(json!("5")));
    }

    #[test]
    fn test_blank_inputs() {
        let created = form_fields(&columns(), None);
        assert_eq!(coerce_input(&created[0], ""), None);

        let row = row();
        let edited = form_fields(&columns(), Some(&row));
        assert_eq!(coerce_input(&edited[1], ""), Some(json!("")));
        assert_eq!(coerce_input(&edited[2], ""), Some(json!(null)));
    }

    #[test]
    fn test_booleans_stay_booleans() {
        let row = row();
        let fields = form_fields(&columns(), Some(&row));
        assert_eq!(coerce_input(&fields[3], "false"), Some(json!(false)));
    }

    #[test]
    fn test_build_record() {
        let row = row();
        let fields = form_fields(&columns(), Some(&row));
        let texts = ["5", "Widget v2", "3", "true"];
        let record = build_record(fields.iter().zip(texts.iter().map(|t| t.to_string())));
        assert_eq!(
            serde_json::Value::Object(record),
            json!({ "id": 5, "name": "Widget v2", "price": 3.0, "active": true })
        );
    }
}
