//! Mapping between JSON values and SQLite values.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use contracts::crud::{Affinity, Record};
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Quotes an identifier for interpolation into SQL: `a"b` -> `"a""b"`
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Binds a JSON value as the next positional parameter.
///
/// Arrays and objects are stored as their JSON text.
pub fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        other => query.bind(other.to_string()),
    }
}

/// Binds a primary-key value taken from the URL path.
///
/// The path segment is text; it is bound as a number when the key column's
/// affinity would store it as one, so `WHERE id = ?` matches.
pub fn bind_key<'q>(query: SqliteQuery<'q>, id: &str, key_affinity: Affinity) -> SqliteQuery<'q> {
    match key_affinity {
        Affinity::Integer => match id.parse::<i64>() {
            Ok(i) => query.bind(i),
            Err(_) => query.bind(id.to_string()),
        },
        Affinity::Real => match id.parse::<f64>() {
            Ok(f) => query.bind(f),
            Err(_) => query.bind(id.to_string()),
        },
        // Untyped columns keep whatever storage class was written, and the
        // grid only ever writes numbers as numbers
        Affinity::Numeric | Affinity::Blob => {
            if let Ok(i) = id.parse::<i64>() {
                query.bind(i)
            } else if let Ok(f) = id.parse::<f64>() {
                query.bind(f)
            } else {
                query.bind(id.to_string())
            }
        }
        Affinity::Text => query.bind(id.to_string()),
    }
}

/// Converts a result row into a [`Record`], keeping column order.
///
/// Values are decoded by their storage class; BLOBs become base64 strings.
pub fn row_to_record(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" | "NUMERIC" => {
                    let f = row.try_get::<f64, _>(index)?;
                    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
                }
                "BLOB" => Value::String(BASE64.encode(row.try_get::<Vec<u8>, _>(index)?)),
                _ => Value::String(row.try_get::<String, _>(index)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
