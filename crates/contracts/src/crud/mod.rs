use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header carrying the JSON-serialized [`ConnectionDetails`] on every CRUD call
pub const CONNECTION_HEADER: &str = "X-Connection-Details";

/// Prefix of the generic CRUD routes: `/api/crud/{table}` and `/api/crud/{table}/{id}`
pub const CRUD_ROUTE_PREFIX: &str = "/api/crud";

/// Route listing the tables of a connection
pub const TABLES_ROUTE: &str = "/api/tables";

/// Fallback used when an error response carries no `message`
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// One row of a table, column name -> value, in column order
pub type Record = Map<String, Value>;

/// Target database of a CRUD call.
///
/// The grid never looks inside; it is forwarded as-is in [`CONNECTION_HEADER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    /// SQLite database file; relative paths resolve against the server's database root
    pub database: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared SQL type, e.g. `INTEGER`, `TEXT`, `VARCHAR(20)`. Empty when undeclared.
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// Body of POST and PUT requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrudPayload {
    pub body: Record,
}

/// Result of GET `/api/crud/{table}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub rows_affected: u64,
}

/// JSON error body returned by every failing API call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Column type affinity, derived from the declared type by SQLite's rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

pub fn affinity(declared_type: &str) -> Affinity {
    let t = declared_type.to_ascii_uppercase();
    if t.contains("INT") {
        Affinity::Integer
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        Affinity::Text
    } else if t.is_empty() || t.contains("BLOB") {
        Affinity::Blob
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        Affinity::Real
    } else {
        Affinity::Numeric
    }
}

/// Text form of a primary-key value as it appears in `/api/crud/{table}/{id}`.
///
/// `None` for missing or null keys and for arrays/objects, which cannot
/// address a row.
pub fn key_segment(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // SQLite stores booleans as 1/0
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
