//! Generic table access over a single SQLite connection.
//!
//! Table and column names are always interpolated through [`quote_ident`];
//! values are always bound.

use contracts::crud::{affinity, ColumnInfo, Record, TableData};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::error::ApiError;
use super::values::{bind_key, bind_value, quote_ident, row_to_record};

/// Names of the user tables, sorted
pub async fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<String>, ApiError> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(names)
}

async fn has_table(conn: &mut SqliteConnection, table: &str) -> Result<bool, ApiError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Table schema: columns in declaration order plus primary-key columns in key order
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// The single key column rows are addressed by
    fn key_column(&self) -> Result<&ColumnInfo, ApiError> {
        match self.primary_key.as_slice() {
            [] => Err(ApiError::NoPrimaryKey(self.name.clone())),
            [key] => self
                .columns
                .iter()
                .find(|c| &c.name == key)
                .ok_or_else(|| ApiError::NoPrimaryKey(self.name.clone())),
            keys => Err(ApiError::CompositeKey {
                table: self.name.clone(),
                columns: keys.join(", "),
            }),
        }
    }
}

pub async fn describe_table(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<TableSchema, ApiError> {
    if !has_table(conn, table).await? {
        return Err(ApiError::TableNotFound(table.to_string()));
    }

    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let mut columns = Vec::with_capacity(rows.len());
    let mut keyed: Vec<(i64, String)> = Vec::new();
    for row in rows {
        let name: String = row.try_get("name")?;
        let pk_position: i64 = row.try_get("pk")?;
        let not_null: i64 = row.try_get("notnull")?;
        if pk_position > 0 {
            keyed.push((pk_position, name.clone()));
        }
        columns.push(ColumnInfo {
            name,
            data_type: row.try_get("type")?,
            nullable: not_null == 0 && pk_position == 0,
            primary_key: pk_position > 0,
            default_value: row.try_get("dflt_value")?,
        });
    }
    keyed.sort_by_key(|(position, _)| *position);

    Ok(TableSchema {
        name: table.to_string(),
        columns,
        primary_key: keyed.into_iter().map(|(_, name)| name).collect(),
    })
}

/// All rows of `table` with its schema
pub async fn select_all(conn: &mut SqliteConnection, table: &str) -> Result<TableData, ApiError> {
    let schema = describe_table(conn, table).await?;

    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    let rows = rows
        .iter()
        .map(row_to_record)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Selected {} rows from '{}'", rows.len(), table);

    Ok(TableData {
        table: schema.name,
        columns: schema.columns,
        primary_key: schema.primary_key,
        rows,
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    table: &str,
    record: Record,
) -> Result<u64, ApiError> {
    describe_table(conn, table).await?;

    let sql = if record.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    } else {
        let names: Vec<String> = record.keys().map(|k| quote_ident(k)).collect();
        let placeholders = vec!["?"; record.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names.join(", "),
            placeholders
        )
    };

    let mut query = sqlx::query(&sql);
    for (_, value) in record {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Updates the row whose single primary key equals `id`
pub async fn update(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    record: Record,
) -> Result<u64, ApiError> {
    let schema = describe_table(conn, table).await?;
    let key = schema.key_column()?;
    if record.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let assignments: Vec<String> = record
        .keys()
        .map(|k| format!("{} = ?", quote_ident(k)))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(&key.name)
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in record {
        query = bind_value(query, value);
    }
    query = bind_key(query, id, affinity(&key.data_type));

    let affected = query.execute(&mut *conn).await?.rows_affected();
    if affected == 0 {
        return Err(ApiError::RowNotFound {
            table: table.to_string(),
            column: key.name.clone(),
            id: id.to_string(),
        });
    }
    Ok(affected)
}

/// Deletes the row whose single primary key equals `id`
pub async fn delete(conn: &mut SqliteConnection, table: &str, id: &str) -> Result<u64, ApiError> {
    let schema = describe_table(conn, table).await?;
    let key = schema.key_column()?;

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(&key.name)
    );
    let query = bind_key(sqlx::query(&sql), id, affinity(&key.data_type));

    let affected = query.execute(&mut *conn).await?.rows_affected();
    if affected == 0 {
        return Err(ApiError::RowNotFound {
            table: table.to_string(),
            column: key.name.clone(),
            id: id.to_string(),
        });
    }
    Ok(affected)
}
