use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use contracts::crud::{ConnectionDetails, CONNECTION_HEADER};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};

use super::error::ApiError;

/// Shared state of the CRUD routes
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relative connection databases resolve against this directory
    pub database_root: PathBuf,
    pub create_if_missing: bool,
}

impl AppState {
    pub fn resolve_database(&self, details: &ConnectionDetails) -> Result<PathBuf, ApiError> {
        let database = details.database.trim();
        if database.is_empty() {
            return Err(ApiError::InvalidConnection("database is empty".into()));
        }
        let path = Path::new(database);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.database_root.join(path))
        }
    }

    /// Opens a fresh connection to the database named by `details`
    pub async fn connect(&self, details: &ConnectionDetails) -> Result<SqliteConnection, ApiError> {
        let path = self.resolve_database(details)?;
        SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(self.create_if_missing)
            .connect()
            .await
            .map_err(|source| ApiError::Connect {
                database: details.database.clone(),
                source,
            })
    }
}

/// Reads the connection descriptor from the `X-Connection-Details` header
pub fn parse_connection_header(headers: &HeaderMap) -> Result<ConnectionDetails, ApiError> {
    let raw = headers
        .get(CONNECTION_HEADER)
        .ok_or(ApiError::MissingConnection)?
        .to_str()
        .map_err(|e| ApiError::InvalidConnection(e.to_string()))?;
    serde_json::from_str(raw).map_err(|e| ApiError::InvalidConnection(e.to_string()))
}

/// Extractor opening the database named in the request's connection header.
/// Usage in handlers: `async fn handler(CrudConnection(mut conn): CrudConnection) -> Response`
pub struct CrudConnection(pub SqliteConnection);

#[async_trait]
impl FromRequestParts<AppState> for CrudConnection {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let details = parse_connection_header(&parts.headers)?;
        tracing::debug!("Opening database '{}'", details.database);
        state.connect(&details).await.map(CrudConnection)
    }
}
