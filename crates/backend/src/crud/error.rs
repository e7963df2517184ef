use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::crud::ApiErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing X-Connection-Details header")]
    MissingConnection,
    #[error("Invalid X-Connection-Details header: {0}")]
    InvalidConnection(String),
    #[error("Cannot open database '{database}': {source}")]
    Connect {
        database: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Request body has no fields")]
    EmptyBody,
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Table '{0}' has no primary key")]
    NoPrimaryKey(String),
    #[error("Table '{table}' has a composite primary key ({columns}); rows cannot be addressed by a single id")]
    CompositeKey { table: String, columns: String },
    #[error("No row in '{table}' where {column} = {id}")]
    RowNotFound {
        table: String,
        column: String,
        id: String,
    },
    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingConnection
            | ApiError::InvalidConnection(_)
            | ApiError::Connect { .. }
            | ApiError::InvalidBody(_)
            | ApiError::EmptyBody
            | ApiError::NoPrimaryKey(_)
            | ApiError::CompositeKey { .. } => StatusCode::BAD_REQUEST,
            ApiError::TableNotFound(_) | ApiError::RowNotFound { .. } => StatusCode::NOT_FOUND,
            // Constraint violations, unknown columns and the like come back as
            // database errors and are the caller's to fix
            ApiError::Database(sqlx::Error::Database(_)) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("CRUD request failed: {}", self);
        } else {
            tracing::warn!("CRUD request rejected: {}", self);
        }
        let body = ApiErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
