use axum::{
    extract::{rejection::JsonRejection, Json, Path},
    http::StatusCode,
};
use contracts::crud::{CrudPayload, MutationResult, TableData};

use super::connection::CrudConnection;
use super::error::ApiError;
use super::repository;

fn payload(body: Result<Json<CrudPayload>, JsonRejection>) -> Result<CrudPayload, ApiError> {
    body.map(|Json(payload)| payload)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

/// GET /api/tables
pub async fn list_tables(
    CrudConnection(mut conn): CrudConnection,
) -> Result<Json<Vec<String>>, ApiError> {
    let tables = repository::list_tables(&mut conn).await?;
    Ok(Json(tables))
}

/// GET /api/crud/:table
pub async fn list_rows(
    CrudConnection(mut conn): CrudConnection,
    Path(table): Path<String>,
) -> Result<Json<TableData>, ApiError> {
    let data = repository::select_all(&mut conn, &table).await?;
    Ok(Json(data))
}

/// POST /api/crud/:table
pub async fn create(
    CrudConnection(mut conn): CrudConnection,
    Path(table): Path<String>,
    body: Result<Json<CrudPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResult>), ApiError> {
    let payload = payload(body)?;
    let rows_affected = repository::insert(&mut conn, &table, payload.body).await?;
    tracing::info!("Inserted {} row(s) into '{}'", rows_affected, table);
    Ok((StatusCode::CREATED, Json(MutationResult { rows_affected })))
}

/// PUT /api/crud/:table/:id
pub async fn update(
    CrudConnection(mut conn): CrudConnection,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<CrudPayload>, JsonRejection>,
) -> Result<Json<MutationResult>, ApiError> {
    let payload = payload(body)?;
    let rows_affected = repository::update(&mut conn, &table, &id, payload.body).await?;
    tracing::info!("Updated row '{}' in '{}'", id, table);
    Ok(Json(MutationResult { rows_affected }))
}

/// DELETE /api/crud/:table/:id
pub async fn delete(
    CrudConnection(mut conn): CrudConnection,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<MutationResult>, ApiError> {
    let rows_affected = repository::delete(&mut conn, &table, &id).await?;
    tracing::info!("Deleted row '{}' from '{}'", id, table);
    Ok(Json(MutationResult { rows_affected }))
}
