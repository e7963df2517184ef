use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::crud::{self, AppState};
use crate::system::middleware::request_logger::request_logger;

/// Builds the application router with CORS and request logging
pub fn configure_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-connection-details"),
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // GENERIC CRUD
        // ========================================
        .route("/api/tables", get(crud::handlers::list_tables))
        .route(
            "/api/crud/:table",
            get(crud::handlers::list_rows).post(crud::handlers::create),
        )
        .route(
            "/api/crud/:table/:id",
            axum::routing::put(crud::handlers::update).delete(crud::handlers::delete),
        )
        .with_state(state)
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::crud::{ApiErrorBody, TableData};
    use serde_json::json;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
    use sqlx::ConnectOptions;
    use std::path::PathBuf;
    use tower::ServiceExt;

    struct TestDb {
        dir: PathBuf,
    }

    impl Drop for TestDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    async fn setup() -> (Router, TestDb) {
        let dir = std::env::temp_dir().join(format!("crud-grid-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut conn: SqliteConnection = SqliteConnectOptions::new()
            .filename(dir.join("shop.db"))
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query("CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO customers (id, name, city) VALUES (1, 'Ada', 'London'), (2, 'Linus', 'Helsinki')")
            .execute(&mut conn)
            .await
            .unwrap();
        drop(conn);

        let state = AppState {
            database_root: dir.clone(),
            create_if_missing: false,
        };
        (configure_routes(state), TestDb { dir })
    }

    fn request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-connection-details", r#"{"database":"shop.db"}"#)
            .header(header::CONTENT_TYPE, "application/json");
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_default();
        builder.body(body).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn rows(app: &Router) -> TableData {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/crud/customers", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_get_table_data() {
        let (app, _db) = setup().await;
        let data = rows(&app).await;
        assert_eq!(data.primary_key, ["id"]);
        assert_eq!(data.columns.len(), 3);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1]["name"], json!("Linus"));
    }

    #[tokio::test]
    async fn test_post_creates_row() {
        let (app, _db) = setup().await;
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/crud/customers",
                Some(json!({ "body": { "id": 3, "name": "Grace", "city": null } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(rows(&app).await.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_put_updates_row_by_key() {
        let (app, _db) = setup().await;
        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                "/api/crud/customers/2",
                Some(json!({ "body": { "city": "Portland" } })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let data = rows(&app).await;
        assert_eq!(data.rows[1]["city"], json!("Portland"));
        assert_eq!(data.rows[0]["city"], json!("London"));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (app, _db) = setup().await;
        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/api/crud/customers/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let data = rows(&app).await;
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0]["id"], json!(2));
    }

    #[tokio::test]
    async fn test_errors_carry_message() {
        let (app, _db) = setup().await;

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/api/crud/customers/99", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ApiErrorBody = json_body(response).await;
        assert!(body.message.contains("customers"));

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/crud/customers", Some(json!({ "nobody": 1 }))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = json_body(response).await;
        assert!(body.message.starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_missing_connection_header() {
        let (app, _db) = setup().await;
        let request = Request::builder()
            .uri("/api/tables")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = json_body(response).await;
        assert_eq!(body.message, "Missing X-Connection-Details header");
    }

    #[tokio::test]
    async fn test_list_tables() {
        let (app, _db) = setup().await;
        let response = app
            .oneshot(request(Method::GET, "/api/tables", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let tables: Vec<String> = json_body(response).await;
        assert_eq!(tables, ["customers"]);
    }
}
