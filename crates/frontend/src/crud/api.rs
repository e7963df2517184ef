use async_trait::async_trait;
use contracts::crud::{ConnectionDetails, TableData, CONNECTION_HEADER, TABLES_ROUTE};
use gloo_net::http::{Request, RequestBuilder};
use serde::de::DeserializeOwned;

use super::dispatcher::{
    check_response, Confirm, CrudError, CrudRequest, CrudResponse, CrudTarget, CrudTransport,
    HttpMethod,
};
use crate::shared::api_utils::api_base;

/// Browser transport over `fetch` (gloo-net)
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

#[async_trait(?Send)]
impl CrudTransport for GlooTransport {
    async fn send(&self, request: CrudRequest) -> Result<CrudResponse, CrudError> {
        let builder: RequestBuilder = match request.method {
            HttpMethod::Get => Request::get(&request.url),
            HttpMethod::Post => Request::post(&request.url),
            HttpMethod::Put => Request::put(&request.url),
            HttpMethod::Delete => Request::delete(&request.url),
        }
        .header("Content-Type", "application/json")
        .header(CONNECTION_HEADER, &request.connection);

        let response = match request.body {
            Some(body) => builder
                .body(body)
                .map_err(|e| CrudError::Serialize(e.to_string()))?
                .send()
                .await,
            None => builder.send().await,
        }
        .map_err(|e| CrudError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CrudError::Parse(e.to_string()))?;

        Ok(CrudResponse { status, body })
    }
}

/// `window.confirm`; answers no when there is no window
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowConfirm;

impl Confirm for WindowConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

async fn get_json<T: DeserializeOwned>(
    connection: &ConnectionDetails,
    url: String,
) -> Result<T, CrudError> {
    let request = CrudRequest {
        method: HttpMethod::Get,
        url,
        connection: serde_json::to_string(connection)
            .map_err(|e| CrudError::Serialize(e.to_string()))?,
        body: None,
    };
    let response = check_response(GlooTransport.send(request).await?)?;
    serde_json::from_str(&response.body).map_err(|e| CrudError::Parse(e.to_string()))
}

/// Fetch the table names of a connection
pub async fn fetch_tables(connection: &ConnectionDetails) -> Result<Vec<String>, CrudError> {
    get_json(connection, format!("{}{}", api_base(), TABLES_ROUTE)).await
}

/// Fetch rows and schema of one table
pub async fn fetch_table(
    connection: &ConnectionDetails,
    table: &str,
) -> Result<TableData, CrudError> {
    let target = CrudTarget {
        table_name: table.to_string(),
        primary_key: Vec::new(),
        connection: connection.clone(),
    };
    get_json(connection, target.collection_url(&api_base())).await
}
