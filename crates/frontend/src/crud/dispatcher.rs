//! Mutation dispatcher of the data grid.
//!
//! Turns a save or delete from the grid into one HTTP request against the
//! generic CRUD API and calls the refresh callback when it succeeds.
//! Failures end in the browser console only; nothing is retried.

use async_trait::async_trait;
use contracts::crud::{
    key_segment, ApiErrorBody, ConnectionDetails, CrudPayload, Record, CRUD_ROUTE_PREFIX,
    DEFAULT_ERROR_MESSAGE,
};
use thiserror::Error;

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this record?";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrudError {
    #[error("Failed to send request: {0}")]
    Network(String),
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },
    #[error("Failed to serialize request: {0}")]
    Serialize(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Table has no primary key")]
    NoPrimaryKey,
    #[error("Row has no usable value for primary key '{0}'")]
    MissingPrimaryKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A fully prepared API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudRequest {
    pub method: HttpMethod,
    pub url: String,
    /// JSON form of the connection descriptor, sent as `X-Connection-Details`
    pub connection: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudResponse {
    pub status: u16,
    pub body: String,
}

impl CrudResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends prepared requests. `GlooTransport` in the browser.
#[async_trait(?Send)]
pub trait CrudTransport {
    async fn send(&self, request: CrudRequest) -> Result<CrudResponse, CrudError>;
}

/// Blocking yes/no prompt shown before a delete. `WindowConfirm` in the browser.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// The table a mutation applies to
#[derive(Debug, Clone, PartialEq)]
pub struct CrudTarget {
    pub table_name: String,
    pub primary_key: Vec<String>,
    pub connection: ConnectionDetails,
}

impl CrudTarget {
    pub fn collection_url(&self, base: &str) -> String {
        format!(
            "{}{}/{}",
            base,
            CRUD_ROUTE_PREFIX,
            urlencoding::encode(&self.table_name)
        )
    }

    /// URL of `row`, addressed by the value of the first primary-key column
    pub fn item_url(&self, base: &str, row: &Record) -> Result<String, CrudError> {
        let key = self.primary_key.first().ok_or(CrudError::NoPrimaryKey)?;
        let segment =
            key_segment(row.get(key)).ok_or_else(|| CrudError::MissingPrimaryKey(key.clone()))?;
        Ok(format!(
            "{}/{}",
            self.collection_url(base),
            urlencoding::encode(&segment)
        ))
    }

    fn connection_header(&self) -> Result<String, CrudError> {
        serde_json::to_string(&self.connection).map_err(|e| CrudError::Serialize(e.to_string()))
    }
}

/// POST for a new record, PUT when a row was selected for editing
pub fn save_request(
    target: &CrudTarget,
    base: &str,
    selected: Option<&Record>,
    record: Record,
) -> Result<CrudRequest, CrudError> {
    let (method, url) = match selected {
        Some(row) => (HttpMethod::Put, target.item_url(base, row)?),
        None => (HttpMethod::Post, target.collection_url(base)),
    };
    let body = serde_json::to_string(&CrudPayload { body: record })
        .map_err(|e| CrudError::Serialize(e.to_string()))?;
    Ok(CrudRequest {
        method,
        url,
        connection: target.connection_header()?,
        body: Some(body),
    })
}

pub fn delete_request(
    target: &CrudTarget,
    base: &str,
    row: &Record,
) -> Result<CrudRequest, CrudError> {
    Ok(CrudRequest {
        method: HttpMethod::Delete,
        url: target.item_url(base, row)?,
        connection: target.connection_header()?,
        body: None,
    })
}

/// The `message` of a JSON error body, or a generic text
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

/// Maps a non-2xx response to [`CrudError::Server`]
pub fn check_response(response: CrudResponse) -> Result<CrudResponse, CrudError> {
    if response.ok() {
        Ok(response)
    } else {
        Err(CrudError::Server {
            status: response.status,
            message: error_message(&response.body),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

pub struct MutationDispatcher<T, C, R> {
    transport: T,
    confirm: C,
    on_refresh: R,
    base: String,
}

impl<T, C, R> MutationDispatcher<T, C, R>
where
    T: CrudTransport,
    C: Confirm,
    R: Fn(),
{
    pub fn new(transport: T, confirm: C, on_refresh: R, base: impl Into<String>) -> Self {
        Self {
            transport,
            confirm,
            on_refresh,
            base: base.into(),
        }
    }

    /// Creates or updates `record`; edit vs create follows `selected`.
    ///
    /// On success the refresh callback has run. Errors are logged and returned.
    pub async fn save(
        &self,
        target: &CrudTarget,
        selected: Option<&Record>,
        record: Record,
    ) -> Result<(), CrudError> {
        let result = self.try_save(target, selected, record).await;
        match &result {
            Ok(()) => (self.on_refresh)(),
            Err(e) => log::error!("Failed to save data: {}", e),
        }
        result
    }

    async fn try_save(
        &self,
        target: &CrudTarget,
        selected: Option<&Record>,
        record: Record,
    ) -> Result<(), CrudError> {
        let request = save_request(target, &self.base, selected, record)?;
        log::debug!("{:?} {}", request.method, request.url);
        check_response(self.transport.send(request).await?)?;
        Ok(())
    }

    /// Deletes `row` after the user confirms; declining sends nothing
    pub async fn delete(
        &self,
        target: &CrudTarget,
        row: &Record,
    ) -> Result<DeleteOutcome, CrudError> {
        if !self.confirm.confirm(DELETE_CONFIRMATION) {
            return Ok(DeleteOutcome::Cancelled);
        }
        let result = self.try_delete(target, row).await;
        match &result {
            Ok(()) => (self.on_refresh)(),
            Err(e) => log::error!("Failed to delete data: {}", e),
        }
        result.map(|()| DeleteOutcome::Deleted)
    }

    async fn try_delete(&self, target: &CrudTarget, row: &Record) -> Result<(), CrudError> {
        let request = delete_request(target, &self.base, row)?;
        log::debug!("{:?} {}", request.method, request.url);
        check_response(self.transport.send(request).await?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct MockTransport {
        status: u16,
        body: String,
        sent: RefCell<Vec<CrudRequest>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl<'a> CrudTransport for &'a MockTransport {
        async fn send(&self, request: CrudRequest) -> Result<CrudResponse, CrudError> {
            self.sent.borrow_mut().push(request);
            Ok(CrudResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    struct Offline;

    #[async_trait(?Send)]
    impl CrudTransport for Offline {
        async fn send(&self, _request: CrudRequest) -> Result<CrudResponse, CrudError> {
            Err(CrudError::Network("connection refused".into()))
        }
    }

    struct Answer(bool);

    impl Confirm for Answer {
        fn confirm(&self, message: &str) -> bool {
            assert_eq!(message, DELETE_CONFIRMATION);
            self.0
        }
    }

    fn target() -> CrudTarget {
        CrudTarget {
            table_name: "customers".into(),
            primary_key: vec!["id".into(), "region".into()],
            connection: ConnectionDetails {
                database: "shop.db".into(),
            },
        }
    }

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn()) {
        let count = Rc::new(Cell::new(0));
        let handle = count.clone();
        (count, move || handle.set(handle.get() + 1))
    }

    #[tokio::test]
    async fn test_save_without_selection_posts() {
        let transport = MockTransport::replying(201, r#"{"rows_affected":1}"#);
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(true), on_refresh, "");

        let new_row = record(json!({ "name": "Grace" }));
        dispatcher.save(&target(), None, new_row).await.unwrap();

        let sent = transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].url, "/api/crud/customers");
        assert_eq!(sent[0].connection, r#"{"database":"shop.db"}"#);
        assert_eq!(
            sent[0].body.as_deref(),
            Some(r#"{"body":{"name":"Grace"}}"#)
        );
        assert_eq!(refreshed.get(), 1);
    }

    #[tokio::test]
    async fn test_save_with_selection_puts_to_first_key() {
        let transport = MockTransport::replying(200, r#"{"rows_affected":1}"#);
        let (refreshed, on_refresh) = counter();
        let dispatcher =
            MutationDispatcher::new(&transport, Answer(true), on_refresh, "http://host:3000");

        let selected = record(json!({ "id": 7, "region": "eu", "name": "Ada" }));
        let edited = record(json!({ "id": 7, "region": "eu", "name": "Ada L." }));
        dispatcher
            .save(&target(), Some(&selected), edited)
            .await
            .unwrap();

        let sent = transport.sent.borrow();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].url, "http://host:3000/api/crud/customers/7");
        assert_eq!(refreshed.get(), 1);
    }

    #[tokio::test]
    async fn test_key_values_are_percent_encoded() {
        let transport = MockTransport::replying(200, "{}");
        let (_, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(true), on_refresh, "");

        let row = record(json!({ "id": "a/b c" }));
        dispatcher.delete(&target(), &row).await.unwrap();

        assert_eq!(transport.sent.borrow()[0].url, "/api/crud/customers/a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_failed_save_does_not_refresh() {
        let transport = MockTransport::replying(400, r#"{"message":"NOT NULL constraint failed"}"#);
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(true), on_refresh, "");

        let err = dispatcher
            .save(&target(), None, record(json!({ "city": "Oslo" })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CrudError::Server {
                status: 400,
                message: "NOT NULL constraint failed".into()
            }
        );
        assert_eq!(refreshed.get(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_does_not_refresh() {
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(Offline, Answer(true), on_refresh, "");

        let result = dispatcher.delete(&target(), &record(json!({ "id": 1 }))).await;

        assert!(matches!(result, Err(CrudError::Network(_))));
        assert_eq!(refreshed.get(), 0);
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let transport = MockTransport::replying(200, "{}");
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(false), on_refresh, "");

        let outcome = dispatcher
            .delete(&target(), &record(json!({ "id": 3 })))
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert!(transport.sent.borrow().is_empty());
        assert_eq!(refreshed.get(), 0);
    }

    #[tokio::test]
    async fn test_confirmed_delete() {
        let transport = MockTransport::replying(200, r#"{"rows_affected":1}"#);
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(true), on_refresh, "");

        let outcome = dispatcher
            .delete(&target(), &record(json!({ "id": 3, "name": "Linus" })))
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        let sent = transport.sent.borrow();
        assert_eq!(sent[0].method, HttpMethod::Delete);
        assert_eq!(sent[0].url, "/api/crud/customers/3");
        assert_eq!(sent[0].body, None);
        assert_eq!(refreshed.get(), 1);
    }

    #[tokio::test]
    async fn test_row_without_key_value_sends_nothing() {
        let transport = MockTransport::replying(200, "{}");
        let (refreshed, on_refresh) = counter();
        let dispatcher = MutationDispatcher::new(&transport, Answer(true), on_refresh, "");

        let selected = record(json!({ "id": null, "name": "Ghost" }));
        let err = dispatcher
            .save(&target(), Some(&selected), selected.clone())
            .await
            .unwrap_err();

        assert_eq!(err, CrudError::MissingPrimaryKey("id".into()));
        assert!(transport.sent.borrow().is_empty());
        assert_eq!(refreshed.get(), 0);
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message(r#"{"message":"boom"}"#), "boom");
        assert_eq!(error_message(r#"{"message":""}"#), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), DEFAULT_ERROR_MESSAGE);
    }
}
