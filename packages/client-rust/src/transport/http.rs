//! JSON-over-HTTP record client.
//!
//! Every operation is a `POST {base_url}/tables/{table}/{action}` whose body
//! is the query spec or batch and whose response body is the envelope.
//! Project id and public key travel as default headers on every request.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use taskdesk_core::{
    BatchResponse, DeleteBatch, FetchResponse, QuerySpec, RecordId, RecordResponse, RemoteClient,
    WriteBatch,
};

use crate::config::ClientConfig;
use crate::error::ProviderError;

pub const PROJECT_ID_HEADER: &str = "x-project-id";
pub const PUBLIC_KEY_HEADER: &str = "x-public-key";

/// Body of a get-by-id call: the id next to the flattened query spec.
#[derive(Serialize)]
struct GetRequest<'a> {
    id: RecordId,
    #[serde(flatten)]
    query: &'a QuerySpec,
}

/// [`RemoteClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordClient {
    /// Builds the client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] when the base URL is empty, a
    /// credential is not a valid header value, or the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ProviderError::Config("base_url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in [
            (PROJECT_ID_HEADER, &config.project_id),
            (PUBLIC_KEY_HEADER, &config.public_key),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProviderError::Config(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, table: &str, action: &str) -> String {
        format!("{}/tables/{table}/{action}", self.base_url)
    }

    async fn post<B, T>(&self, table: &str, action: &str, body: &B) -> anyhow::Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(table, action);
        tracing::trace!(%url, "record request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("POST {url}: HTTP status {status}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("decoding response from {url}"))
    }
}

#[async_trait]
impl RemoteClient for HttpRecordClient {
    async fn fetch_records(&self, table: &str, query: &QuerySpec) -> anyhow::Result<FetchResponse> {
        self.post(table, "fetch", query).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        query: &QuerySpec,
    ) -> anyhow::Result<RecordResponse> {
        self.post(table, "get", &GetRequest { id, query }).await
    }

    async fn create_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.post(table, "create", batch).await
    }

    async fn update_record(
        &self,
        table: &str,
        batch: &WriteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.post(table, "update", batch).await
    }

    async fn delete_record(
        &self,
        table: &str,
        batch: &DeleteBatch,
    ) -> anyhow::Result<BatchResponse> {
        self.post(table, "delete", batch).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use taskdesk_core::Record;

    use super::*;

    #[derive(Debug, Clone)]
    struct Seen {
        table: String,
        action: String,
        project: Option<String>,
        key: Option<String>,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    async fn handle(
        State(log): State<Log>,
        Path((table, action)): Path<(String, String)>,
        headers: AxumHeaders,
        Json(body): Json<Value>,
    ) -> Response {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        log.lock().push(Seen {
            table: table.clone(),
            action: action.clone(),
            project: header(PROJECT_ID_HEADER),
            key: header(PUBLIC_KEY_HEADER),
            body,
        });

        match (table.as_str(), action.as_str()) {
            ("broken_c", _) => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            (_, "fetch") => {
                Json(json!({"success": true, "data": [{"Id": 1, "Name": "a"}]})).into_response()
            }
            (_, "get") => Json(json!({"success": true, "data": {"Id": 2}})).into_response(),
            (_, "create") => Json(json!({
                "success": true,
                "results": [{
                    "success": false,
                    "errors": [{"fieldLabel": "Name", "message": "required"}]
                }]
            }))
            .into_response(),
            _ => Json(json!({"success": false, "message": "unsupported"})).into_response(),
        }
    }

    /// Bind to port 0 and return the base URL plus the request log.
    async fn start_server() -> (String, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/tables/{table}/{action}", post(handle))
            .with_state(Arc::clone(&log));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), log)
    }

    fn client_for(base_url: &str) -> HttpRecordClient {
        HttpRecordClient::new(&ClientConfig {
            base_url: format!("{base_url}/"),
            project_id: "proj-1".to_string(),
            public_key: "pk-abc".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_posts_query_with_credentials() {
        let (base, log) = start_server().await;
        let client = client_for(&base);

        let query = QuerySpec::project(["Id", "Name"]);
        let response = client.fetch_records("task_c", &query).await.unwrap();

        assert!(response.success);
        assert_eq!(response.data.unwrap()[0].get_str("Name"), Some("a"));

        let seen = log.lock()[0].clone();
        assert_eq!(seen.table, "task_c");
        assert_eq!(seen.action, "fetch");
        assert_eq!(seen.project.as_deref(), Some("proj-1"));
        assert_eq!(seen.key.as_deref(), Some("pk-abc"));
        assert_eq!(seen.body, serde_json::to_value(&query).unwrap());
    }

    #[tokio::test]
    async fn get_flattens_id_into_query() {
        let (base, log) = start_server().await;
        let client = client_for(&base);

        let response = client
            .get_record_by_id("task_c", 2, &QuerySpec::project(["Id"]))
            .await
            .unwrap();

        assert_eq!(response.data.and_then(|r| r.id()), Some(2));
        let body = log.lock()[0].body.clone();
        assert_eq!(body["id"], json!(2));
        assert_eq!(body["fields"][0]["field"]["Name"], json!("Id"));
    }

    #[tokio::test]
    async fn create_returns_per_record_results() {
        let (base, _) = start_server().await;
        let client = client_for(&base);

        let response = client
            .create_record("task_c", &WriteBatch::single(Record::new()))
            .await
            .unwrap();

        let results = response.results.unwrap();
        assert!(!results[0].success);
        assert_eq!(results[0].field_errors()[0].field_label, "Name");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let (base, _) = start_server().await;
        let client = client_for(&base);

        let err = client
            .fetch_records("broken_c", &QuerySpec::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = client_for("http://127.0.0.1:9");
        let batch = DeleteBatch {
            record_ids: vec![1],
        };
        assert!(client.delete_record("task_c", &batch).await.is_err());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let empty = ClientConfig {
            base_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpRecordClient::new(&empty),
            Err(ProviderError::Config(_))
        ));

        let bad_header = ClientConfig {
            public_key: "line\nbreak".to_string(),
            ..ClientConfig::default()
        };
        let err = HttpRecordClient::new(&bad_header).unwrap_err();
        assert!(err.to_string().contains(PUBLIC_KEY_HEADER));
    }
}
