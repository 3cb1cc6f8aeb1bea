//! Cloud Firestore REST client (create-document only).

use super::DocumentStore;
use crate::error::StoreError;
use crate::model::{DocumentRef, StoredRegistration};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Everything needed to reach one Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: String,
    pub timeout: Duration,
    pub user_agent: String,
}

pub struct FirestoreStore {
    http: reqwest::Client,
    cfg: FirestoreConfig,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreStore {
    pub fn new(cfg: FirestoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { http, cfg })
    }

    /// `{base}/v1/projects/{project}/databases/{db}/documents/{collection}`, without the key.
    pub(crate) fn collection_url(&self, collection: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.cfg.base_url)
            .map_err(|e| StoreError::Transport(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.cfg.project_id.as_str(),
                "databases",
                self.cfg.database.as_str(),
                "documents",
                collection,
            ]);
        Ok(url)
    }
}

/// Firestore's typed-value encoding: every attribute is stored as a string.
pub(crate) fn encode_fields(doc: &StoredRegistration) -> Value {
    let fields: Map<String, Value> = doc
        .entries()
        .into_iter()
        .map(|(k, v)| (k.to_string(), json!({ "stringValue": v })))
        .collect();
    json!({ "fields": fields })
}

/// Turn a non-success response body into a store error carrying the server message.
pub(crate) fn decode_error(http_status: reqwest::StatusCode, body: &str) -> StoreError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => StoreError::Rejected {
            status: parsed.error.status,
            message: parsed.error.message,
        },
        Err(_) => StoreError::Rejected {
            status: Some(http_status.as_u16().to_string()),
            message: if body.trim().is_empty() {
                format!("request failed with HTTP {http_status}")
            } else {
                body.trim().to_string()
            },
        },
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create_document(
        &self,
        collection: &str,
        doc: &StoredRegistration,
    ) -> Result<DocumentRef, StoreError> {
        let url = self.collection_url(collection)?;
        tracing::debug!(%url, "creating firestore document");

        let mut keyed = url;
        keyed.query_pairs_mut().append_pair("key", &self.cfg.api_key);

        let resp = self
            .http
            .post(keyed)
            .json(&encode_fields(doc))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(decode_error(status, &body));
        }

        let created: CreatedDocument = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("unexpected create response: {e}")))?;
        Ok(DocumentRef::new(created.name))
    }
}
