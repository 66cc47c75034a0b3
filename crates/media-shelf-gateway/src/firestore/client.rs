use async_trait::async_trait;
use media_shelf_config::FirestoreConfig;
use media_shelf_models::RemoteDocument;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{check_segment, GatewayError};
use crate::firestore::value::{self, RunQueryResponseItem, DOCUMENT_FIELDS};
use crate::traits::{sort_by_timestamp_desc, CollectionGateway, StoredDocument};

// Firestore rejects commits with more writes than this
const MAX_BATCH_WRITES: usize = 500;

pub fn create_http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("media-shelf/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Cloud Firestore over the v1 REST API. User collections live at
/// `users/{uid}/{collection}/{doc_id}`.
#[derive(Clone)]
pub struct FirestoreGateway {
    client: Arc<Client>,
    base_url: String,
    project_id: String,
    database: String,
    id_token: Option<String>,
}

impl FirestoreGateway {
    pub fn new(config: &FirestoreConfig, id_token: Option<String>) -> Self {
        Self {
            client: Arc::new(create_http_client(Duration::from_secs(config.timeout_secs))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            id_token,
        }
    }

    /// Resource name prefix, as used inside commit bodies
    fn database_path(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database)
    }

    fn documents_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database_path())
    }

    fn relative_doc_path(user_id: &str, collection: &str, doc_id: &str) -> String {
        format!(
            "users/{}/{}/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(collection),
            urlencoding::encode(doc_id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response, allow_not_found: bool) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() || (allow_not_found && status == StatusCode::NOT_FOUND) {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::status(status, body))
    }

    async fn run_ordered_query(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError> {
        check_segment(user_id)?;
        check_segment(collection)?;
        let url = format!("{}/users/{}:runQuery", self.documents_url(), urlencoding::encode(user_id));

        let response = self
            .authorize(self.client.post(&url))
            .json(&value::ordered_query(collection))
            .send()
            .await?;
        let response = Self::check(response, false).await?;

        let body = response.text().await?;
        let items: Vec<RunQueryResponseItem> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Protocol(format!("runQuery response is not a result list: {}", e)))?;
        let mut documents: Vec<StoredDocument> = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(value::decode_document)
            .collect();
        // The server already orders by timestamp; re-sorting only settles ties
        sort_by_timestamp_desc(&mut documents);
        Ok(documents)
    }

    /// One `:commit` call deleting every named document atomically.
    async fn commit_deletes(&self, names: &[String]) -> Result<(), GatewayError> {
        let url = format!("{}:commit", self.documents_url());
        let writes: Vec<serde_json::Value> = names.iter().map(|name| json!({ "delete": name })).collect();
        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({ "writes": writes }))
            .send()
            .await?;
        Self::check(response, false).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionGateway for FirestoreGateway {
    fn backend_name(&self) -> &str {
        "firestore"
    }

    async fn get_all(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError> {
        let documents = self.run_ordered_query(user_id, collection).await?;
        debug!("Fetched {} documents from users/{}/{}", documents.len(), user_id, collection);
        Ok(documents)
    }

    async fn upsert(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        document: &RemoteDocument,
    ) -> Result<(), GatewayError> {
        check_segment(user_id)?;
        check_segment(collection)?;
        check_segment(doc_id)?;
        let url = format!(
            "{}/{}",
            self.documents_url(),
            Self::relative_doc_path(user_id, collection, doc_id)
        );
        let mask: Vec<(&str, &str)> = DOCUMENT_FIELDS
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();

        let response = self
            .authorize(self.client.patch(&url))
            .query(&mask)
            .json(&value::encode_fields(document))
            .send()
            .await?;
        Self::check(response, false).await?;
        debug!("Upserted users/{}/{}/{}", user_id, collection, doc_id);
        Ok(())
    }

    async fn delete(&self, user_id: &str, collection: &str, doc_id: &str) -> Result<(), GatewayError> {
        check_segment(user_id)?;
        check_segment(collection)?;
        check_segment(doc_id)?;
        let url = format!(
            "{}/{}",
            self.documents_url(),
            Self::relative_doc_path(user_id, collection, doc_id)
        );

        let response = self.authorize(self.client.delete(&url)).send().await?;
        Self::check(response, true).await?;
        debug!("Deleted users/{}/{}/{}", user_id, collection, doc_id);
        Ok(())
    }

    async fn delete_all(&self, user_id: &str, collection: &str) -> Result<usize, GatewayError> {
        let documents = self.run_ordered_query(user_id, collection).await?;
        if documents.is_empty() {
            return Ok(0);
        }

        let names: Vec<String> = documents
            .iter()
            .map(|doc| format!("{}/users/{}/{}/{}", self.database_path(), user_id, collection, doc.id))
            .collect();
        // Collections past the per-commit write limit are committed in chunks.
        // Chunks already committed stay deleted if a later one fails.
        let mut removed = 0;
        for chunk in names.chunks(MAX_BATCH_WRITES) {
            if let Err(e) = self.commit_deletes(chunk).await {
                if removed == 0 {
                    return Err(e);
                }
                warn!(
                    "Batch delete of users/{}/{} failed after {} of {} documents: {}",
                    user_id,
                    collection,
                    removed,
                    names.len(),
                    e
                );
                return Err(GatewayError::PartialDelete {
                    removed,
                    source: Box::new(e),
                });
            }
            removed += chunk.len();
        }

        info!("Deleted {} documents from users/{}/{}", removed, user_id, collection);
        Ok(removed)
    }
}
