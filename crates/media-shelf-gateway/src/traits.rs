use async_trait::async_trait;
use media_shelf_models::RemoteDocument;

use crate::error::GatewayError;

pub const FAVORITES_COLLECTION: &str = "favorites";
pub const RECENTLY_WATCHED_COLLECTION: &str = "recently_watched";

/// A document together with its id inside the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub document: RemoteDocument,
}

/// Per-user document collections (`users/{user_id}/{collection}/{doc_id}`).
///
/// Implementations never retry; whatever timeout the underlying client has is
/// the only one.
#[async_trait]
pub trait CollectionGateway: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Every document in the collection, newest `timestamp` first.
    async fn get_all(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError>;

    /// Create the document or update the fields carried by `document`,
    /// leaving any other stored fields alone.
    async fn upsert(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        document: &RemoteDocument,
    ) -> Result<(), GatewayError>;

    /// Hard delete. Deleting a document that does not exist succeeds.
    async fn delete(&self, user_id: &str, collection: &str, doc_id: &str) -> Result<(), GatewayError>;

    /// Fetch every document reference, then delete them in one batched
    /// commit. Returns how many documents were removed.
    async fn delete_all(&self, user_id: &str, collection: &str) -> Result<usize, GatewayError>;
}

/// Newest first, ties broken by id so listings are stable.
pub(crate) fn sort_by_timestamp_desc(documents: &mut [StoredDocument]) {
    documents.sort_by(|a, b| {
        b.document
            .timestamp
            .cmp(&a.document.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}
