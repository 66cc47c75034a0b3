use async_trait::async_trait;
use media_shelf_models::RemoteDocument;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::GatewayError;
use crate::traits::{sort_by_timestamp_desc, CollectionGateway, StoredDocument};

type CollectionKey = (String, String);

/// Process-local gateway. Backs the `memory` backend and stands in for the
/// remote store in tests: it counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    collections: RwLock<HashMap<CollectionKey, HashMap<String, RemoteDocument>>>,
    calls: AtomicUsize,
    pending_failures: AtomicUsize,
    offline: AtomicBool,
    yield_on_call: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls made so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` trait calls fail with `Unavailable`.
    pub fn fail_next(&self, n: usize) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    /// While offline every trait call fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Yield to the scheduler at the start of every trait call, so that
    /// concurrent callers interleave the way they would over a network.
    pub fn set_yield_on_call(&self, enabled: bool) {
        self.yield_on_call.store(enabled, Ordering::SeqCst);
    }

    /// Write a document directly, bypassing call counting.
    pub async fn seed(&self, user_id: &str, collection: &str, doc_id: &str, document: RemoteDocument) {
        let mut collections = self.collections.write().await;
        collections
            .entry((user_id.to_string(), collection.to_string()))
            .or_default()
            .insert(doc_id.to_string(), document);
    }

    /// Stored documents without counting a call, newest first.
    pub async fn documents(&self, user_id: &str, collection: &str) -> Vec<StoredDocument> {
        let collections = self.collections.read().await;
        let mut documents: Vec<StoredDocument> = collections
            .get(&(user_id.to_string(), collection.to_string()))
            .map(|docs| {
                docs.iter()
                    .map(|(id, document)| StoredDocument {
                        id: id.clone(),
                        document: document.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        sort_by_timestamp_desc(&mut documents);
        documents
    }

    pub async fn document(&self, user_id: &str, collection: &str, doc_id: &str) -> Option<RemoteDocument> {
        let collections = self.collections.read().await;
        collections
            .get(&(user_id.to_string(), collection.to_string()))
            .and_then(|docs| docs.get(doc_id))
            .cloned()
    }

    async fn begin_call(&self, op: &str) -> Result<(), GatewayError> {
        if self.yield_on_call.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!("{}: memory gateway is offline", op)));
        }
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(GatewayError::Unavailable(format!("{}: injected failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionGateway for MemoryGateway {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn get_all(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError> {
        self.begin_call("get_all").await?;
        Ok(self.documents(user_id, collection).await)
    }

    async fn upsert(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        document: &RemoteDocument,
    ) -> Result<(), GatewayError> {
        self.begin_call("upsert").await?;
        // Documents always carry all three fields, so merging replaces them all.
        self.seed(user_id, collection, doc_id, document.clone()).await;
        debug!("memory gateway: upserted {}/{}/{}", user_id, collection, doc_id);
        Ok(())
    }

    async fn delete(&self, user_id: &str, collection: &str, doc_id: &str) -> Result<(), GatewayError> {
        self.begin_call("delete").await?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&(user_id.to_string(), collection.to_string())) {
            docs.remove(doc_id);
        }
        debug!("memory gateway: deleted {}/{}/{}", user_id, collection, doc_id);
        Ok(())
    }

    async fn delete_all(&self, user_id: &str, collection: &str) -> Result<usize, GatewayError> {
        self.begin_call("delete_all").await?;
        let mut collections = self.collections.write().await;
        let removed = collections
            .remove(&(user_id.to_string(), collection.to_string()))
            .map(|docs| docs.len())
            .unwrap_or(0);
        debug!("memory gateway: deleted {} documents from {}/{}", removed, user_id, collection);
        Ok(removed)
    }
}
