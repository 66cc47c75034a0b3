use async_trait::async_trait;
use media_shelf_models::RemoteDocument;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{check_segment, GatewayError};
use crate::traits::{sort_by_timestamp_desc, CollectionGateway, StoredDocument};

/// Collections stored as JSON files: `<root>/<user_id>/<collection>.json`,
/// each holding a map from document id to document.
///
/// Writes go to a temp file that is renamed over the original. A file that no
/// longer parses is logged and treated as an empty collection.
#[derive(Debug)]
pub struct FileGateway {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, user_id: &str, collection: &str) -> Result<PathBuf, GatewayError> {
        check_segment(user_id)?;
        check_segment(collection)?;
        Ok(self.root.join(user_id).join(format!("{}.json", collection)))
    }

    async fn read_collection(&self, path: &Path) -> Result<BTreeMap<String, RemoteDocument>, GatewayError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Collection file {:?} does not exist yet", path);
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(documents) => Ok(documents),
            Err(e) => {
                warn!("Collection file {:?} is corrupted ({}), treating it as empty", path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_collection(&self, path: &Path, documents: &BTreeMap<String, RemoteDocument>) -> Result<(), GatewayError> {
        if documents.is_empty() {
            match tokio::fs::remove_file(path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(documents)?;
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionGateway for FileGateway {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn get_all(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError> {
        let path = self.collection_path(user_id, collection)?;
        let mut documents: Vec<StoredDocument> = self
            .read_collection(&path)
            .await?
            .into_iter()
            .map(|(id, document)| StoredDocument { id, document })
            .collect();
        sort_by_timestamp_desc(&mut documents);
        debug!("Read {} documents from {:?}", documents.len(), path);
        Ok(documents)
    }

    async fn upsert(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        document: &RemoteDocument,
    ) -> Result<(), GatewayError> {
        check_segment(doc_id)?;
        let path = self.collection_path(user_id, collection)?;
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_collection(&path).await?;
        documents.insert(doc_id.to_string(), document.clone());
        self.write_collection(&path, &documents).await
    }

    async fn delete(&self, user_id: &str, collection: &str, doc_id: &str) -> Result<(), GatewayError> {
        let path = self.collection_path(user_id, collection)?;
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_collection(&path).await?;
        if documents.remove(doc_id).is_some() {
            self.write_collection(&path, &documents).await?;
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: &str, collection: &str) -> Result<usize, GatewayError> {
        let path = self.collection_path(user_id, collection)?;
        let _guard = self.write_lock.lock().await;
        let documents = self.read_collection(&path).await?;
        let removed = documents.len();
        self.write_collection(&path, &BTreeMap::new()).await?;
        info!("Deleted {} documents from {:?}", removed, path);
        Ok(removed)
    }
}
