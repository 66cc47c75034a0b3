//! Builds the configured gateway backend.

use anyhow::{anyhow, Result};
use media_shelf_config::{Config, GatewayBackend, PathManager, SessionFile};
use std::sync::Arc;
use tracing::info;

use crate::{CollectionGateway, FileGateway, FirestoreGateway, MemoryGateway};

pub fn create_gateway(
    config: &Config,
    paths: &PathManager,
    session: &SessionFile,
) -> Result<Arc<dyn CollectionGateway>> {
    let gateway: Arc<dyn CollectionGateway> = match config.gateway.backend {
        GatewayBackend::Memory => Arc::new(MemoryGateway::new()),
        GatewayBackend::File => {
            let root = config
                .gateway
                .data_dir
                .clone()
                .unwrap_or_else(|| paths.collections_dir());
            Arc::new(FileGateway::new(root))
        }
        GatewayBackend::Firestore => {
            let firestore = config
                .gateway
                .firestore
                .as_ref()
                .ok_or_else(|| anyhow!("Firestore backend selected but [gateway.firestore] is missing"))?;
            Arc::new(FirestoreGateway::new(firestore, session.get_id_token().cloned()))
        }
    };
    info!("Using {} collection gateway", gateway.backend_name());
    Ok(gateway)
}
