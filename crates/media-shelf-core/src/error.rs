use media_shelf_gateway::GatewayError;
use media_shelf_models::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("document {doc_id} could not be decoded: {source}")]
    Decode {
        doc_id: String,
        #[source]
        source: DecodeError,
    },
    #[error("failed to encode item: {0}")]
    Encode(#[from] serde_json::Error),
}
