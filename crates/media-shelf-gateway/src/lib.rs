pub mod auth;
pub mod error;
pub mod factory;
pub mod file;
pub mod firestore;
pub mod memory;
pub mod traits;

pub use auth::{refresh_id_token, sign_in_with_password, AuthSession};
pub use error::GatewayError;
pub use factory::create_gateway;
pub use file::FileGateway;
pub use firestore::{create_http_client, FirestoreGateway};
pub use memory::MemoryGateway;
pub use traits::{CollectionGateway, StoredDocument, FAVORITES_COLLECTION, RECENTLY_WATCHED_COLLECTION};
