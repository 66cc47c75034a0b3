pub mod config;
pub mod paths;
pub mod session_file;

pub use config::{CollectionNames, Config, FirestoreConfig, GatewayBackend, GatewayConfig, IdentityConfig, LoggingConfig};
pub use paths::{container_base_path, PathManager};
pub use session_file::SessionFile;
