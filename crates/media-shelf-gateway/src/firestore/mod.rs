pub mod client;
pub mod value;

pub use client::{create_http_client, FirestoreGateway};
