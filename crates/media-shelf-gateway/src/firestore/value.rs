use media_shelf_models::RemoteDocument;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use crate::traits::StoredDocument;

/// Fields written on upsert; sent as `updateMask.fieldPaths` so that any
/// other field on an existing document survives.
pub const DOCUMENT_FIELDS: [&str; 3] = ["type", "data", "timestamp"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    /// int64 values travel as decimal strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
pub struct RunQueryResponseItem {
    #[serde(default)]
    pub document: Option<FirestoreDocument>,
}

pub fn encode_fields(document: &RemoteDocument) -> serde_json::Value {
    json!({
        "fields": {
            "type": { "stringValue": document.doc_type },
            "data": { "stringValue": document.data },
            "timestamp": { "integerValue": document.timestamp.to_string() },
        }
    })
}

/// Query body listing one subcollection of a user, newest first.
pub fn ordered_query(collection: &str) -> serde_json::Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "timestamp" },
                "direction": "DESCENDING",
            }],
        }
    })
}

/// Document id is the last segment of the resource name.
pub fn doc_id_from_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn string_field(fields: &HashMap<String, FirestoreValue>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.string_value.clone())
        .unwrap_or_default()
}

fn integer_field(fields: &HashMap<String, FirestoreValue>, key: &str) -> i64 {
    match fields.get(key) {
        Some(value) => {
            if let Some(raw) = &value.integer_value {
                return raw.parse().unwrap_or_else(|_| {
                    warn!("Non-numeric integerValue '{}' in field {}", raw, key);
                    0
                });
            }
            value.double_value.map(|d| d as i64).unwrap_or(0)
        }
        None => 0,
    }
}

/// Missing fields decode to empty values; the stores decide whether such a
/// document is usable.
pub fn decode_document(document: FirestoreDocument) -> StoredDocument {
    let id = doc_id_from_name(&document.name).to_string();
    StoredDocument {
        id,
        document: RemoteDocument {
            doc_type: string_field(&document.fields, "type"),
            data: string_field(&document.fields, "data"),
            timestamp: integer_field(&document.fields, "timestamp"),
        },
    }
}
