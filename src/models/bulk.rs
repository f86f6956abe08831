use serde::Serialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::models::document::Document;

#[derive(Debug, Serialize)]
struct BulkAction<'a> {
    index: BulkActionMeta<'a>,
}

#[derive(Debug, Serialize)]
struct BulkActionMeta<'a> {
    #[serde(rename = "_index")]
    index_name: &'a str,
    /// `null` lets the backend generate an id.
    #[serde(rename = "_id")]
    id: Option<&'a Value>,
}

/// Builds the `_bulk` NDJSON body: one action line and one source line per
/// document, in input order, with a trailing newline.
pub fn encode_bulk(index_name: &str, docs: &[Document]) -> Result<String> {
    let mut lines: Vec<String> = Vec::with_capacity(docs.len() * 2);
    for doc in docs {
        let action = BulkAction {
            index: BulkActionMeta {
                index_name,
                id: doc.raw_mongo_id(),
            },
        };
        lines.push(serde_json::to_string(&action).map_err(GatewayError::Encode)?);
        lines.push(serde_json::to_string(doc).map_err(GatewayError::Encode)?);
    }

    let mut payload = lines.join("\n");
    payload.push('\n');
    Ok(payload)
}
