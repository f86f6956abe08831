use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};

pub const MONGO_ID_FIELD: &str = "mongo_id";

pub type JsonObject = Map<String, Value>;

/// A schemaless document, forwarded to the backend verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(JsonObject);

impl Document {
    /// Raw `mongo_id` value, whatever its type.
    pub fn raw_mongo_id(&self) -> Option<&Value> {
        self.0.get(MONGO_ID_FIELD)
    }

    pub fn mongo_id(&self) -> Result<&str> {
        self.raw_mongo_id()
            .and_then(Value::as_str)
            .ok_or(GatewayError::MissingDocumentId)
    }

    pub fn into_fields(self) -> JsonObject {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn mongo_id_present() {
        let document = doc(json!({"mongo_id": "abc123", "title": "x"}));
        assert_eq!(document.mongo_id().unwrap(), "abc123");
    }

    #[test]
    fn mongo_id_missing() {
        let document = doc(json!({"title": "x"}));
        assert!(matches!(document.mongo_id(), Err(GatewayError::MissingDocumentId)));
        assert!(document.raw_mongo_id().is_none());
    }

    #[test]
    fn mongo_id_wrong_type() {
        let document = doc(json!({"mongo_id": 42}));
        assert!(matches!(document.mongo_id(), Err(GatewayError::MissingDocumentId)));
        assert_eq!(document.raw_mongo_id(), Some(&json!(42)));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(serde_json::from_value::<Document>(json!([1, 2])).is_err());
    }
}
