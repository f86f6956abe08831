//! In-memory `DocumentStore` used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::error::{GatewayError, Result};
use crate::es_client::{DocumentStore, RequestBody};
use crate::models::document::JsonObject;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

/// Records every request and answers `{"acknowledged": true}`, or fails with
/// a backend error when built with `failing_with`.
#[derive(Debug, Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<RecordedCall>>,
    fail_status: Option<u16>,
}

impl RecordingStore {
    pub fn failing_with(status: u16) -> Self {
        Self {
            calls: Mutex::default(),
            fail_status: Some(status),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<JsonObject> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });

        if let Some(code) = self.fail_status {
            return Err(GatewayError::Backend {
                status: StatusCode::from_u16(code).unwrap(),
                body: Some(json!({"error": "rejected", "status": code})),
            });
        }

        let mut result = JsonObject::new();
        result.insert("acknowledged".to_string(), Value::Bool(true));
        Ok(result)
    }
}
