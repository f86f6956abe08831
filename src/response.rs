use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::GatewayError;
use crate::models::document::JsonObject;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub code: u16,
    pub description: String,
    /// Backend error body, present when the backend rejected the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Envelope {
    pub fn success(data: JsonObject) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn internal_error(err: &GatewayError) -> Self {
        let details = match err {
            GatewayError::Backend { body, .. } => body.clone(),
            _ => None,
        };
        Self {
            status: STATUS_ERROR.to_string(),
            data: None,
            error: Some(ErrorInfo {
                code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                description: err.to_string(),
                details,
            }),
        }
    }
}

/// Successful handler result: status code plus the backend object.
pub struct ApiResponse {
    status: StatusCode,
    data: JsonObject,
}

impl ApiResponse {
    pub fn created(data: JsonObject) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }

    pub fn ok(data: JsonObject) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::success(self.data))).into_response()
    }
}

// Every failure maps to 500 with the error envelope.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        warn!("Request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::internal_error(&self)),
        )
            .into_response()
    }
}
