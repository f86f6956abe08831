use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::conf::Endpoint;
use crate::error::{GatewayError, Result};
use crate::models::document::JsonObject;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Payload of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as JSON `null`.
    Empty,
    Json(Value),
    /// Pre-encoded `_bulk` stream, sent verbatim.
    Ndjson(String),
}

impl RequestBody {
    fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            RequestBody::Empty => serde_json::to_vec(&Value::Null).map_err(GatewayError::Encode),
            RequestBody::Json(value) => serde_json::to_vec(&value).map_err(GatewayError::Encode),
            RequestBody::Ndjson(payload) => Ok(payload.into_bytes()),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<JsonObject>;
}

#[derive(Debug, Clone)]
pub struct EsClient {
    endpoint: Endpoint,
    http_client: Client,
}

fn inject_auth(request_builder: RequestBuilder, endpoint: &Endpoint) -> RequestBuilder {
    if endpoint.has_basic_auth() {
        request_builder.basic_auth(endpoint.get_username(), endpoint.get_password())
    } else {
        request_builder
    }
}

impl EsClient {
    pub fn new(endpoint: Endpoint, http_client: Client) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }

    pub fn from_endpoint(endpoint: Endpoint) -> Result<Self> {
        let http_client = build_reqwest_client(
            endpoint.get_root_certificates().map(PathBuf::as_path),
            endpoint.is_insecure(),
        )?;
        Ok(Self::new(endpoint, http_client))
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

#[async_trait]
impl DocumentStore for EsClient {
    async fn request(&self, method: Method, path: &str, body: RequestBody) -> Result<JsonObject> {
        let payload = body.into_bytes()?;
        let url = self.endpoint.url_for(path);
        debug!("{} {} ({} bytes)", method, url, payload.len());

        let request_builder = self
            .http_client
            .request(method, url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload);
        let response = inject_auth(request_builder, &self.endpoint).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if is_error_status(status) {
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            match &body {
                Some(value) => error!("Error : {}", value),
                None => error!("Error : {}", String::from_utf8_lossy(&bytes)),
            }
            return Err(GatewayError::Backend { status, body });
        }

        let result: JsonObject = serde_json::from_slice(&bytes).map_err(GatewayError::Decode)?;
        let logged = Value::Object(result.clone());
        info!("Response : {}", logged);
        Ok(result)
    }
}

pub fn build_reqwest_client(ca_path: Option<&Path>, insecure: bool) -> Result<Client> {
    let mut builder = Client::builder();
    if insecure {
        warn!("TLS certificate verification is disabled for the backend connection.");
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(path) = ca_path {
        let certs = load_certificates(path)?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }
    builder.build().map_err(GatewayError::ClientBuild)
}

/// Reads every file in `path` as a PEM certificate. Files that cannot be read
/// or parsed are skipped with a warning.
fn load_certificates(path: &Path) -> Result<Vec<Certificate>> {
    let certificates_error = |reason: String| GatewayError::Certificates {
        path: path.display().to_string(),
        reason,
    };
    let mut certs = Vec::new();
    let entries = std::fs::read_dir(path).map_err(|e| certificates_error(e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| certificates_error(e.to_string()))?;
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        let content = match std::fs::read(&file_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping root certificate {:?}: {}", file_path, e);
                continue;
            }
        };
        match Certificate::from_pem(&content) {
            Ok(cert) => {
                debug!("Loaded root certificate {:?}", file_path);
                certs.push(cert);
            }
            Err(e) => warn!("Skipping root certificate {:?}: {}", file_path, e),
        }
    }
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EsClient {
        let endpoint = Endpoint::new(server.uri()).with_basic_auth("elastic", "changeme");
        EsClient::from_endpoint(endpoint).unwrap()
    }

    #[tokio::test]
    async fn sends_auth_content_type_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/_search"))
            .and(basic_auth("elastic", "changeme"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"query": {"match_all": {}}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"took": 1, "hits": {"hits": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .request(
                Method::GET,
                "/books/_search",
                RequestBody::Json(json!({"query": {"match_all": {}}})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("took"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn empty_body_is_sent_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/books"))
            .and(body_string("null"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .request(Method::DELETE, "/books", RequestBody::Empty)
            .await
            .unwrap();
        assert_eq!(result.get("acknowledged"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn ndjson_body_is_sent_verbatim() {
        let server = MockServer::start().await;
        let payload = "{\"index\":{\"_index\":\"books\",\"_id\":\"a\"}}\n{\"mongo_id\":\"a\"}\n";
        Mock::given(method("POST"))
            .and(path("/books/_bulk"))
            .and(body_string(payload))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"errors": false, "items": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .request(Method::POST, "/books/_bulk", RequestBody::Ndjson(payload.to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn not_found_is_reported_with_backend_body() {
        let server = MockServer::start().await;
        let error_body = json!({"error": {"type": "index_not_found_exception"}, "status": 404});
        Mock::given(method("GET"))
            .and(path("/missing/_search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(error_body.clone()))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request(Method::GET, "/missing/_search", RequestBody::Json(json!({})))
            .await
            .unwrap_err();
        match err {
            GatewayError::Backend { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, Some(error_body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_with_plain_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request(Method::PUT, "/books", RequestBody::Json(json!({"mappings": {}})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Backend { body: None, .. }));
        assert_eq!(err.to_string(), "HTTP error: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/books/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request(Method::GET, "/books/_search", RequestBody::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Endpoint::new(format!("http://127.0.0.1:{port}"));
        let client = EsClient::from_endpoint(endpoint).unwrap();
        let err = client
            .request(Method::GET, "/", RequestBody::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn missing_certificate_dir_is_reported() {
        let err = build_reqwest_client(Some(Path::new("/nonexistent/certs")), false).unwrap_err();
        assert!(matches!(err, GatewayError::Certificates { .. }));
    }

    #[test]
    fn subdirectories_are_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        assert!(load_certificates(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn non_certificate_files_do_not_abort_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README"), "not a certificate").unwrap();
        assert!(load_certificates(dir.path()).is_ok());
    }

    #[test]
    fn insecure_client_builds() {
        assert!(build_reqwest_client(None, true).is_ok());
    }

    #[test]
    fn any_status_from_400_up_is_an_error() {
        assert!(!is_error_status(StatusCode::OK));
        assert!(!is_error_status(StatusCode::PERMANENT_REDIRECT));
        assert!(is_error_status(StatusCode::BAD_REQUEST));
        assert!(is_error_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_error_status(StatusCode::from_u16(600).unwrap()));
        assert!(is_error_status(StatusCode::from_u16(999).unwrap()));
    }
}
