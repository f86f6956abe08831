use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, post, put};
use axum::Router;
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::conf::Config;
use crate::error::{GatewayError, Result};
use crate::es_client::{DocumentStore, EsClient};
use crate::models::document::{Document, JsonObject};
use crate::operations::Elasticsearch;
use crate::response::ApiResponse;

#[derive(Parser, Debug)]
#[command(name = "es-rest-gateway", version)]
struct ServerArgs {
    /// Optional TOML file; `ES_*` environment variables override it.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,
    #[arg(long)]
    insecure: bool,
    #[arg(long = "root-certificates", alias = "ca-path", value_name = "PATH")]
    root_certificates: Option<PathBuf>,
    #[arg(long)]
    log_json: bool,
}

type Gateway<S> = State<Arc<Elasticsearch<S>>>;

#[derive(Debug, Deserialize)]
struct DocIdQuery {
    #[serde(rename = "docId")]
    doc_id: Option<String>,
}

impl DocIdQuery {
    fn require(self) -> Result<String> {
        self.doc_id
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingQueryParameter("docId"))
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub async fn run() -> Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json);

    let config = Config::load(args.config.clone())?;
    info!("Config loaded ... {:?}", config);

    let mut endpoint = config.endpoint();
    if args.insecure {
        endpoint = endpoint.with_insecure(true);
    }
    if let Some(path) = &args.root_certificates {
        if !path.is_dir() {
            warn!(
                "--root-certificates {:?} is not a directory; HTTPS may fail.",
                path
            );
        }
        endpoint = endpoint.with_root_certificates(Some(path.clone()));
    }

    let client = EsClient::from_endpoint(endpoint)?;
    let app = router(Arc::new(Elasticsearch::new(client)));

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("Server listening on {}", &args.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router<S: DocumentStore + 'static>(es: Arc<Elasticsearch<S>>) -> Router {
    Router::new()
        .route("/api/create/{index}", post(create_index::<S>))
        .route("/api/insertMany/{index}", post(insert_many::<S>))
        .route("/api/insertOne/{index}", post(insert_one::<S>))
        .route("/api/search/{index}", post(search::<S>))
        .route("/api/update/{index}", put(update_one::<S>))
        .route("/api/delete/{index}", delete(delete_one::<S>))
        .route("/api/deleteIndex/{index}", delete(delete_index::<S>))
        .layer(middleware::from_fn(log_requests))
        .with_state(es)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!(
        "{} {} {} {:?}",
        response.status().as_u16(),
        method,
        path,
        start.elapsed()
    );
    response
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(GatewayError::InvalidBody)
}

async fn create_index<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<ApiResponse> {
    let mappings: Value = parse_body(&body)?;
    Ok(ApiResponse::created(es.create_index(&index, mappings).await?))
}

async fn insert_many<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<ApiResponse> {
    let docs: Vec<Document> = parse_body(&body)?;
    Ok(ApiResponse::created(es.insert_many(&index, &docs).await?))
}

async fn insert_one<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<ApiResponse> {
    let doc: Document = parse_body(&body)?;
    Ok(ApiResponse::created(es.insert_one(&index, doc).await?))
}

async fn search<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<ApiResponse> {
    let query: JsonObject = parse_body(&body)?;
    Ok(ApiResponse::ok(es.search(&index, query).await?))
}

async fn update_one<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    Query(query): Query<DocIdQuery>,
    body: Bytes,
) -> Result<ApiResponse> {
    let doc_id = query.require()?;
    let update: JsonObject = parse_body(&body)?;
    Ok(ApiResponse::ok(es.update_one(&index, &doc_id, update).await?))
}

async fn delete_one<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
    Query(query): Query<DocIdQuery>,
) -> Result<ApiResponse> {
    let doc_id = query.require()?;
    Ok(ApiResponse::ok(es.delete_one(&index, &doc_id).await?))
}

async fn delete_index<S: DocumentStore + 'static>(
    State(es): Gateway<S>,
    Path(index): Path<String>,
) -> Result<ApiResponse> {
    Ok(ApiResponse::ok(es.delete_index(&index).await?))
}
