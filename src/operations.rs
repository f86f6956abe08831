use reqwest::Method;
use serde_json::{json, Value};

use crate::error::Result;
use crate::es_client::{DocumentStore, EsClient, RequestBody};
use crate::models::bulk::encode_bulk;
use crate::models::document::{Document, JsonObject};

/// The gateway operations, each mapped onto one backend call.
#[derive(Debug, Clone)]
pub struct Elasticsearch<S = EsClient> {
    store: S,
}

impl<S: DocumentStore> Elasticsearch<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create_index(&self, index: &str, mappings: Value) -> Result<JsonObject> {
        self.store
            .request(
                Method::PUT,
                &format!("/{}", index),
                RequestBody::Json(json!({ "mappings": mappings })),
            )
            .await
    }

    pub async fn insert_many(&self, index: &str, docs: &[Document]) -> Result<JsonObject> {
        let payload = encode_bulk(index, docs)?;
        self.store
            .request(
                Method::POST,
                &format!("/{}/_bulk", index),
                RequestBody::Ndjson(payload),
            )
            .await
    }

    /// Indexes `doc` under its own `mongo_id`.
    pub async fn insert_one(&self, index: &str, doc: Document) -> Result<JsonObject> {
        let path = format!("/{}/_doc/{}", index, doc.mongo_id()?);
        self.store
            .request(
                Method::POST,
                &path,
                RequestBody::Json(Value::Object(doc.into_fields())),
            )
            .await
    }

    pub async fn search(&self, index: &str, query: JsonObject) -> Result<JsonObject> {
        self.store
            .request(
                Method::GET,
                &format!("/{}/_search", index),
                RequestBody::Json(Value::Object(query)),
            )
            .await
    }

    pub async fn update_one(
        &self,
        index: &str,
        doc_id: &str,
        body: JsonObject,
    ) -> Result<JsonObject> {
        self.store
            .request(
                Method::PUT,
                &format!("/{}/_update/{}", index, doc_id),
                RequestBody::Json(Value::Object(body)),
            )
            .await
    }

    pub async fn delete_one(&self, index: &str, doc_id: &str) -> Result<JsonObject> {
        self.store
            .request(
                Method::DELETE,
                &format!("/{}/_doc/{}", index, doc_id),
                RequestBody::Empty,
            )
            .await
    }

    pub async fn delete_index(&self, index: &str) -> Result<JsonObject> {
        self.store
            .request(Method::DELETE, &format!("/{}", index), RequestBody::Empty)
            .await
    }
}
