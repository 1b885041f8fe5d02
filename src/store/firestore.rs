//! Cloud Firestore backend over the REST v1 API.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | upsert | `PATCH {base}/projects/{p}/databases/{d}/documents/{collection}/{id}` |
//! | append | `POST {base}/projects/{p}/databases/{d}/documents/{collection}` |
//!
//! A `PATCH` without an update mask replaces the whole document and creates
//! it when absent, which is exactly create-or-replace.
//!
//! # Authentication
//!
//! Production requests carry a bearer token from a service-account key (see
//! [`credentials`](super::credentials)). When an emulator host is configured
//! (`[store].emulator_host` or `FIRESTORE_EMULATOR_HOST`), requests go to
//! `http://{host}/v1` with the emulator's `owner` token and no key is read.
//!
//! # Value Encoding
//!
//! JSON values map to Firestore typed values:
//!
//! | JSON | Firestore |
//! |------|-----------|
//! | `null` | `nullValue` |
//! | bool | `booleanValue` |
//! | integer | `integerValue` (decimal string) |
//! | float | `doubleValue` |
//! | string | `stringValue` |
//! | array | `arrayValue` |
//! | object | `mapValue` |

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::credentials::{ServiceAccountKey, TokenSource};
use super::DocumentStore;
use crate::config::StoreConfig;
use crate::doc_id::is_reserved;

const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com/v1";

enum Auth {
    Emulator,
    ServiceAccount(TokenSource),
}

/// A handle on one Firestore database.
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: String,
    database: String,
    auth: Auth,
}

impl FirestoreStore {
    /// Open a handle from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the credentials file cannot be read or parsed, if no project
    /// id is available, or if the HTTP client cannot be built.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        if let Some(host) = config.resolved_emulator_host() {
            let project_id = config.project_id.clone().ok_or_else(|| {
                anyhow!("store.project_id must be set when using the Firestore emulator")
            })?;
            let base_url = Url::parse(&format!("http://{}/v1", host.trim_end_matches('/')))
                .with_context(|| format!("Invalid emulator host: {}", host))?;
            log::info!("using Firestore emulator at {}", host);
            return Ok(Self::with_parts(
                client,
                base_url,
                project_id,
                config.database.clone(),
                Auth::Emulator,
            ));
        }

        let key = ServiceAccountKey::from_file(&config.credentials)?;
        let project_id = config
            .project_id
            .clone()
            .or_else(|| key.project_id.clone())
            .ok_or_else(|| {
                anyhow!("store.project_id is not set and the credentials file has no project_id")
            })?;
        let base_url = Url::parse(PRODUCTION_BASE_URL)?;

        Ok(Self::with_parts(
            client,
            base_url,
            project_id,
            config.database.clone(),
            Auth::ServiceAccount(TokenSource::new(key)),
        ))
    }

    fn with_parts(
        client: Client,
        base_url: Url,
        project_id: String,
        database: String,
        auth: Auth,
    ) -> Self {
        Self {
            client,
            base_url,
            project_id,
            database,
            auth,
        }
    }

    /// Resource URL of a collection, or of one document when `id` is given.
    ///
    /// Segments are percent-encoded; ids Firestore reserves are refused
    /// since `.` and `..` would silently drop out of the path.
    fn document_url(&self, collection: &str, id: Option<&str>) -> Result<Url> {
        if let Some(id) = id.filter(|id| id.is_empty() || is_reserved(id)) {
            bail!("Invalid document id '{}' in '{}'", id, collection);
        }
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Firestore base URL cannot hold a path"))?;
            segments.pop_if_empty().extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
                collection,
            ]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = match &self.auth {
            Auth::Emulator => "owner".to_string(),
            Auth::ServiceAccount(source) => source.token(&self.client).await?,
        };
        Ok(req.bearer_auth(token))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn describe(&self) -> String {
        let target = format!(
            "projects/{}/databases/{}",
            self.project_id, self.database
        );
        match self.auth {
            Auth::Emulator => format!("firestore emulator {}", target),
            Auth::ServiceAccount(_) => format!("firestore {}", target),
        }
    }

    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        let url = self.document_url(collection, Some(id))?;
        let body = json!({ "fields": encode_fields(document)? });
        let req = self.authorize(self.client.patch(url).json(&body)).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to write {}/{}", collection, id))?;
        check_status(resp, "upsert", collection).await?;
        Ok(())
    }

    async fn append(&self, collection: &str, document: &Value) -> Result<String> {
        let url = self.document_url(collection, None)?;
        let body = json!({ "fields": encode_fields(document)? });
        let req = self.authorize(self.client.post(url).json(&body)).await?;
        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to add document to {}", collection))?;
        let resp = check_status(resp, "append", collection).await?;

        let created: Value = resp.json().await.context("Invalid Firestore response")?;
        created
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| name.rsplit('/').next())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Firestore response has no document name"))
    }

    async fn close(&self) -> Result<()> {
        log::debug!("closing {}", self.describe());
        Ok(())
    }
}

async fn check_status(resp: Response, op: &str, collection: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    bail!(
        "Firestore {} in '{}' failed (HTTP {}): {}",
        op,
        collection,
        status,
        body.chars().take(500).collect::<String>()
    );
}

/// Encode a JSON object as a Firestore `fields` map.
pub fn encode_fields(document: &Value) -> Result<Map<String, Value>> {
    let Value::Object(map) = document else {
        bail!("Firestore documents must be JSON objects");
    };
    Ok(map
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect())
}

/// Encode one JSON value as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({
            "mapValue": { "fields": encode_fields(value).unwrap_or_default() }
        }),
    }
}
