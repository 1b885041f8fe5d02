//! Service-account credentials and OAuth2 access tokens.
//!
//! A Google service-account key file is exchanged for a short-lived access
//! token with the JWT bearer grant:
//!
//! 1. Build claims `{iss, scope, aud, iat, exp}` for the key's `client_email`.
//! 2. Sign them with the key's RSA private key (RS256).
//! 3. `POST` the assertion to the key's `token_uri`.
//!
//! Tokens are cached and refreshed shortly before they expire.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

/// OAuth scope covering Firestore reads and writes.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account JSON key the loader needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid credentials file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let key: ServiceAccountKey =
            serde_json::from_str(content).context("Failed to parse service account key")?;
        if key.key_type != "service_account" {
            bail!(
                "Expected a service_account key, got type '{}'",
                key.key_type
            );
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

fn claims_at<'a>(key: &'a ServiceAccountKey, now: DateTime<Utc>) -> Claims<'a> {
    let iat = now.timestamp();
    Claims {
        iss: &key.client_email,
        scope: DATASTORE_SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
    }
}

/// Sign a token-request assertion for `key`.
pub fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("Service account private_key is not a valid RSA PEM key")?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let jwt = jsonwebtoken::encode(&header, &claims_at(key, now), &encoding_key)
        .context("Failed to sign token assertion")?;
    Ok(jwt)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Hands out bearer tokens for one service account, fetching on demand.
pub struct TokenSource {
    key: ServiceAccountKey,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, reusing the cached one while it is fresh.
    pub async fn token(&self, client: &reqwest::Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        log::debug!("requesting access token for {}", self.key.client_email);
        let assertion = sign_assertion(&self.key, now)?;
        let resp = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .with_context(|| format!("Token request to {} failed", self.key.token_uri))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Token exchange failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let parsed: TokenResponse = resp.json().await.context("Invalid token response")?;
        let token = AccessToken {
            value: parsed.access_token,
            expires_at: now + Duration::seconds(parsed.expires_in),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}
