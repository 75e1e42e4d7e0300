//! HTTP client for the milibro backend.
//!
//! ```ignore
//! use milibro::client::{ClientSettings, MilibroClient};
//!
//! let client = MilibroClient::new(ClientSettings::new("https://milibro.example.com"))?;
//! let session = client.login("ana@example.com", "secret1").await?;
//! let (library, books) = client.load_shelf(&session.user.id, Shelf::Owned).await?;
//! ```

mod auth;
mod books;
mod library;
mod upload;

use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::Config,
    error::{Error, Result},
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub url:             String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub access_token:    Option<String>,
}

impl ClientSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url:             url.into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            access_token:    None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            url:             config.backend_url.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            access_token:    None,
        }
    }
}

/// Talks to the backend. Cloning is cheap and clones share the token.
#[derive(Debug, Clone)]
pub struct MilibroClient {
    http:  Client,
    url:   String,
    token: Arc<RwLock<Option<String>>>,
}

impl MilibroClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let url = settings.url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(Error::InvalidUrl("URL cannot be empty".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(format!("milibro/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url,
            token: Arc::new(RwLock::new(settings.access_token)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Use a token obtained earlier, e.g. restored from the session store.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// Fails fast with [Error::AuthRequired] when there is no token.
    pub(crate) async fn require_token(&self) -> Result<String> {
        self.token().await.ok_or(Error::AuthRequired)
    }

    /// Sends with the bearer token attached, requiring one.
    pub(crate) async fn send_authed(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.require_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    /// Sends with the bearer token attached if there is one.
    pub(crate) async fn send_optional_auth(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        Ok(request.send().await?)
    }
}

/// Maps non-success statuses onto [Error]. `resource` and `id` describe the
/// thing asked for, for a 404.
pub(crate) async fn check_status(
    response: Response,
    resource: &'static str,
    id: &str,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!(status = status.as_u16(), url = %response.url(), "request failed");
    match status.as_u16() {
        401 | 403 => Err(Error::AuthRequired),
        404 => Err(Error::NotFound {
            resource,
            id: id.to_string(),
        }),
        code => Err(Error::Server {
            status:  code,
            message: error_message(response).await,
        }),
    }
}

/// The `message` field of a JSON error body, or the raw body.
pub(crate) async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Object(map)) => match map.get("message") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|x| x.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => text,
        },
        _ => text,
    }
}

/// Decodes a JSON body, naming the offending field when it does not fit `T`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    let de = &mut serde_json::Deserializer::from_slice(&bytes);
    serde_path_to_error::deserialize(de)
        .map_err(|e| Error::Parse(format!("Failed to parse {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(MilibroClient::new(ClientSettings::new("https://example.com")).is_ok());
        assert!(MilibroClient::new(ClientSettings::new("http://192.168.10.60:3000")).is_ok());

        assert!(matches!(
            MilibroClient::new(ClientSettings::new("")),
            Err(Error::InvalidUrl(_))
        ));
        assert!(MilibroClient::new(ClientSettings::new("not-a-url")).is_err());
        assert!(MilibroClient::new(ClientSettings::new("ftp://example.com")).is_err());
    }

    #[test]
    fn url_normalization() {
        let client = MilibroClient::new(ClientSettings::new("https://example.com/")).unwrap();
        assert_eq!(client.url(), "https://example.com");
        assert_eq!(client.endpoint("/books"), "https://example.com/books");
    }

    #[tokio::test]
    async fn token_is_shared_between_clones() {
        let client = MilibroClient::new(ClientSettings::new("https://example.com")).unwrap();
        let other = client.clone();
        assert!(!other.is_authenticated().await);
        client.set_token(Some("jwt".into())).await;
        assert_eq!(other.token().await.as_deref(), Some("jwt"));
        assert!(matches!(
            MilibroClient::new(ClientSettings::new("https://example.com"))
                .unwrap()
                .require_token()
                .await,
            Err(Error::AuthRequired)
        ));
    }
}
