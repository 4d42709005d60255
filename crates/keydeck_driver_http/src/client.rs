use crate::markup;
use async_trait::async_trait;
use keydeck_core::{
    ConsoleBackend, ConsoleConfig, ConsoleError, KeyDetail, KeyWriteRequest, ListingEntry,
    RawKeyDetail, RawListing, ServerStats,
};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Deserialize)]
struct ConnectionResponse {
    #[serde(default)]
    connected: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default = "assume_connected")]
    connected: bool,
    #[serde(default)]
    keys: Vec<ListingEntry>,
}

fn assume_connected() -> bool {
    true
}

/// [`ConsoleBackend`] over the admin service's HTTP endpoints.
///
/// Write endpoints answer with a redirect, which is inspected rather than
/// followed. The key listing comes from `/api/keys` when the service has it
/// and is otherwise scraped from the index page's key table.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    keys_endpoint_missing: AtomicBool,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ConsoleError::request_failed(format!("HTTP client setup: {}", e)))?;

        Self::with_client(config, client)
    }

    /// Use a caller-built client. It must not follow redirects, or write
    /// rejections cannot be told apart from successes.
    pub fn with_client(
        config: &ConsoleConfig,
        client: reqwest::Client,
    ) -> Result<Self, ConsoleError> {
        config.validate()?;

        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            client,
            keys_endpoint_missing: AtomicBool::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ConsoleError> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConsoleError::request_failed(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let response = self.get(path).await?;
        read_json(path, response).await
    }

    /// Outer `None` when the service has no `/api/keys` endpoint, inner
    /// `None` when it has one but no store connection.
    async fn api_listing(&self) -> Result<Option<Option<RawListing>>, ConsoleError> {
        let path = "/api/keys";
        let response = self.get(path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let listing: ListingResponse = read_json(path, response).await?;
        if !listing.connected {
            log::warn!("{} has no store connection", self.base_url);
            return Ok(Some(None));
        }
        Ok(Some(Some(RawListing::Payload(listing.keys))))
    }

    async fn scraped_listing(&self) -> Result<Option<RawListing>, ConsoleError> {
        let path = "/";
        let response = self.get(path).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::request_failed(format!("GET {}: HTTP {}", path, status)));
        }

        let page = response
            .text()
            .await
            .map_err(|e| ConsoleError::invalid_response(format!("GET {}: {}", path, e)))?;

        let rows = markup::key_rows(&page)?;
        if rows.is_none() {
            log::warn!("{} served no key table", self.base_url);
        }
        Ok(rows.map(RawListing::Markup))
    }

    async fn post_write(
        &self,
        path: &str,
        form: Option<&[(&'static str, String)]>,
    ) -> Result<(), ConsoleError> {
        let url = self.url(path);
        log::debug!("POST {}", url);

        let mut request = self.client.post(&url);
        if let Some(fields) = form {
            request = request.form(fields);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConsoleError::request_failed(e.to_string()))?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());

        interpret_write_response(response.status(), location)
    }
}

async fn read_json<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, ConsoleError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ConsoleError::request_failed(format!("GET {}: HTTP {}", path, status)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ConsoleError::invalid_response(format!("GET {}: {}", path, e)))
}

/// Outcome of a write endpoint call: an `error=` parameter in the redirect
/// target is a rejected write, any other 2xx/3xx is success.
pub fn interpret_write_response(
    status: StatusCode,
    location: Option<&str>,
) -> Result<(), ConsoleError> {
    if status.is_client_error() || status.is_server_error() {
        return Err(ConsoleError::request_failed(format!("HTTP {}", status)));
    }

    if let Some(message) = location.and_then(redirect_error) {
        return Err(ConsoleError::write_rejected(message));
    }

    Ok(())
}

fn redirect_error(location: &str) -> Option<String> {
    let query = location.split_once('?')?.1;
    let raw = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("error="))?;

    let spaced = raw.replace('+', " ");
    let message = urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced);

    if message.is_empty() {
        Some("unknown error".to_string())
    } else {
        Some(message)
    }
}

#[async_trait]
impl ConsoleBackend for HttpBackend {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn stats(&self) -> Result<ServerStats, ConsoleError> {
        self.get_json("/api/stats").await
    }

    async fn test_connection(&self) -> Result<bool, ConsoleError> {
        let response: ConnectionResponse = self.get_json("/api/test-connection").await?;
        Ok(response.connected)
    }

    async fn search(&self, pattern: &str) -> Result<Vec<String>, ConsoleError> {
        let path = format!("/api/search?pattern={}", urlencoding::encode(pattern));
        let response: SearchResponse = self.get_json(&path).await?;
        Ok(response.keys)
    }

    async fn list_keys(&self) -> Result<Option<RawListing>, ConsoleError> {
        if !self.keys_endpoint_missing.load(Ordering::Relaxed) {
            if let Some(listing) = self.api_listing().await? {
                return Ok(listing);
            }

            log::info!(
                "{} has no /api/keys, reading the key table from the index page",
                self.base_url
            );
            self.keys_endpoint_missing.store(true, Ordering::Relaxed);
        }

        self.scraped_listing().await
    }

    async fn key_detail(&self, key: &str) -> Result<KeyDetail, ConsoleError> {
        let path = format!("/key/{}", urlencoding::encode(key));
        let response = self.get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ConsoleError::not_found(key));
        }

        let raw: RawKeyDetail = read_json(&path, response).await?;
        KeyDetail::try_from(raw)
    }

    async fn delete_key(&self, key: &str) -> Result<(), ConsoleError> {
        let path = format!("/delete/{}", urlencoding::encode(key));
        self.post_write(&path, None).await
    }

    async fn set_key(&self, request: &KeyWriteRequest) -> Result<(), ConsoleError> {
        let fields = request.form_fields();
        self.post_write("/set/", Some(fields.as_slice())).await
    }

    async fn flush(&self) -> Result<(), ConsoleError> {
        self.post_write("/flush/", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_redirect_is_success() {
        assert!(interpret_write_response(StatusCode::SEE_OTHER, Some("/")).is_ok());
        assert!(interpret_write_response(StatusCode::OK, None).is_ok());
    }

    #[test]
    fn redirect_with_error_is_rejected() {
        let result = interpret_write_response(
            StatusCode::SEE_OTHER,
            Some("/?error=WRONGTYPE%20Operation%20against%20a%20key"),
        );
        match result {
            Err(ConsoleError::WriteRejected(message)) => {
                assert_eq!(message, "WRONGTYPE Operation against a key");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn plus_signs_decode_as_spaces() {
        assert_eq!(
            redirect_error("/?tab=1&error=Key+not+found"),
            Some("Key not found".to_string())
        );
        assert_eq!(redirect_error("/?tab=1"), None);
        assert_eq!(redirect_error("/"), None);
    }

    #[test]
    fn error_statuses_fail() {
        assert!(matches!(
            interpret_write_response(StatusCode::INTERNAL_SERVER_ERROR, None),
            Err(ConsoleError::RequestFailed(_))
        ));
        assert!(matches!(
            interpret_write_response(StatusCode::NOT_FOUND, Some("/")),
            Err(ConsoleError::RequestFailed(_))
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        let config = ConsoleConfig::default().with_base_url("http://localhost:8000/");
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/api/stats"), "http://localhost:8000/api/stats");
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ConsoleConfig::default().with_base_url("ftp://example");
        assert!(matches!(
            HttpBackend::new(&config),
            Err(ConsoleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn listing_response_defaults_to_connected() {
        let parsed: ListingResponse =
            serde_json::from_str(r#"{"keys": [{"key": "a", "type": "string", "size": 3}]}"#)
                .unwrap();
        assert!(parsed.connected);
        assert_eq!(parsed.keys.len(), 1);
    }
}
