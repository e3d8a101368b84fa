use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// MediaWiki action API entry point, e.g. `https://ru.wikipedia.org/w/api.php`.
    pub endpoint: String,
    /// Sent on every request; Wikimedia rejects anonymous agents.
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://ru.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("wiki_harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Shared handle to the remote action API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: Url,
    max_bytes: u64,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::ClientBuild, err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            max_bytes: settings.max_bytes,
        })
    }

    /// Issue one `format=json` query and decode the response body into `T`.
    ///
    /// MediaWiki reports request-level problems as a 200 response carrying an
    /// `error` object; those surface as [`FailureKind::Api`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .extend_pairs(params);

        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))?;
        if let Some(error) = value.get("error") {
            let code = error
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let info = error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(FetchError::new(FailureKind::Api { code }, info));
        }
        serde_json::from_value(value)
            .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
