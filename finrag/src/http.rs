//! Authenticated JSON client for OpenAI-compatible REST APIs.
//!
//! Shared by the embedding and answer providers; each wraps failures in its
//! own [`RagError`] variant.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::{RagError, Result};

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract `error.message` from an API error body, or fall back to the raw body.
fn api_error_detail(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body).map(|b| b.error.message).unwrap_or(body)
}

/// Read an API key from `var`, failing with [`RagError::ConfigError`] if unset.
pub(crate) fn api_key_from_env(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| RagError::ConfigError(format!("{var} environment variable not set")))
}

/// Bearer-authenticated client bound to one API base URL.
pub(crate) struct CompatClient {
    client: reqwest::Client,
    provider: &'static str,
    api_key: String,
    base_url: String,
}

impl CompatClient {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `api_key` is blank.
    pub(crate) fn new(provider: &'static str, api_key: String, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError(format!("{provider} API key must not be empty")));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            api_key,
            base_url: normalize_base_url(base_url),
        })
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    pub(crate) fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url);
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON reply.
    ///
    /// Failures are returned as plain messages for the caller to wrap.
    pub(crate) async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(provider = self.provider, %url, "sending request");

        let response =
            self.client.post(&url).bearer_auth(&self.api_key).json(body).send().await.map_err(
                |e| {
                    error!(provider = self.provider, error = %e, "request failed");
                    format!("request failed: {e}")
                },
            )?;

        let status = response.status();
        if !status.is_success() {
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            error!(provider = self.provider, %status, "API error");
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json::<R>().await.map_err(|e| {
            error!(provider = self.provider, error = %e, "failed to parse response");
            format!("failed to parse response: {e}")
        })
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
