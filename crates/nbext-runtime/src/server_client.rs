use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nbext_registry::{parse_extension_list, ExtensionListing};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, USER_AGENT};
use serde::Deserialize;

use crate::ExtensionSource;

/// Server route listing the yaml-declared nbextensions.
pub const EXTENSION_LIST_PATH: &str = "nbextensions/nbextensions_configurator/list";

const USER_AGENT_VALUE: &str = "nbext-configurator";

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[derive(Clone)]
/// Public struct `NotebookServerClient` for the non-config notebook server routes.
pub struct NotebookServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotebookServerClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("token {token}"))
                    .context("invalid notebook server token header")?,
            );
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to create notebook server client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_text(&self, url: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response from {url}"))?;
        if !status.is_success() {
            bail!(
                "notebook server returned status {} for {}: {}",
                status.as_u16(),
                url,
                truncate_for_error(&body, 512)
            );
        }
        Ok(body)
    }

    /// Reads the host version from `GET {base}/api`.
    #[tracing::instrument(name = "nbext_runtime.server.host_version", skip(self), fields(base_url = %self.base_url))]
    pub async fn host_version(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct ApiInfo {
            version: String,
        }
        let url = self.url("api");
        let body = self.get_text(&url, self.http.get(&url)).await?;
        let info: ApiInfo = serde_json::from_str(&body)
            .with_context(|| format!("unexpected version payload from {url}"))?;
        Ok(info.version)
    }

    /// Fetches the declared descriptors, bypassing any HTTP caches.
    ///
    /// Entries that do not parse are returned in `invalid` instead of failing the list.
    #[tracing::instrument(name = "nbext_runtime.server.extension_list", skip(self), fields(base_url = %self.base_url))]
    pub async fn extension_list(&self) -> Result<ExtensionListing> {
        let url = self.url(EXTENSION_LIST_PATH);
        let request = self.http.get(&url).header(CACHE_CONTROL, "no-cache");
        let body = self.get_text(&url, request).await?;
        let payload: serde_json::Value = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse nbextension list from {url}"))?;
        let listing = parse_extension_list(payload)
            .with_context(|| format!("unexpected nbextension list payload from {url}"))?;
        tracing::debug!(
            count = listing.descriptors.len(),
            invalid = listing.invalid.len(),
            "fetched nbextension list"
        );
        Ok(listing)
    }

    /// Fetches a text document such as a rendered readme's markdown source.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.get_text(url, self.http.get(url)).await
    }
}

#[async_trait]
impl ExtensionSource for NotebookServerClient {
    fn describe(&self) -> String {
        self.url(EXTENSION_LIST_PATH)
    }

    async fn list(&self) -> Result<ExtensionListing> {
        self.extension_list().await
    }
}
