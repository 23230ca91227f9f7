//! Notebook-server `api/config` client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::Value;

use crate::{ConfigError, ConfigStore};

const USER_AGENT_VALUE: &str = "nbext-configurator";

#[derive(Clone)]
/// Config store backed by the notebook server's `{base}/api/config/{section}` endpoints.
pub struct HttpConfigStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpConfigStore {
    /// Builds a client for `base_url`; `token` is sent as `Authorization: token <token>`.
    ///
    /// No request timeout is configured: failures surface only as transport
    /// or HTTP status errors.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
            let value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| ConfigError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn section_url(&self, section: &str) -> String {
        format!("{}/api/config/{}", self.base_url, section)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<Value>, ConfigError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ConfigError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

fn validate_section_name(section: &str) -> Result<(), ConfigError> {
    if section.is_empty() || section.contains(['/', '\\', '?', '#']) {
        return Err(ConfigError::InvalidSectionName(section.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn load(&self, section: &str) -> Result<Value, ConfigError> {
        validate_section_name(section)?;
        let url = self.section_url(section);
        tracing::debug!(url = %url, "loading config section");
        let data = self.send(&url, self.http.get(&url)).await?;
        match data {
            None => Ok(Value::Object(Default::default())),
            Some(value) if value.is_object() => Ok(value),
            Some(_) => Err(ConfigError::NotAnObject {
                section: section.to_string(),
            }),
        }
    }

    async fn update(&self, section: &str, delta: &Value) -> Result<Option<Value>, ConfigError> {
        validate_section_name(section)?;
        let url = self.section_url(section);
        tracing::debug!(url = %url, "patching config section");
        let merged = self.send(&url, self.http.patch(&url).json(delta)).await?;
        Ok(merged.filter(Value::is_object))
    }

    async fn replace(&self, section: &str, data: &Value) -> Result<(), ConfigError> {
        validate_section_name(section)?;
        let url = self.section_url(section);
        tracing::debug!(url = %url, "replacing config section");
        // `.json` sets `Content-Type: application/json`.
        self.send(&url, self.http.put(&url).json(data)).await?;
        Ok(())
    }
}
