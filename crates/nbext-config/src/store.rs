use async_trait::async_trait;
use serde_json::Value;

use crate::ConfigError;

#[async_trait]
/// Trait contract for loading and persisting named JSON config sections.
pub trait ConfigStore: Send + Sync {
    /// Short human-readable location used in logs and reports.
    fn describe(&self) -> String;

    /// Fetches the full document for `section`; absent sections are `{}`.
    async fn load(&self, section: &str) -> Result<Value, ConfigError>;

    /// Deep-merges `delta` into the stored document.
    ///
    /// Returns the merged document when the backend reports it.
    async fn update(&self, section: &str, delta: &Value) -> Result<Option<Value>, ConfigError>;

    /// Replaces the stored document with `data`.
    async fn replace(&self, section: &str, data: &Value) -> Result<(), ConfigError>;
}
