//! Direct editing of an on-disk `nbconfig` directory (`<dir>/<section>.json`).

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{dot_path, ConfigError, ConfigStore};

#[derive(Debug, Clone)]
/// Config store reading and writing one JSON file per section.
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_path(&self, section: &str) -> Result<PathBuf, ConfigError> {
        if section.is_empty()
            || section.starts_with('.')
            || section.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidSectionName(section.to_string()));
        }
        Ok(self.root.join(format!("{section}.json")))
    }

    async fn read_section(&self, section: &str) -> Result<Value, ConfigError> {
        let path = self.section_path(section)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Value::Object(Map::new()));
            }
            Err(error) => return Err(ConfigError::io(path, error)),
        };
        if raw.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        let value: Value = serde_json::from_str(&raw)?;
        if !value.is_object() {
            return Err(ConfigError::NotAnObject {
                section: section.to_string(),
            });
        }
        Ok(value)
    }

    async fn write_section(&self, section: &str, data: &Value) -> Result<(), ConfigError> {
        let path = self.section_path(section)?;
        let mut rendered = serde_json::to_string_pretty(data)?;
        rendered.push('\n');
        write_text_atomic(&path, &rendered).await
    }
}

/// Writes through a sibling temp file and a rename so readers never see partial JSON.
async fn write_text_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent_dir)
        .await
        .map_err(|error| ConfigError::io(parent_dir, error))?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let temp_path = parent_dir.join(format!(
        ".{}.tmp-{}-{stamp}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("section"),
        std::process::id(),
    ));
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|error| ConfigError::io(&temp_path, error))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|error| ConfigError::io(path, error))
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn load(&self, section: &str) -> Result<Value, ConfigError> {
        self.read_section(section).await
    }

    async fn update(&self, section: &str, delta: &Value) -> Result<Option<Value>, ConfigError> {
        let mut data = self.read_section(section).await?;
        dot_path::deep_merge(&mut data, delta.clone());
        self.write_section(section, &data).await?;
        tracing::debug!(section, path = %self.root.display(), "merged config section delta");
        Ok(Some(data))
    }

    async fn replace(&self, section: &str, data: &Value) -> Result<(), ConfigError> {
        if !data.is_object() {
            return Err(ConfigError::NotAnObject {
                section: section.to_string(),
            });
        }
        self.write_section(section, data).await
    }
}
