use futures_util::future::join_all;
use serde_json::{Map, Value};

use crate::{dot_path, ConfigError, ConfigStore};

/// Section names the configurator always tracks.
pub const DEFAULT_SECTION_NAMES: [&str; 4] = ["notebook", "edit", "tree", "common"];

const LOAD_EXTENSIONS_KEY: &str = "load_extensions";

#[derive(Debug, Clone, PartialEq)]
/// Public struct `ConfigSection` holding the cached document of one named section.
pub struct ConfigSection {
    name: String,
    data: Value,
    load_error: Option<String>,
}

impl ConfigSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_data(name, Value::Object(Map::new()))
    }

    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            load_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Error text from the most recent failed load, if any.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn exists(&self, path: &str) -> bool {
        dot_path::exists(&self.data, path)
    }

    pub fn get(&self, path: &str) -> Result<&Value, ConfigError> {
        dot_path::get(&self.data, path)
    }

    /// The `load_extensions` map (require path to enable flag), if present.
    pub fn load_extensions(&self) -> Option<&Map<String, Value>> {
        self.data.get(LOAD_EXTENSIONS_KEY).and_then(Value::as_object)
    }

    pub(crate) fn set_loaded(&mut self, data: Value) {
        self.data = data;
        self.load_error = None;
    }

    pub(crate) fn set_failed(&mut self, reason: String) {
        self.data = Value::Object(Map::new());
        self.load_error = Some(reason);
    }

    #[tracing::instrument(name = "nbext_config.section.load", skip(self, store), fields(section = %self.name))]
    pub async fn load(&mut self, store: &dyn ConfigStore) -> Result<(), ConfigError> {
        match store.load(&self.name).await {
            Ok(data) => {
                self.set_loaded(data);
                Ok(())
            }
            Err(error) => {
                let reason = error.to_string();
                self.set_failed(reason.clone());
                Err(ConfigError::ConfigLoad {
                    section: self.name.clone(),
                    reason,
                })
            }
        }
    }

    /// Sets `path` to `value` locally, then persists the single-branch delta.
    #[tracing::instrument(name = "nbext_config.section.update", skip(self, store, value), fields(section = %self.name))]
    pub async fn update(
        &mut self,
        store: &dyn ConfigStore,
        path: &str,
        value: Value,
    ) -> Result<(), ConfigError> {
        dot_path::apply_update(&mut self.data, path, value.clone());
        let delta = dot_path::build_delta(path, value);
        self.persist_delta(store, &delta).await
    }

    /// Merges an arbitrary delta locally, then persists it.
    pub async fn update_delta(
        &mut self,
        store: &dyn ConfigStore,
        delta: Value,
    ) -> Result<(), ConfigError> {
        dot_path::deep_merge(&mut self.data, delta.clone());
        self.persist_delta(store, &delta).await
    }

    /// Reloads the stored document, removes `paths` from it and writes it back in full.
    #[tracing::instrument(name = "nbext_config.section.delete_keys", skip(self, store), fields(section = %self.name))]
    pub async fn delete_keys<S: AsRef<str> + std::fmt::Debug + Sync>(
        &mut self,
        store: &dyn ConfigStore,
        paths: &[S],
    ) -> Result<(), ConfigError> {
        let mut data = store.load(&self.name).await?;
        dot_path::remove_keys(&mut data, paths);
        store.replace(&self.name, &data).await?;
        self.set_loaded(data);
        Ok(())
    }

    async fn persist_delta(
        &mut self,
        store: &dyn ConfigStore,
        delta: &Value,
    ) -> Result<(), ConfigError> {
        if let Some(merged) = store.update(&self.name, delta).await? {
            self.data = merged;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `SectionLoadWarning` surfaced when one section fails to load.
pub struct SectionLoadWarning {
    pub section: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Ordered collection of the config sections known to the configurator.
pub struct SectionSet {
    sections: Vec<ConfigSection>,
}

impl SectionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(ConfigSection::new(name));
        }
        set
    }

    pub fn with_default_sections() -> Self {
        Self::new(DEFAULT_SECTION_NAMES)
    }

    /// Adds `section`, replacing any section of the same name in place.
    pub fn insert(&mut self, section: ConfigSection) {
        match self.get_mut(section.name()) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|section| section.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ConfigSection> {
        self.sections
            .iter_mut()
            .find(|section| section.name() == name)
    }

    pub fn require(&self, name: &str) -> Result<&ConfigSection, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownSection(name.to_string()))
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut ConfigSection, ConfigError> {
        self.get_mut(name)
            .ok_or_else(|| ConfigError::UnknownSection(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigSection> {
        self.sections.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.sections
            .iter()
            .map(|section| section.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Loads every section concurrently.
    ///
    /// A failed section is reset to `{}` and reported as a warning; the other
    /// sections still load.
    pub async fn load_all(&mut self, store: &dyn ConfigStore) -> Vec<SectionLoadWarning> {
        let names = self.names();
        let results = join_all(names.iter().map(|name| store.load(name))).await;

        let mut warnings = Vec::new();
        for (section, result) in self.sections.iter_mut().zip(results) {
            match result {
                Ok(data) => section.set_loaded(data),
                Err(error) => {
                    let message = format!("Failed to load config section \"{}\"", section.name());
                    tracing::warn!(
                        section = section.name(),
                        error = %error,
                        "config section load failed; treating as empty"
                    );
                    section.set_failed(error.to_string());
                    warnings.push(SectionLoadWarning {
                        section: section.name().to_string(),
                        message: format!("{message}: {error}"),
                    });
                }
            }
        }
        warnings
    }
}
