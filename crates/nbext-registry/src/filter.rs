//! Faceted filtering of the merged extension list.

use std::time::Duration;

use nbext_config::SectionSet;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{MergedExtension, RegistryError, Tag, TagCategory};

/// Quiet period after which a burst of filter edits is recomputed once.
pub const FILTER_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

const HIDE_INCOMPAT_KEY: &str = "nbext_hide_incompat";

/// Reads `common.nbext_hide_incompat`; incompatible entries are hidden unless it is `false`.
pub fn hide_incompat_setting(sections: &SectionSet) -> bool {
    sections
        .get("common")
        .and_then(|common| common.data().get(HIDE_INCOMPAT_KEY))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Active tags plus free text; an extension must satisfy every part.
pub struct ExtensionFilter {
    pub tags: Vec<Tag>,
    pub text: String,
}

impl ExtensionFilter {
    pub fn new(tags: Vec<Tag>, text: impl Into<String>) -> Self {
        Self {
            tags,
            text: text.into(),
        }
    }

    /// Parses `section:<name>` / `tag:<name>` into a filter tag.
    pub fn parse_tag(raw: &str) -> Result<Tag, RegistryError> {
        let (category, value) = raw
            .split_once(':')
            .ok_or_else(|| RegistryError::InvalidFilterTag(raw.to_string()))?;
        let category = TagCategory::parse(category)
            .ok_or_else(|| RegistryError::InvalidFilterTag(raw.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(RegistryError::InvalidFilterTag(raw.to_string()));
        }
        Ok(Tag::new(category, value))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.text.trim().is_empty()
    }

    pub fn matches(&self, extension: &MergedExtension) -> bool {
        let tags_match = self.tags.iter().all(|tag| match tag.category {
            TagCategory::Section => tag.value == extension.section,
            TagCategory::Tag => extension.tags.iter().any(|value| *value == tag.value),
        });
        tags_match
            && self
                .text
                .split_whitespace()
                .all(|word| extension.filter_txt.contains(&word.to_lowercase()))
    }

    /// Visible extensions in list order; incompatible ones drop out when `hide_incompat`.
    pub fn apply<'a>(
        &self,
        extensions: &'a [MergedExtension],
        hide_incompat: bool,
    ) -> Vec<&'a MergedExtension> {
        extensions
            .iter()
            .filter(|extension| !hide_incompat || extension.is_compatible)
            .filter(|extension| self.matches(extension))
            .collect()
    }
}

/// Coalesces rapid filter updates into one trailing value per quiet window.
pub struct FilterDebouncer<T> {
    receiver: mpsc::Receiver<T>,
    window: Duration,
}

impl<T> FilterDebouncer<T> {
    pub fn channel(window: Duration, capacity: usize) -> (mpsc::Sender<T>, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self { receiver, window })
    }

    /// Waits for the next burst and returns its last value once `window` passes
    /// without a newer one. Returns `None` after all senders are dropped.
    pub async fn next(&mut self) -> Option<T> {
        let mut latest = self.receiver.recv().await?;
        loop {
            match tokio::time::timeout(self.window, self.receiver.recv()).await {
                Ok(Some(value)) => latest = value,
                Ok(None) | Err(_) => return Some(latest),
            }
        }
    }
}
