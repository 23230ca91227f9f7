//! Config-section documents and the stores that persist them.
//!
//! Provides the dot-path accessor used to read and edit nested parameters,
//! the in-memory `ConfigSection`/`SectionSet` cache, and the `ConfigStore`
//! backends (notebook-server HTTP API and on-disk `nbconfig` directory).

pub mod dot_path;
pub mod error;
pub mod file_store;
pub mod http_store;
pub mod section;
pub mod store;

pub use dot_path::{apply_update, build_delta, deep_merge, exists, get, remove_keys};
pub use error::ConfigError;
pub use file_store::FileConfigStore;
pub use http_store::HttpConfigStore;
pub use section::{ConfigSection, SectionLoadWarning, SectionSet, DEFAULT_SECTION_NAMES};
pub use store::ConfigStore;
