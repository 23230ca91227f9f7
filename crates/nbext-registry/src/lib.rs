//! Extension descriptors, enable policy and registry merge for the nbextensions configurator.
//!
//! Combines declared extension descriptors with the `load_extensions` maps of
//! the config sections, decides how enable/disable intents are stored for a
//! given host version, and provides the filtering, discovery and report helpers
//! used by the command layer.

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod merge;
pub mod parameter;
pub mod policy;
pub mod readme;
pub mod report;
pub mod version;

pub use descriptor::{
    parse_extension_list, ExtensionDescriptor, ExtensionListing, InvalidListEntry, MergedExtension,
    ParameterSpec, Tag, TagCategory,
};
pub use discovery::{
    discover_descriptors, process_descriptor_spec, render_discovery_report, DiscoveredDescriptor,
    DiscoveryReport, InvalidDescriptorFile,
};
pub use error::RegistryError;
pub use filter::{
    hide_incompat_setting, ExtensionFilter, FilterDebouncer, FILTER_DEBOUNCE_WINDOW,
};
pub use merge::{merge_extensions, MergeDiagnostic, MergedExtensions};
pub use parameter::{initial_value, ParameterInput, ResolvedParameter};
pub use policy::{
    compute_store_value, load_extensions_delta, resolve_enabled, EnableTransition,
    EXPLICIT_FALSE_MIN_VERSION,
};
pub use readme::{
    absolutize_url, encode_uri_components, heading_anchor, join_relative_urls, resolve_readme,
    rewrite_markdown_links, ReadmeTarget, URI_COMPONENT,
};
pub use report::{render_extension_list_report, render_extension_show_report};
pub use version::{compatibility_token, is_compatible, version_compare};

#[cfg(test)]
mod tests;
