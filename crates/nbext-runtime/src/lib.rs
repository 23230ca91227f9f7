//! Runtime layer for the nbextensions configurator.
//!
//! Owns the `Configurator` controller, the descriptor sources (notebook
//! server list endpoint or local yaml discovery), deep-link handling and the
//! command execution used by the `nbext` binary.

pub mod commands;
pub mod configurator;
pub mod deep_link;
pub mod server_client;
pub mod source;

pub use commands::{
    build_configurator, execute_configurator_command, execute_discover_command, run_cli,
    run_filter_lines, CommandContext,
};
pub use configurator::{Configurator, HIDE_INCOMPAT_KEY};
pub use deep_link::{deep_link_query, deep_link_require, focus_from_query, DEEP_LINK_PARAMETER};
pub use server_client::{NotebookServerClient, EXTENSION_LIST_PATH};
pub use source::{DirectoryExtensionSource, ExtensionSource, StaticExtensionSource};
