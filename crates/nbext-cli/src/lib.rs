//! CLI argument models and validation for the `nbext` configurator binary.
//!
//! Exposes the clap-backed `Cli` with its env-backed global flags and the
//! `CliCommand` subcommands dispatched by the runtime layer.

pub mod cli_args;
pub mod validation;

pub use cli_args::{Cli, CliCommand, CliStoreTarget};
pub use validation::*;
