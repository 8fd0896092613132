//! Command line front end for value-mapping fault localization
//!
//! Provides argument parsing, the project manifest and the `rewrite`,
//! `localize` and `inspect` commands used by the `ivmp` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod manifest;

pub use cli::{Cli, Command};
pub use commands::{inspect, localize, rewrite, LocalizeOptions, ModuleSummary};
pub use error::{CliError, CliResult};
pub use manifest::{Manifest, ModuleEntry, Role, DEFAULT_STEP_LIMIT};
