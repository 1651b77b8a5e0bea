//! Inventory-to-configuration synchronisation engine.
//!
//! Reads device records from a NetBox inventory and rewrites the matching
//! Ansible `host_vars` documents according to a declarative change
//! specification. Values are copied by dotted path or produced by named
//! transforms.
//!
//! The public API is organised into layers:
//!
//! - **[`path`]** and **[`document`]**: dotted-path access, structural
//!   equality and file I/O for nested documents
//! - **[`transforms`]**: the plugin registry and built-in transforms
//! - **[`engine`]**: applies a change specification to a target mapping
//! - **[`inventory`]** and **[`config`]**: the data service client and settings
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod path;
pub mod transforms;
