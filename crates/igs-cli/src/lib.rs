//! # igs-cli: Identity Governance Schema Command-Line Interface
//!
//! Operator tool over `igs-schema`. It loads a configured module set and
//! checks it, prints closed types, or binds payload documents.
//!
//! ## Subcommands
//!
//! - `check`: Load and link every configured module, report a summary
//! - `resolve`: Print the closed property list of a type or element
//! - `bind`: Unmarshal and validate a JSON payload
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `igs-schema` and write to a caller
//!   supplied writer so they can be tested without a terminal.

pub mod bind;
pub mod check;
pub mod resolve;
pub mod settings;
