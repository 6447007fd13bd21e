//! # faccao-cli - Command-Line Interface
//!
//! Offline tooling over the same crates the API service uses.
//!
//! ## Subcommands
//!
//! - `cnpj` - document validation and check-digit computation
//! - `order` - transition-policy inspection and the lifecycle table
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers write to a caller-supplied writer and return an exit code.

pub mod cnpj;
pub mod order;
pub mod output;
