//! GridLink client — library crate behind the `gridlink` binary.
//!
//! Re-exports the config and startup modules so the e2e test crate can
//! drive the same code paths the binary uses.

pub mod config;
pub mod startup;
