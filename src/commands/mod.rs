//! Command implementations for the CLI
//!
//! - serve: Start the HTTP server
//! - check: Validate configuration
//! - catalog: Import and display the price catalog
//! - estimate: One-off estimate from the terminal

pub mod catalog;
pub mod check;
pub mod estimate;
pub mod serve;
