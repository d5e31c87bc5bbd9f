//! Command-line interface for the dashboard server.
//!
//! The serving contract is positional:
//! `dashd <port> <dashboard_dir> <regenerator> [ttl_seconds]`.

pub mod args;

pub use args::Cli;
