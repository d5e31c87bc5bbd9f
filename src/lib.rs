pub mod cli;
pub mod config;
pub mod freshness;
pub mod logging;
pub mod regen;
pub mod server;

pub use cli::Cli;
pub use config::Settings;
pub use freshness::FreshnessTracker;
pub use regen::{CommandRegenerator, RegenError, RegenOutcome, Regenerate};
pub use server::{ServeOptions, ServerError};
