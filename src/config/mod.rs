pub mod cli;
pub mod toml_config;

pub use cli::{CliConfig, PendingPolicy};
pub use toml_config::RunConfig;
