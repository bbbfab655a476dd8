pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
mod args;

#[cfg(feature = "cli")]
pub use args::CliConfig;

/// Upper bound for the `workers` setting.
pub const MAX_WORKERS: usize = 256;
