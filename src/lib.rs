pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    business_time::business_duration,
    etl::{AnalyticsEngine, RunOutcome},
    pipeline::LeadPipeline,
};
pub use domain::calendar::{AfterHoursRollover, BusinessCalendar};
pub use domain::model::{BusinessDuration, TimeInterval};
pub use utils::error::{AnalyticsError, Result};
