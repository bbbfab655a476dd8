use super::MAX_WORKERS;
use crate::core::ConfigProvider;
use crate::domain::calendar::{parse_time_of_day, parse_weekday, AfterHoursRollover, BusinessCalendar};
use crate::domain::settings::{LeadFilter, SourceSettings, StageRules};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use chrono::{NaiveTime, Weekday};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lead-analytics")]
#[command(about = "Business-hours response time and conversion analytics for CRM lead exports")]
pub struct CliConfig {
    /// Lead export (CSV)
    #[arg(long)]
    pub leads_file: String,

    /// Optional CSV of converted contacts; matching leads are marked converted
    #[arg(long)]
    pub conversion_file: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "lead_report.zip")]
    pub archive_name: String,

    /// Worker threads for the per-lead calculation
    #[arg(long, default_value = "4")]
    pub workers: usize,

    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_weekday,
        default_values_t = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    )]
    pub working_days: Vec<Weekday>,

    #[arg(long, value_parser = parse_time_of_day, default_value = "09:00")]
    pub day_start: NaiveTime,

    #[arg(long, value_parser = parse_time_of_day, default_value = "15:00")]
    pub day_end: NaiveTime,

    /// keep_time_of_day or next_day_start
    #[arg(long, default_value = "keep_time_of_day")]
    pub after_hours: AfterHoursRollover,

    #[arg(long, value_delimiter = ',')]
    pub media_channel: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub media_source: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub opportunity_owner: Vec<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU, memory and throughput per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn leads_file(&self) -> &str {
        &self.leads_file
    }

    fn conversion_file(&self) -> Option<&str> {
        self.conversion_file.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn calendar(&self) -> Result<BusinessCalendar> {
        Ok(
            BusinessCalendar::new(self.working_days.iter().copied(), self.day_start, self.day_end)?
                .with_after_hours(self.after_hours),
        )
    }

    fn source_settings(&self) -> SourceSettings {
        SourceSettings::default()
    }

    fn lead_filter(&self) -> LeadFilter {
        LeadFilter {
            media_channels: self.media_channel.clone(),
            media_sources: self.media_source.clone(),
            opportunity_owners: self.opportunity_owner.clone(),
        }
    }

    fn stage_rules(&self) -> StageRules {
        StageRules::default()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("leads_file", &self.leads_file)?;
        validate_file_extension("leads_file", &self.leads_file, &["csv"])?;

        if let Some(conversion_file) = &self.conversion_file {
            validate_path("conversion_file", conversion_file)?;
            validate_file_extension("conversion_file", conversion_file, &["csv"])?;
        }

        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("archive_name", &self.archive_name)?;
        validate_file_extension("archive_name", &self.archive_name, &["zip"])?;

        validate_positive_number("workers", self.workers, 1)?;
        validate_range("workers", self.workers, 1, MAX_WORKERS)?;

        self.calendar()?;
        Ok(())
    }
}
