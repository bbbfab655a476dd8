use super::MAX_WORKERS;
use crate::core::ConfigProvider;
use crate::domain::calendar::{
    parse_time_of_day, parse_working_days, AfterHoursRollover, BusinessCalendar,
};
use crate::domain::settings::{ColumnMapping, LeadFilter, SourceSettings, StageRules};
use crate::utils::error::{AnalyticsError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_ARCHIVE_NAME: &str = "lead_report.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportMeta,
    pub source: SourceConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub filters: LeadFilter,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub leads_file: String,
    pub conversion_file: Option<String>,
    pub timestamp_formats: Option<Vec<String>>,
    pub columns: Option<ColumnMapping>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub working_days: Option<Vec<String>>,
    pub day_start: Option<String>,
    pub day_end: Option<String>,
    pub after_hours: Option<AfterHoursRollover>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub workers: Option<usize>,
    pub interested_stages: Option<Vec<String>>,
    pub converted_stage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub archive_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl CalendarConfig {
    /// Unset fields fall back to the Monday-Friday 09:00-15:00 calendar.
    pub fn to_calendar(&self) -> Result<BusinessCalendar> {
        let defaults = BusinessCalendar::default();

        let working_days = match &self.working_days {
            Some(days) => parse_working_days(days)?,
            None => defaults.working_days(),
        };
        let day_start = match &self.day_start {
            Some(value) => parse_time_of_day(value)?,
            None => defaults.day_start(),
        };
        let day_end = match &self.day_end {
            Some(value) => parse_time_of_day(value)?,
            None => defaults.day_end(),
        };

        Ok(BusinessCalendar::new(working_days, day_start, day_end)?
            .with_after_hours(self.after_hours.unwrap_or_default()))
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AnalyticsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AnalyticsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LEADS_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AnalyticsError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("report.name", &self.report.name)?;

        validate_path("source.leads_file", &self.source.leads_file)?;
        validate_file_extension("source.leads_file", &self.source.leads_file, &["csv"])?;
        if let Some(conversion_file) = &self.source.conversion_file {
            validate_path("source.conversion_file", conversion_file)?;
            validate_file_extension("source.conversion_file", conversion_file, &["csv"])?;
        }

        if let Some(formats) = &self.source.timestamp_formats {
            if formats.is_empty() {
                return Err(AnalyticsError::InvalidConfigValueError {
                    field: "source.timestamp_formats".to_string(),
                    value: "[]".to_string(),
                    reason: "At least one timestamp format is required".to_string(),
                });
            }
        }

        validate_path("load.output_path", &self.load.output_path)?;
        validate_file_extension("load.archive_name", self.archive_name(), &["zip"])?;

        if let Some(workers) = self.analysis.workers {
            validate_positive_number("analysis.workers", workers, 1)?;
            validate_range("analysis.workers", workers, 1, MAX_WORKERS)?;
        }

        if let Some(stage) = &self.analysis.converted_stage {
            validate_non_empty_string("analysis.converted_stage", stage)?;
        }

        self.calendar.to_calendar()?;
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn archive_name(&self) -> &str {
        self.load
            .archive_name
            .as_deref()
            .unwrap_or(DEFAULT_ARCHIVE_NAME)
    }
}

impl ConfigProvider for TomlConfig {
    fn leads_file(&self) -> &str {
        &self.source.leads_file
    }

    fn conversion_file(&self) -> Option<&str> {
        self.source.conversion_file.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn archive_name(&self) -> &str {
        TomlConfig::archive_name(self)
    }

    fn workers(&self) -> usize {
        self.analysis.workers.unwrap_or(DEFAULT_WORKERS)
    }

    fn calendar(&self) -> Result<BusinessCalendar> {
        self.calendar.to_calendar()
    }

    fn source_settings(&self) -> SourceSettings {
        let defaults = SourceSettings::default();
        SourceSettings {
            columns: self.source.columns.clone().unwrap_or(defaults.columns),
            timestamp_formats: self
                .source
                .timestamp_formats
                .clone()
                .unwrap_or(defaults.timestamp_formats),
        }
    }

    fn lead_filter(&self) -> LeadFilter {
        self.filters.clone()
    }

    fn stage_rules(&self) -> StageRules {
        let defaults = StageRules::default();
        StageRules {
            interested_stages: self
                .analysis
                .interested_stages
                .clone()
                .unwrap_or(defaults.interested_stages),
            converted_stage: self
                .analysis
                .converted_stage
                .clone()
                .unwrap_or(defaults.converted_stage),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
