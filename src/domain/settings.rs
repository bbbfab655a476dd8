use crate::domain::model::Lead;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M %p",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats, read as midnight.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// Header names of the lead export. Defaults follow the Salesforce
/// opportunity report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub created_at: String,
    pub contacted_at: String,
    pub stage: String,
    pub media_channel: String,
    pub media_source: String,
    pub opportunity_owner: String,
    pub contact_mobile: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            created_at: "Created Date".to_string(),
            contacted_at: "Contacted Date".to_string(),
            stage: "Stage".to_string(),
            media_channel: "Media Channel".to_string(),
            media_source: "Media Source".to_string(),
            opportunity_owner: "Opportunity Owner".to_string(),
            contact_mobile: "Primary Contact Mobile".to_string(),
            contact_email: "Primary Contact Email".to_string(),
            contact_phone: "Primary Contact Phone".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub columns: ColumnMapping,
    /// Tried in order; the first format that parses wins.
    pub timestamp_formats: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Multi-select filters. An empty selection lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFilter {
    pub media_channels: Vec<String>,
    pub media_sources: Vec<String>,
    pub opportunity_owners: Vec<String>,
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        self.media_channels.is_empty()
            && self.media_sources.is_empty()
            && self.opportunity_owners.is_empty()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        selected(&self.media_channels, lead.media_channel.as_deref())
            && selected(&self.media_sources, lead.media_source.as_deref())
            && selected(&self.opportunity_owners, lead.opportunity_owner.as_deref())
    }
}

fn selected(selection: &[String], value: Option<&str>) -> bool {
    if selection.is_empty() {
        return true;
    }
    match value {
        Some(v) => selection.iter().any(|s| s == v),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRules {
    /// Stages counted as genuine interest.
    pub interested_stages: Vec<String>,
    /// Stage assigned by conversion matching, also the marker for conversion rates.
    pub converted_stage: String,
}

impl Default for StageRules {
    fn default() -> Self {
        Self {
            interested_stages: vec![
                "Converted".to_string(),
                "Deciding".to_string(),
                "Experiencing".to_string(),
            ],
            converted_stage: "Converted".to_string(),
        }
    }
}

impl StageRules {
    pub fn is_interested(&self, stage: Option<&str>) -> bool {
        stage.is_some_and(|s| self.interested_stages.iter().any(|i| i == s))
    }

    /// Substring match, so "Converted - Cash" still counts as converted.
    pub fn is_converted(&self, stage: Option<&str>) -> bool {
        stage.is_some_and(|s| s.contains(self.converted_stage.as_str()))
    }
}
