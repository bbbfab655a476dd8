use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contact fields used to match a lead against the conversion file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactKeys {
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One row of the CRM lead export. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub created_at: Option<NaiveDateTime>,
    pub contacted_at: Option<NaiveDateTime>,
    pub stage: Option<String>,
    pub media_channel: Option<String>,
    pub media_source: Option<String>,
    pub opportunity_owner: Option<String>,
    pub contact: ContactKeys,
}

/// Creation and first-contact instants of a lead, in no particular order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeInterval {
    pub created_at: Option<NaiveDateTime>,
    pub contacted_at: Option<NaiveDateTime>,
}

impl Lead {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            created_at: self.created_at,
            contacted_at: self.contacted_at,
        }
    }
}

/// Elapsed business time: `days` full windows traversed, `hours` accrued in
/// total across the whole walk. The two are independent running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessDuration {
    pub hours: f64,
    pub days: u32,
}

impl BusinessDuration {
    pub const ZERO: Self = Self { hours: 0.0, days: 0 };
}

/// Wall-clock time between creation and contact. Negative when the contact
/// timestamp precedes creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseTime {
    pub hours: f64,
    /// Whole days, rounded toward negative infinity.
    pub days: i64,
}

impl ResponseTime {
    pub fn between(created_at: NaiveDateTime, contacted_at: NaiveDateTime) -> Self {
        let elapsed: TimeDelta = contacted_at - created_at;
        let seconds = elapsed.num_seconds();
        Self {
            hours: elapsed.num_milliseconds() as f64 / 3_600_000.0,
            days: seconds.div_euclid(86_400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedLead {
    pub lead: Lead,
    pub response: Option<ResponseTime>,
    pub business: Option<BusinessDuration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_leads: usize,
    pub avg_response_hours: Option<f64>,
    pub avg_response_days: Option<f64>,
    pub avg_business_hours: Option<f64>,
    pub avg_business_days: Option<f64>,
    pub avg_opportunities_per_day: Option<f64>,
    pub avg_opportunities_per_week: Option<f64>,
    pub interested_total: usize,
    pub interested_percentage: f64,
    /// media channel -> stage -> lead count
    pub channel_stage_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// opportunity owner -> `%Y-%U` week -> lead count
    pub owner_weekly_leads: BTreeMap<String, BTreeMap<String, usize>>,
    pub owner_conversion_rates: BTreeMap<String, f64>,
}

/// Output of the transform phase: analyzed rows, aggregates and the rendered
/// CSV files that go into the report archive.
#[derive(Debug, Clone)]
pub struct LeadReport {
    pub analyzed: Vec<AnalyzedLead>,
    pub summary: AnalyticsSummary,
    pub leads_csv: String,
    pub channel_stages_csv: String,
    pub owner_weekly_csv: String,
    pub owner_conversion_csv: String,
}
