use crate::domain::model::{ContactKeys, Lead};
use crate::domain::settings::{ColumnMapping, SourceSettings, DEFAULT_DATE_FORMATS};
use crate::utils::error::{AnalyticsError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;

/// Contact values found in the conversion file, one set per contact column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionKeys {
    pub mobiles: HashSet<String>,
    pub emails: HashSet<String>,
    pub phones: HashSet<String>,
}

impl ConversionKeys {
    pub fn is_empty(&self) -> bool {
        self.mobiles.is_empty() && self.emails.is_empty() && self.phones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mobiles.len() + self.emails.len() + self.phones.len()
    }

    pub fn matches(&self, contact: &ContactKeys) -> bool {
        contains(&self.mobiles, contact.mobile.as_deref())
            || contains(&self.emails, contact.email.as_deref())
            || contains(&self.phones, contact.phone.as_deref())
    }
}

fn contains(set: &HashSet<String>, value: Option<&str>) -> bool {
    value.is_some_and(|v| set.contains(v))
}

/// Day-first timestamp parsing over a configurable format list.
pub struct TimestampParser<'a> {
    formats: &'a [String],
}

impl<'a> TimestampParser<'a> {
    pub fn new(formats: &'a [String]) -> Self {
        Self { formats }
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        for format in self.formats {
            if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
                return Some(ts);
            }
            // a user-supplied format may carry no time fields
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date.and_time(NaiveTime::MIN));
            }
        }

        DEFAULT_DATE_FORMATS.iter().find_map(|format| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
    }
}

pub fn read_leads(data: &[u8], settings: &SourceSettings, file: &str) -> Result<Vec<Lead>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();
    let columns = &settings.columns;

    let created_idx = require_column(&headers, &columns.created_at, file)?;
    let contacted_idx = require_column(&headers, &columns.contacted_at, file)?;
    let stage_idx = find_column(&headers, &columns.stage);
    let channel_idx = find_column(&headers, &columns.media_channel);
    let source_idx = find_column(&headers, &columns.media_source);
    let owner_idx = find_column(&headers, &columns.opportunity_owner);
    let mobile_idx = find_column(&headers, &columns.contact_mobile);
    let email_idx = find_column(&headers, &columns.contact_email);
    let phone_idx = find_column(&headers, &columns.contact_phone);

    let parser = TimestampParser::new(&settings.timestamp_formats);
    let mut unparsed = 0usize;
    let mut leads = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let mut timestamp = |idx: usize, column: &str| {
            let Some(raw) = cell(&record, Some(idx)) else {
                tracing::debug!("Row {}: column '{}' is empty", row + 2, column);
                return None;
            };
            let parsed = parser.parse(raw);
            if parsed.is_none() {
                unparsed += 1;
                tracing::debug!(
                    "Row {}: could not parse '{}' in column '{}'",
                    row + 2,
                    raw,
                    column
                );
            }
            parsed
        };

        let created_at = timestamp(created_idx, &columns.created_at);
        let contacted_at = timestamp(contacted_idx, &columns.contacted_at);

        leads.push(Lead {
            created_at,
            contacted_at,
            stage: text(&record, stage_idx),
            media_channel: text(&record, channel_idx),
            media_source: text(&record, source_idx),
            opportunity_owner: text(&record, owner_idx),
            contact: ContactKeys {
                mobile: text(&record, mobile_idx),
                email: text(&record, email_idx),
                phone: text(&record, phone_idx),
            },
        });
    }

    if unparsed > 0 {
        tracing::warn!(
            "⚠️ {} timestamp cells in {} could not be parsed and were treated as missing",
            unparsed,
            file
        );
    }
    tracing::debug!("Read {} leads from {}", leads.len(), file);

    Ok(leads)
}

/// Missing contact columns are tolerated and yield empty sets.
pub fn read_conversion_keys(data: &[u8], columns: &ColumnMapping) -> Result<ConversionKeys> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let mobile_idx = find_column(&headers, &columns.contact_mobile);
    let email_idx = find_column(&headers, &columns.contact_email);
    let phone_idx = find_column(&headers, &columns.contact_phone);

    if mobile_idx.is_none() && email_idx.is_none() && phone_idx.is_none() {
        tracing::warn!("⚠️ Conversion file has none of the contact columns; nothing will match");
    }

    let mut keys = ConversionKeys::default();
    for record in reader.records() {
        let record = record?;
        if let Some(v) = text(&record, mobile_idx) {
            keys.mobiles.insert(v);
        }
        if let Some(v) = text(&record, email_idx) {
            keys.emails.insert(v);
        }
        if let Some(v) = text(&record, phone_idx) {
            keys.phones.insert(v);
        }
    }

    Ok(keys)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
}

fn require_column(headers: &StringRecord, name: &str, file: &str) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| AnalyticsError::MissingColumnError {
        column: name.to_string(),
        file: file.to_string(),
    })
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn text(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    cell(record, idx).map(str::to_string)
}
