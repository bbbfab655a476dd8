use crate::core::ingest::ConversionKeys;
use crate::domain::model::Lead;
use crate::domain::settings::LeadFilter;

/// Marks leads whose contact details appear in the conversion file.
/// Returns how many leads were matched.
pub fn apply_conversions(leads: &mut [Lead], keys: &ConversionKeys, converted_stage: &str) -> usize {
    if keys.is_empty() {
        return 0;
    }

    let mut matched = 0;
    for lead in leads.iter_mut().filter(|lead| keys.matches(&lead.contact)) {
        lead.stage = Some(converted_stage.to_string());
        matched += 1;
    }
    matched
}

pub fn apply_filter(leads: Vec<Lead>, filter: &LeadFilter) -> Vec<Lead> {
    if filter.is_empty() {
        return leads;
    }

    let before = leads.len();
    let kept: Vec<Lead> = leads.into_iter().filter(|lead| filter.matches(lead)).collect();
    tracing::debug!("Filters kept {} of {} leads", kept.len(), before);
    kept
}
