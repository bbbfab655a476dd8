use crate::domain::calendar::BusinessCalendar;
use crate::domain::model::{AnalyzedLead, Lead, ResponseTime};
use crate::utils::error::{AnalyticsError, Result};

/// Per-lead metrics for a single row.
pub fn analyze_lead(lead: Lead, calendar: &BusinessCalendar) -> AnalyzedLead {
    let interval = lead.interval();
    let response = match (interval.created_at, interval.contacted_at) {
        (Some(created), Some(contacted)) => Some(ResponseTime::between(created, contacted)),
        _ => None,
    };
    let business = interval.business_duration(calendar);

    AnalyzedLead {
        lead,
        response,
        business,
    }
}

/// Applies [`analyze_lead`] to every lead, split into `workers` chunks on the
/// blocking pool. Output order matches input order.
pub async fn analyze_leads(
    leads: Vec<Lead>,
    calendar: BusinessCalendar,
    workers: usize,
) -> Result<Vec<AnalyzedLead>> {
    let total = leads.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = total.div_ceil(workers.max(1));
    let mut handles = Vec::new();
    let mut remaining = leads.into_iter();

    loop {
        let chunk: Vec<Lead> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        handles.push(tokio::task::spawn_blocking(move || {
            chunk
                .into_iter()
                .map(|lead| analyze_lead(lead, &calendar))
                .collect::<Vec<_>>()
        }));
    }

    tracing::debug!(
        "Analyzing {} leads in {} chunks of up to {}",
        total,
        handles.len(),
        chunk_size
    );

    let mut analyzed = Vec::with_capacity(total);
    for handle in handles {
        let chunk = handle
            .await
            .map_err(|e| AnalyticsError::ProcessingError {
                message: format!("Lead analysis worker failed: {}", e),
            })?;
        analyzed.extend(chunk);
    }

    Ok(analyzed)
}
