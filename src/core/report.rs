use crate::domain::model::{AnalyticsSummary, AnalyzedLead, LeadReport};
use crate::domain::settings::{ColumnMapping, StageRules};
use crate::utils::error::{AnalyticsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::Writer;
use std::collections::BTreeMap;

const TIMESTAMP_OUTPUT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Week key used for weekly grouping: year plus Sunday-based week number.
pub fn week_key(ts: NaiveDateTime) -> String {
    ts.format("%Y-%U").to_string()
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn mean_group_size<K>(groups: &BTreeMap<K, usize>) -> Option<f64> {
    mean(groups.values().map(|&n| n as f64))
}

pub fn summarize(analyzed: &[AnalyzedLead], rules: &StageRules) -> AnalyticsSummary {
    let total_leads = analyzed.len();

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut per_week: BTreeMap<String, usize> = BTreeMap::new();
    let mut channel_stage_counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut owner_weekly_leads: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    // owner -> (converted, total)
    let mut owner_totals: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut interested_total = 0;

    for item in analyzed {
        let lead = &item.lead;
        let stage = lead.stage.as_deref();

        if let Some(created) = lead.created_at {
            *per_day.entry(created.date()).or_default() += 1;
            *per_week.entry(week_key(created)).or_default() += 1;
        }

        if rules.is_interested(stage) {
            interested_total += 1;
        }

        if let (Some(channel), Some(stage)) = (&lead.media_channel, stage) {
            *channel_stage_counts
                .entry(channel.clone())
                .or_default()
                .entry(stage.to_string())
                .or_default() += 1;
        }

        if let Some(owner) = &lead.opportunity_owner {
            if let Some(created) = lead.created_at {
                *owner_weekly_leads
                    .entry(owner.clone())
                    .or_default()
                    .entry(week_key(created))
                    .or_default() += 1;
            }

            let totals = owner_totals.entry(owner.clone()).or_default();
            totals.1 += 1;
            if rules.is_converted(stage) {
                totals.0 += 1;
            }
        }
    }

    let owner_conversion_rates = owner_totals
        .into_iter()
        .map(|(owner, (converted, total))| (owner, converted as f64 / total as f64))
        .collect();

    let interested_percentage = if total_leads > 0 {
        interested_total as f64 / total_leads as f64 * 100.0
    } else {
        0.0
    };

    AnalyticsSummary {
        total_leads,
        avg_response_hours: mean(analyzed.iter().filter_map(|a| a.response).map(|r| r.hours)),
        avg_response_days: mean(
            analyzed
                .iter()
                .filter_map(|a| a.response)
                .map(|r| r.days as f64),
        ),
        avg_business_hours: mean(analyzed.iter().filter_map(|a| a.business).map(|b| b.hours)),
        avg_business_days: mean(
            analyzed
                .iter()
                .filter_map(|a| a.business)
                .map(|b| b.days as f64),
        ),
        avg_opportunities_per_day: mean_group_size(&per_day),
        avg_opportunities_per_week: mean_group_size(&per_week),
        interested_total,
        interested_percentage,
        channel_stage_counts,
        owner_weekly_leads,
        owner_conversion_rates,
    }
}

pub fn build_report(
    analyzed: Vec<AnalyzedLead>,
    rules: &StageRules,
    columns: &ColumnMapping,
) -> Result<LeadReport> {
    let summary = summarize(&analyzed, rules);

    Ok(LeadReport {
        leads_csv: render_leads_csv(&analyzed, columns)?,
        channel_stages_csv: render_channel_stages_csv(&summary)?,
        owner_weekly_csv: render_owner_weekly_csv(&summary)?,
        owner_conversion_csv: render_owner_conversion_csv(&summary)?,
        analyzed,
        summary,
    })
}

fn opt_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
        .unwrap_or_default()
}

fn opt_text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn decimal(value: f64) -> String {
    format!("{:.4}", value)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyticsError::ProcessingError {
            message: format!("Failed to flush CSV output: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| AnalyticsError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

pub fn render_leads_csv(analyzed: &[AnalyzedLead], columns: &ColumnMapping) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        columns.created_at.as_str(),
        columns.contacted_at.as_str(),
        columns.stage.as_str(),
        columns.media_channel.as_str(),
        columns.media_source.as_str(),
        columns.opportunity_owner.as_str(),
        columns.contact_mobile.as_str(),
        columns.contact_email.as_str(),
        columns.contact_phone.as_str(),
        "Response Time (Hours)",
        "Response Time (Days)",
        "Business Response Time (Hours)",
        "Business Response Time (Days)",
    ])?;

    for item in analyzed {
        let lead = &item.lead;
        let created = opt_timestamp(lead.created_at);
        let contacted = opt_timestamp(lead.contacted_at);
        let response_hours = item.response.map(|r| decimal(r.hours)).unwrap_or_default();
        let response_days = item
            .response
            .map(|r| r.days.to_string())
            .unwrap_or_default();
        let business_hours = item.business.map(|b| decimal(b.hours)).unwrap_or_default();
        let business_days = item
            .business
            .map(|b| b.days.to_string())
            .unwrap_or_default();

        writer.write_record([
            created.as_str(),
            contacted.as_str(),
            opt_text(&lead.stage),
            opt_text(&lead.media_channel),
            opt_text(&lead.media_source),
            opt_text(&lead.opportunity_owner),
            opt_text(&lead.contact.mobile),
            opt_text(&lead.contact.email),
            opt_text(&lead.contact.phone),
            response_hours.as_str(),
            response_days.as_str(),
            business_hours.as_str(),
            business_days.as_str(),
        ])?;
    }

    finish(writer)
}

pub fn render_channel_stages_csv(summary: &AnalyticsSummary) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["Media Channel", "Stage", "Leads"])?;
    for (channel, stages) in &summary.channel_stage_counts {
        for (stage, count) in stages {
            writer.write_record([channel.as_str(), stage.as_str(), count.to_string().as_str()])?;
        }
    }
    finish(writer)
}

pub fn render_owner_weekly_csv(summary: &AnalyticsSummary) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["Opportunity Owner", "Week", "Leads per Week"])?;
    for (owner, weeks) in &summary.owner_weekly_leads {
        for (week, count) in weeks {
            writer.write_record([owner.as_str(), week.as_str(), count.to_string().as_str()])?;
        }
    }
    finish(writer)
}

pub fn render_owner_conversion_csv(summary: &AnalyticsSummary) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["Opportunity Owner", "Conversion Rate"])?;
    for (owner, rate) in &summary.owner_conversion_rates {
        writer.write_record([owner.as_str(), decimal(*rate).as_str()])?;
    }
    finish(writer)
}

fn metric(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Plain-text dashboard printed by the binaries after a run.
pub fn render_dashboard(summary: &AnalyticsSummary) -> String {
    let mut out = String::new();
    out.push_str("📊 Dashboard Metrics\n");
    out.push_str(&format!(
        "  📌 Opportunities      Avg/Day: {:<10} Avg/Week: {}\n",
        metric(summary.avg_opportunities_per_day),
        metric(summary.avg_opportunities_per_week)
    ));
    out.push_str(&format!(
        "  ⏱️ Response (real)    Hours: {:<12} Days: {}\n",
        metric(summary.avg_response_hours),
        metric(summary.avg_response_days)
    ));
    out.push_str(&format!(
        "  🏢 Response (business) Hours: {:<12} Days: {}\n",
        metric(summary.avg_business_hours),
        metric(summary.avg_business_days)
    ));
    out.push_str(&format!(
        "  💡 Interested leads   {:.2}% of {} ({} leads)\n",
        summary.interested_percentage, summary.total_leads, summary.interested_total
    ));

    if !summary.owner_conversion_rates.is_empty() {
        out.push_str("\n🔁 Conversion Rate per Owner\n");
        for (owner, rate) in &summary.owner_conversion_rates {
            out.push_str(&format!("  {:<24} {:.2}%\n", owner, rate * 100.0));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BusinessDuration, Lead, ResponseTime};

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn analyzed(
        created_day: Option<u32>,
        stage: Option<&str>,
        channel: Option<&str>,
        owner: Option<&str>,
        business: Option<BusinessDuration>,
    ) -> AnalyzedLead {
        let created_at = created_day.map(|d| ts(d, 10));
        AnalyzedLead {
            lead: Lead {
                created_at,
                contacted_at: created_at.map(|c| c + chrono::TimeDelta::hours(3)),
                stage: stage.map(str::to_string),
                media_channel: channel.map(str::to_string),
                opportunity_owner: owner.map(str::to_string),
                ..Lead::default()
            },
            response: created_at.map(|c| ResponseTime::between(c, c + chrono::TimeDelta::hours(3))),
            business,
        }
    }

    fn sample() -> Vec<AnalyzedLead> {
        vec![
            analyzed(
                Some(4),
                Some("Converted"),
                Some("Google"),
                Some("Omar"),
                Some(BusinessDuration {
                    hours: 3.0,
                    days: 0,
                }),
            ),
            analyzed(
                Some(4),
                Some("Lost"),
                Some("Google"),
                Some("Omar"),
                Some(BusinessDuration {
                    hours: 9.0,
                    days: 2,
                }),
            ),
            analyzed(Some(5), Some("Deciding"), Some("Radio"), Some("Sara"), None),
            analyzed(None, Some("Lost"), None, Some("Sara"), None),
        ]
    }

    #[test]
    fn test_summarize_averages_exclude_undefined() {
        let summary = summarize(&sample(), &StageRules::default());

        assert_eq!(summary.total_leads, 4);
        assert_eq!(summary.avg_business_hours, Some(6.0));
        assert_eq!(summary.avg_business_days, Some(1.0));
        assert_eq!(summary.avg_response_hours, Some(3.0));
        assert_eq!(summary.avg_response_days, Some(0.0));
    }

    #[test]
    fn test_summarize_opportunity_rates() {
        let summary = summarize(&sample(), &StageRules::default());

        // 4th: 2 leads, 5th: 1 lead
        assert_eq!(summary.avg_opportunities_per_day, Some(1.5));
        // Mon 4th and Tue 5th share a week
        assert_eq!(summary.avg_opportunities_per_week, Some(3.0));
    }

    #[test]
    fn test_summarize_interest_and_conversion() {
        let summary = summarize(&sample(), &StageRules::default());

        assert_eq!(summary.interested_total, 2);
        assert_eq!(summary.interested_percentage, 50.0);
        assert_eq!(summary.owner_conversion_rates.get("Omar"), Some(&0.5));
        assert_eq!(summary.owner_conversion_rates.get("Sara"), Some(&0.0));

        let google = summary.channel_stage_counts.get("Google").unwrap();
        assert_eq!(google.get("Converted"), Some(&1));
        assert_eq!(google.get("Lost"), Some(&1));
        assert_eq!(summary.channel_stage_counts.len(), 2);

        let sara = summary.owner_weekly_leads.get("Sara").unwrap();
        assert_eq!(sara.values().sum::<usize>(), 1);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], &StageRules::default());
        assert_eq!(summary.total_leads, 0);
        assert_eq!(summary.avg_business_hours, None);
        assert_eq!(summary.avg_opportunities_per_day, None);
        assert_eq!(summary.interested_percentage, 0.0);
    }

    #[test]
    fn test_week_key_is_sunday_based() {
        // Sat 2nd and Sun 3rd fall in different %U weeks
        assert_ne!(week_key(ts(2, 10)), week_key(ts(3, 10)));
        assert_eq!(week_key(ts(3, 10)), week_key(ts(9, 10)));
    }

    #[test]
    fn test_render_leads_csv_blank_for_undefined() {
        let report =
            build_report(sample(), &StageRules::default(), &ColumnMapping::default()).unwrap();
        let lines: Vec<&str> = report.leads_csv.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Created Date,Contacted Date,Stage"));
        assert!(lines[0].ends_with("Business Response Time (Days)"));
        assert_eq!(
            lines[1],
            "04/03/2024 10:00:00,04/03/2024 13:00:00,Converted,Google,,Omar,,,,3.0000,0,3.0000,0"
        );
        assert!(lines[3].ends_with(",3.0000,0,,"));
        assert_eq!(lines[4], ",,Lost,,,Sara,,,,,,,");
    }

    #[test]
    fn test_render_breakdowns() {
        let report =
            build_report(sample(), &StageRules::default(), &ColumnMapping::default()).unwrap();

        assert_eq!(
            report.channel_stages_csv,
            "Media Channel,Stage,Leads\nGoogle,Converted,1\nGoogle,Lost,1\nRadio,Deciding,1\n"
        );
        assert_eq!(
            report.owner_conversion_csv,
            "Opportunity Owner,Conversion Rate\nOmar,0.5000\nSara,0.0000\n"
        );
        assert!(report.owner_weekly_csv.contains("Omar,2024-09,2"));
    }

    #[test]
    fn test_render_dashboard() {
        let summary = summarize(&sample(), &StageRules::default());
        let text = render_dashboard(&summary);
        assert!(text.contains("Avg/Day: 1.50"));
        assert!(text.contains("50.00% of 4 (2 leads)"));
        assert!(text.contains("Omar"));

        let empty = render_dashboard(&AnalyticsSummary::default());
        assert!(empty.contains("n/a"));
        assert!(!empty.contains("Conversion Rate per Owner"));
    }
}
