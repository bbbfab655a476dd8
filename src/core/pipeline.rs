use crate::core::batch::analyze_leads;
use crate::core::enrich::{apply_conversions, apply_filter};
use crate::core::ingest::{read_conversion_keys, read_leads};
use crate::core::report::build_report;
use crate::core::{ConfigProvider, Lead, LeadReport, Pipeline, Storage};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub struct LeadPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> LeadPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn archive_path(&self) -> String {
        format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            self.config.archive_name()
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LeadPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Lead>> {
        let settings = self.config.source_settings();
        let leads_file = self.config.leads_file();

        tracing::debug!("Reading leads from: {}", leads_file);
        let data = self.storage.read_file(leads_file).await?;
        let mut leads = read_leads(&data, &settings, leads_file)?;

        // 轉換檔比對：聯絡資料出現在轉換檔中的 lead 標記為已轉換
        if let Some(conversion_file) = self.config.conversion_file() {
            tracing::debug!("Reading conversion file: {}", conversion_file);
            let data = self.storage.read_file(conversion_file).await?;
            let keys = read_conversion_keys(&data, &settings.columns)?;
            let converted_stage = self.config.stage_rules().converted_stage;
            let matched = apply_conversions(&mut leads, &keys, &converted_stage);
            tracing::info!(
                "🔁 {} leads matched {} conversion contacts and were marked '{}'",
                matched,
                keys.len(),
                converted_stage
            );
        }

        Ok(leads)
    }

    async fn transform(&self, leads: Vec<Lead>) -> Result<LeadReport> {
        let calendar = self.config.calendar()?;
        let filter = self.config.lead_filter();
        let rules = self.config.stage_rules();
        let settings = self.config.source_settings();

        let leads = apply_filter(leads, &filter);
        tracing::debug!("Business calendar: {}", calendar);

        let analyzed = analyze_leads(leads, calendar, self.config.workers()).await?;
        let undefined = analyzed.iter().filter(|a| a.business.is_none()).count();
        if undefined > 0 {
            tracing::debug!(
                "{} leads have no business response time (missing timestamps)",
                undefined
            );
        }

        build_report(analyzed, &rules, &settings.columns)
    }

    async fn load(&self, report: LeadReport) -> Result<String> {
        let output_path = self.archive_path();

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("leads.csv", FileOptions::default())?;
            zip.write_all(report.leads_csv.as_bytes())?;

            zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
            let json_data = serde_json::to_string_pretty(&report.summary)?;
            zip.write_all(json_data.as_bytes())?;

            zip.start_file::<_, ()>("channel_stages.csv", FileOptions::default())?;
            zip.write_all(report.channel_stages_csv.as_bytes())?;

            zip.start_file::<_, ()>("owner_weekly.csv", FileOptions::default())?;
            zip.write_all(report.owner_weekly_csv.as_bytes())?;

            zip.start_file::<_, ()>("owner_conversion.csv", FileOptions::default())?;
            zip.write_all(report.owner_conversion_csv.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing report archive ({} bytes)", zip_data.len());
        self.storage.write_file(&output_path, &zip_data).await?;

        Ok(output_path)
    }
}
