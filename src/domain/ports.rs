use crate::domain::calendar::BusinessCalendar;
use crate::domain::model::{Lead, LeadReport};
use crate::domain::settings::{LeadFilter, SourceSettings, StageRules};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn leads_file(&self) -> &str;
    fn conversion_file(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn archive_name(&self) -> &str;
    fn workers(&self) -> usize;
    fn calendar(&self) -> Result<BusinessCalendar>;
    fn source_settings(&self) -> SourceSettings;
    fn lead_filter(&self) -> LeadFilter;
    fn stage_rules(&self) -> StageRules;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Lead>>;
    async fn transform(&self, leads: Vec<Lead>) -> Result<LeadReport>;
    async fn load(&self, report: LeadReport) -> Result<String>;
}
