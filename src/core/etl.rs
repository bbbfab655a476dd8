use crate::core::Pipeline;
use crate::domain::model::AnalyticsSummary;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub summary: AnalyticsSummary,
}

pub struct AnalyticsEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalyticsEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting lead analysis...");

        // Extract
        let leads = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} leads", leads.len());
        self.monitor.log_phase("extract", leads.len());

        // Transform
        let report = self.pipeline.transform(leads).await?;
        tracing::info!("🧮 Analyzed {} leads", report.analyzed.len());
        self.monitor.log_phase("transform", report.analyzed.len());

        // Load
        let summary = report.summary.clone();
        let rows = report.analyzed.len();
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("💾 Report saved to: {}", output_path);
        self.monitor.log_phase("load", rows);

        self.monitor.log_final_stats();

        Ok(RunOutcome {
            output_path,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Lead, LeadReport};
    use crate::utils::error::AnalyticsError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        fail_transform: bool,
        loads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Vec<Lead>> {
            Ok(vec![Lead::default(), Lead::default()])
        }

        async fn transform(&self, leads: Vec<Lead>) -> Result<LeadReport> {
            if self.fail_transform {
                return Err(AnalyticsError::ProcessingError {
                    message: "boom".to_string(),
                });
            }
            let summary = AnalyticsSummary {
                total_leads: leads.len(),
                ..AnalyticsSummary::default()
            };
            Ok(LeadReport {
                analyzed: Vec::new(),
                summary,
                leads_csv: String::new(),
                channel_stages_csv: String::new(),
                owner_weekly_csv: String::new(),
                owner_conversion_csv: String::new(),
            })
        }

        async fn load(&self, _report: LeadReport) -> Result<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok("out/lead_report.zip".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_returns_path_and_summary() {
        let engine = AnalyticsEngine::new(CountingPipeline {
            fail_transform: false,
            loads: AtomicUsize::new(0),
        });

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome.output_path, "out/lead_report.zip");
        assert_eq!(outcome.summary.total_leads, 2);
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_transform_error() {
        let engine = AnalyticsEngine::new(CountingPipeline {
            fail_transform: true,
            loads: AtomicUsize::new(0),
        });

        let result = engine.run().await;

        assert!(matches!(result, Err(AnalyticsError::ProcessingError { .. })));
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 0);
    }
}
