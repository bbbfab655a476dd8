use anyhow::Context;
use clap::Parser;
use lead_analytics::core::ingest::read_leads;
use lead_analytics::core::report::render_dashboard;
use lead_analytics::core::ConfigProvider;
use lead_analytics::utils::{logger, validation::Validate};
use lead_analytics::{AnalyticsEngine, LeadPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Lead analytics driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lead-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override analysis.workers from config
    #[arg(long)]
    workers: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Dry run - check inputs and show what would be processed without writing a report
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.log_level() == Some("debug");
    logger::init_logger(verbose, args.json_logs);
    tracing::info!("🚀 Starting TOML-based lead report");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 命令列覆蓋設定
    if let Some(workers) = args.workers {
        config.analysis.workers = Some(workers);
        tracing::info!("🔧 Workers overridden to: {}", workers);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No report will be written");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = LeadPipeline::new(storage, config);
    let engine = AnalyticsEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", render_dashboard(&outcome.summary));
            println!("✅ Lead report completed successfully!");
            println!("📁 Report saved to: {}", outcome.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Lead report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    if let Some(description) = &config.report.description {
        println!("  Description: {}", description);
    }
    println!("  Leads: {}", config.leads_file());
    if let Some(conversion_file) = config.conversion_file() {
        println!("  Conversions: {}", conversion_file);
    }
    match config.calendar() {
        Ok(calendar) => println!("  Calendar: {}", calendar),
        Err(e) => println!("  Calendar: invalid ({})", e),
    }
    println!("  Workers: {}", config.workers());
    println!(
        "  Output: {}/{}",
        config.output_path(),
        ConfigProvider::archive_name(config)
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let settings = config.source_settings();
    let data = std::fs::read(config.leads_file())
        .with_context(|| format!("reading leads file {}", config.leads_file()))?;
    let leads = read_leads(&data, &settings, config.leads_file())
        .with_context(|| format!("parsing leads file {}", config.leads_file()))?;

    let complete = leads
        .iter()
        .filter(|l| l.created_at.is_some() && l.contacted_at.is_some())
        .count();
    let filter = config.lead_filter();
    let selected = leads.iter().filter(|l| filter.matches(l)).count();

    println!("  📊 Rows: {}", leads.len());
    println!("  ⏱️ Rows with both timestamps: {}", complete);
    println!("  🎯 Rows passing filters: {}", selected);

    if let Some(conversion_file) = config.conversion_file() {
        let exists = std::path::Path::new(conversion_file).exists();
        println!(
            "  🔁 Conversion file: {} ({})",
            conversion_file,
            if exists { "found" } else { "missing" }
        );
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
    Ok(())
}
