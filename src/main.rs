use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use erp_sheets_sync::api::UnleashedClient;
use erp_sheets_sync::models::{Config, ReportOptions};
use erp_sheets_sync::orchestrator::{report_catalogue, select_reports, Orchestrator};
use erp_sheets_sync::sheets::GoogleSheetsClient;

/// Copy ERP inventory, stock-on-hand and assembly reports into spreadsheet ranges
#[derive(Parser, Debug)]
#[command(name = "erp-sheets-sync", version)]
struct Cli {
    /// Only run the named report (repeatable); names a disabled report to enable it
    #[arg(long = "report", value_name = "NAME")]
    reports: Vec<String>,

    /// Print the report catalogue and exit
    #[arg(long)]
    list: bool,

    /// Date the assembly windows are computed from (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("erp_sheets_sync=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("❌ Could not install logger: {}", e);
    }

    match run(Cli::parse()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}

/// `Ok(false)` when at least one report failed
async fn run(cli: Cli) -> Result<bool> {
    if cli.list {
        let options = ReportOptions::from_env().context("failed to load report options")?;
        for entry in report_catalogue(&options) {
            println!(
                "{:<22} {:<12} {:<36} {}",
                entry.report.name(),
                entry.report.endpoint(),
                entry.report.target_range(),
                if entry.enabled_by_default { "default" } else { "opt-in" }
            );
        }
        return Ok(true);
    }

    let config = Config::from_env().context(
        "failed to load configuration; set ERP_API_ID, ERP_API_KEY and SPREADSHEET_ID (a .env file works)",
    )?;

    let reports = select_reports(report_catalogue(&config.reports), &cli.reports)?;
    let today = cli.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    info!("📋 Configuration loaded, running {} reports for {}", reports.len(), today);

    let source = UnleashedClient::new(&config).context("building ERP client")?;
    let writer = GoogleSheetsClient::new(&config).context("building spreadsheet client")?;
    let orchestrator = Orchestrator::new(Arc::new(source), Arc::new(writer), &config.spreadsheet_id);

    let summary = orchestrator.run(&reports, today).await;
    for result in &summary.results {
        info!("{:<22} {:?}", result.name, result.status);
    }

    Ok(summary.is_success())
}
