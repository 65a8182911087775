//! Runs the fixed report catalogue, one pipeline after another.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::InventoryDataSource;
use crate::models::{AssemblyLineSource, ReportOptions};
use crate::reports::products::{DEFAULT_PRODUCT_GROUPS, PRODUCTS_RANGE};
use crate::reports::{
    run_report, AssembliesReport, ProductsReport, ReportBuilder, StockOnHandReport,
};
use crate::sheets::SheetWriter;

/// A report plus whether a plain run includes it
pub struct CatalogueEntry {
    pub report: Box<dyn ReportBuilder>,
    pub enabled_by_default: bool,
}

/// The reports this tool maintains, in run order
pub fn report_catalogue(options: &ReportOptions) -> Vec<CatalogueEntry> {
    let product_groups = options.product_groups.clone().unwrap_or_else(|| {
        DEFAULT_PRODUCT_GROUPS.iter().map(|g| g.to_string()).collect()
    });

    vec![
        CatalogueEntry {
            report: Box::new(ProductsReport::new(product_groups, PRODUCTS_RANGE)),
            enabled_by_default: true,
        },
        CatalogueEntry {
            report: Box::new(StockOnHandReport::new("soh-hq", "HQ", "Unleashed Import SOH!A3:G")),
            enabled_by_default: true,
        },
        CatalogueEntry {
            report: Box::new(StockOnHandReport::new(
                "soh-mfkm",
                "MFKM",
                "Unleashed Import SOH!H3:N",
            )),
            enabled_by_default: true,
        },
        CatalogueEntry {
            report: Box::new(AssembliesReport::new(
                "assemblies-4-weeks",
                4,
                "Unleashed Assemblies Import!A3:D",
                AssemblyLineSource::Own,
            )),
            enabled_by_default: true,
        },
        CatalogueEntry {
            report: Box::new(AssembliesReport::new(
                "assemblies-12-weeks",
                12,
                "Unleashed Assemblies Import!E3:H",
                options.assembly_line_source,
            )),
            enabled_by_default: false,
        },
    ]
}

/// Pick reports from the catalogue: the defaults when `names` is empty,
/// otherwise exactly the named ones (in catalogue order).
pub fn select_reports(
    catalogue: Vec<CatalogueEntry>,
    names: &[String],
) -> anyhow::Result<Vec<Box<dyn ReportBuilder>>> {
    if let Some(unknown) = names
        .iter()
        .find(|n| !catalogue.iter().any(|e| e.report.name() == n.as_str()))
    {
        let known: Vec<&str> = catalogue.iter().map(|e| e.report.name()).collect();
        anyhow::bail!("unknown report '{}', expected one of: {}", unknown, known.join(", "));
    }

    Ok(catalogue
        .into_iter()
        .filter(|e| {
            if names.is_empty() {
                e.enabled_by_default
            } else {
                names.iter().any(|n| n == e.report.name())
            }
        })
        .map(|e| e.report)
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    Written { rows: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportResult {
    pub name: String,
    pub range: String,
    pub status: ReportStatus,
}

/// Per-report results of one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<ReportResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, ReportStatus::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct Orchestrator {
    source: Arc<dyn InventoryDataSource>,
    writer: Arc<dyn SheetWriter>,
    spreadsheet_id: String,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn InventoryDataSource>,
        writer: Arc<dyn SheetWriter>,
        spreadsheet_id: &str,
    ) -> Self {
        Self {
            source,
            writer,
            spreadsheet_id: spreadsheet_id.to_string(),
        }
    }

    /// Run each report in order. A failure is recorded and the next report
    /// still runs.
    pub async fn run(&self, reports: &[Box<dyn ReportBuilder>], today: NaiveDate) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = reports.len();

        for (index, report) in reports.iter().enumerate() {
            let status = match run_report(
                self.source.as_ref(),
                self.writer.as_ref(),
                &self.spreadsheet_id,
                report.as_ref(),
                today,
            )
            .await
            {
                Ok(outcome) => {
                    info!(
                        "✅ {}/{}: {} - {} rows written to {}",
                        index + 1,
                        total,
                        outcome.name,
                        outcome.rows_written,
                        outcome.range
                    );
                    ReportStatus::Written {
                        rows: outcome.rows_written,
                    }
                }
                Err(e) => {
                    error!("❌ {}/{}: {} failed - {:#}", index + 1, total, report.name(), e);
                    ReportStatus::Failed {
                        error: format!("{:#}", e),
                    }
                }
            };

            summary.results.push(ReportResult {
                name: report.name().to_string(),
                range: report.target_range().to_string(),
                status,
            });
        }

        info!(
            "📊 Run complete: {} reports written, {} failed",
            summary.succeeded(),
            summary.failed()
        );
        summary
    }
}
