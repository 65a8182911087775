//! Report pipelines: fetch one ERP list, shape it into rows, replace one
//! spreadsheet range with them.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::InventoryDataSource;
use crate::models::Row;
use crate::sheets::SheetWriter;

pub mod assemblies;
pub mod products;
pub mod stock_on_hand;

pub use assemblies::AssembliesReport;
pub use products::ProductsReport;
pub use stock_on_hand::StockOnHandReport;

/// What varies between reports; everything else is [`run_report`]
pub trait ReportBuilder: Send + Sync {
    /// Stable name used on the command line and in logs
    fn name(&self) -> &str;

    fn endpoint(&self) -> &str;

    /// Query string (without `?`) for a run on `today`
    fn query(&self, today: NaiveDate) -> String;

    /// A1 range the rows replace
    fn target_range(&self) -> &str;

    fn build_rows(&self, items: Vec<Value>) -> Vec<Row>;
}

/// Result of one successful pipeline pass
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub name: String,
    pub range: String,
    pub rows_written: usize,
}

/// Fetch, shape, clear, write. A failed fetch returns before the sheet is
/// touched; the clear always completes before the write starts.
pub async fn run_report(
    source: &dyn InventoryDataSource,
    writer: &dyn SheetWriter,
    spreadsheet_id: &str,
    report: &dyn ReportBuilder,
    today: NaiveDate,
) -> Result<ReportOutcome> {
    let query = report.query(today);
    info!(
        "🚀 Starting {}: {} {}",
        report.name(),
        report.endpoint(),
        if query.is_empty() { "(no filter)" } else { query.as_str() }
    );

    let items = source
        .get_items(report.endpoint(), &query)
        .await
        .with_context(|| format!("fetching {} for {}", report.endpoint(), report.name()))?;

    let rows = report.build_rows(items);
    info!("📊 {}: {} rows for {}", report.name(), rows.len(), report.target_range());

    writer
        .clear(spreadsheet_id, report.target_range())
        .await
        .with_context(|| format!("clearing {}", report.target_range()))?;

    writer
        .write(spreadsheet_id, report.target_range(), &rows)
        .await
        .with_context(|| format!("writing {}", report.target_range()))?;

    Ok(ReportOutcome {
        name: report.name().to_string(),
        range: report.target_range().to_string(),
        rows_written: rows.len(),
    })
}

/// Deserialize list items, dropping (and logging) any that do not fit `T`
pub fn decode_items<T: DeserializeOwned>(endpoint: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping {} item {}: {}", endpoint, index, e);
                None
            }
        })
        .collect()
}
