use chrono::NaiveDate;
use serde_json::Value;

use super::{decode_items, ReportBuilder};
use crate::models::{Row, StockOnHandRecord};

/// Every stock-on-hand line for one warehouse, seven columns, unfiltered
pub struct StockOnHandReport {
    name: String,
    warehouse_code: String,
    range: String,
}

impl StockOnHandReport {
    pub fn new(name: &str, warehouse_code: &str, range: &str) -> Self {
        Self {
            name: name.to_string(),
            warehouse_code: warehouse_code.to_string(),
            range: range.to_string(),
        }
    }

    pub fn warehouse_code(&self) -> &str {
        &self.warehouse_code
    }
}

impl ReportBuilder for StockOnHandReport {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        "StockOnHand"
    }

    fn query(&self, _today: NaiveDate) -> String {
        format!("warehouseCode={}", self.warehouse_code)
    }

    fn target_range(&self) -> &str {
        &self.range
    }

    fn build_rows(&self, items: Vec<Value>) -> Vec<Row> {
        decode_items::<StockOnHandRecord>(self.endpoint(), items)
            .iter()
            .map(StockOnHandRecord::to_row)
            .collect()
    }
}
