use chrono::NaiveDate;
use serde_json::Value;

use super::{decode_items, ReportBuilder};
use crate::models::{ProductRecord, Row};

/// Product groups the purchasing sheet tracks
pub const DEFAULT_PRODUCT_GROUPS: &[&str] = &[
    "Additives",
    "Cartons",
    "Coconut Cream",
    "Cultures",
    "Fruit Preps & Flavours",
    "Ingredients",
    "Jars & Lids",
    "Labels",
    "Thickeners",
];

pub const PRODUCTS_RANGE: &str = "Unleashed Import Products!A3:J";

/// All products whose group is on the allow-list, ten columns each
pub struct ProductsReport {
    allowed_groups: Vec<String>,
    range: String,
}

impl ProductsReport {
    pub fn new(allowed_groups: Vec<String>, range: &str) -> Self {
        Self {
            allowed_groups,
            range: range.to_string(),
        }
    }

    pub fn is_allowed(&self, record: &ProductRecord) -> bool {
        record
            .group_name()
            .map(|group| self.allowed_groups.iter().any(|g| g == group))
            .unwrap_or(false)
    }
}

impl Default for ProductsReport {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRODUCT_GROUPS.iter().map(|g| g.to_string()).collect(),
            PRODUCTS_RANGE,
        )
    }
}

impl ReportBuilder for ProductsReport {
    fn name(&self) -> &str {
        "products"
    }

    fn endpoint(&self) -> &str {
        "Products"
    }

    fn query(&self, _today: NaiveDate) -> String {
        String::new()
    }

    fn target_range(&self) -> &str {
        &self.range
    }

    fn build_rows(&self, items: Vec<Value>) -> Vec<Row> {
        decode_items::<ProductRecord>(self.endpoint(), items)
            .iter()
            .filter(|record| self.is_allowed(record))
            .map(ProductRecord::to_row)
            .collect()
    }
}
