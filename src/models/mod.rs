use serde::Deserialize;
use serde_json::Value;

pub mod config;
pub use config::{AssemblyLineSource, Config, ReportOptions};

/// Rendered in place of any field the ERP left out of a record
pub const PLACEHOLDER: &str = "n/A";

/// One spreadsheet row, written as raw values
pub type Row = Vec<Value>;

/// Product record as returned under `Items` by the `Products` endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductRecord {
    pub product_code: Option<Value>,
    pub product_description: Option<Value>,
    pub unit_of_measure: Option<UnitOfMeasure>,
    pub default_purchase_price: Option<Value>,
    pub product_group: Option<ProductGroup>,
    pub supplier: Option<Supplier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitOfMeasure {
    pub name: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductGroup {
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Supplier {
    pub supplier_name: Option<Value>,
    pub supplier_code: Option<Value>,
    pub supplier_product_code: Option<Value>,
    pub supplier_product_description: Option<Value>,
    pub supplier_product_price: Option<Value>,
}

impl ProductRecord {
    pub fn group_name(&self) -> Option<&str> {
        self.product_group.as_ref()?.group_name.as_deref()
    }

    /// Ten columns, in sheet order
    pub fn to_row(&self) -> Row {
        let supplier = self.supplier.as_ref();
        vec![
            cell(&self.product_code),
            cell(&self.product_description),
            cell(&self.unit_of_measure.as_ref().and_then(|u| u.name.clone())),
            cell(&self.default_purchase_price),
            self.group_name()
                .map(|g| Value::String(g.to_string()))
                .unwrap_or_else(placeholder),
            cell(&supplier.and_then(|s| s.supplier_name.clone())),
            cell(&supplier.and_then(|s| s.supplier_code.clone())),
            cell(&supplier.and_then(|s| s.supplier_product_code.clone())),
            cell(&supplier.and_then(|s| s.supplier_product_description.clone())),
            cell(&supplier.and_then(|s| s.supplier_product_price.clone())),
        ]
    }
}

/// Stock-on-hand line for one product in one warehouse
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockOnHandRecord {
    pub product_code: Option<Value>,
    pub product_group_name: Option<Value>,
    pub product_description: Option<Value>,
    pub warehouse: Option<Value>,
    pub on_purchase: Option<Value>,
    pub qty_on_hand: Option<Value>,
    pub available_qty: Option<Value>,
}

impl StockOnHandRecord {
    /// Seven columns, in sheet order
    pub fn to_row(&self) -> Row {
        vec![
            cell(&self.product_code),
            cell(&self.product_group_name),
            cell(&self.product_description),
            cell(&self.warehouse),
            cell(&self.on_purchase),
            cell(&self.qty_on_hand),
            cell(&self.available_qty),
        ]
    }
}

/// Completed (or otherwise filtered) assembly with its component lines
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssemblyRecord {
    pub assembly_number: Option<Value>,
    pub assembly_lines: Option<Vec<AssemblyLine>>,
}

impl AssemblyRecord {
    pub fn lines(&self) -> &[AssemblyLine] {
        self.assembly_lines.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssemblyLine {
    pub product: Option<LineProduct>,
    pub quantity: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineProduct {
    pub product_code: Option<Value>,
    pub product_description: Option<Value>,
}

impl AssemblyLine {
    /// Four columns, in sheet order
    pub fn to_row(&self, assembly_number: &Option<Value>) -> Row {
        let product = self.product.as_ref();
        vec![
            cell(assembly_number),
            cell(&product.and_then(|p| p.product_code.clone())),
            cell(&product.and_then(|p| p.product_description.clone())),
            cell(&self.quantity),
        ]
    }
}

fn placeholder() -> Value {
    Value::String(PLACEHOLDER.to_string())
}

/// JSON `null` counts as missing, same as an absent key.
fn cell(value: &Option<Value>) -> Value {
    match value {
        Some(Value::Null) | None => placeholder(),
        Some(v) => v.clone(),
    }
}
