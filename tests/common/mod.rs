//! Common test utilities and helpers

use erp_sheets_sync::models::{Config, ReportOptions};

/// Test data utilities
pub mod test_data {
    use serde_json::{json, Value};

    /// Product as the ERP returns it, optionally without a group
    pub fn create_test_product(code: &str, group: Option<&str>) -> Value {
        let mut product = json!({
            "ProductCode": code,
            "ProductDescription": format!("{} description", code),
            "UnitOfMeasure": { "Name": "EA" },
            "DefaultPurchasePrice": 4.25,
            "Supplier": {
                "SupplierName": "Kiwi Packaging",
                "SupplierCode": "KPL",
                "SupplierProductCode": format!("KPL-{}", code),
                "SupplierProductDescription": "Packaging item",
                "SupplierProductPrice": 4.1
            }
        });
        if let Some(group) = group {
            product["ProductGroup"] = json!({ "GroupName": group });
        }
        product
    }

    pub fn create_test_stock_on_hand(code: &str, warehouse: &str, qty: f64) -> Value {
        json!({
            "ProductCode": code,
            "ProductGroupName": "Ingredients",
            "ProductDescription": format!("{} description", code),
            "Warehouse": warehouse,
            "OnPurchase": 0,
            "QtyOnHand": qty,
            "AvailableQty": qty
        })
    }

    pub fn create_test_assembly(number: &str, line_codes: &[&str]) -> Value {
        let lines: Vec<Value> = line_codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                json!({
                    "Product": { "ProductCode": code, "ProductDescription": format!("{} description", code) },
                    "Quantity": (i + 1) as f64
                })
            })
            .collect();
        json!({ "AssemblyNumber": number, "AssemblyLines": lines })
    }

    /// `{"Items": [...]}` list envelope
    pub fn items(items: Vec<Value>) -> Value {
        json!({ "Items": items })
    }
}

/// Configuration pointing both clients at local mock servers
pub fn test_config(erp_uri: &str, sheets_uri: &str) -> Config {
    Config {
        erp_api_id: "test-api-id".to_string(),
        erp_api_key: "test-api-key".to_string(),
        erp_base_url: format!("{}/", erp_uri),
        spreadsheet_id: "test-spreadsheet".to_string(),
        sheets_base_url: sheets_uri.to_string(),
        google_token_url: format!("{}/token", sheets_uri),
        google_credentials_path: "credentials.json".to_string(),
        google_access_token: Some("test-access-token".to_string()),
        request_timeout_secs: 5,
        retry_attempts: 0,
        retry_backoff_ms: 10,
        reports: ReportOptions::default(),
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another harness may already own the global subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("erp_sheets_sync=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }
}
