use thiserror::Error;

use crate::models::Row;

pub mod google_sheets_client;
pub use google_sheets_client::GoogleSheetsClient;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("spreadsheet authentication failed: {0}")]
    Auth(String),

    #[error("could not load spreadsheet credentials: {0}")]
    Credentials(String),

    #[error("spreadsheet transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("spreadsheet API returned status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("invalid spreadsheet request: {0}")]
    InvalidRequest(String),
}

/// Destination for report rows, addressed by document id and A1 range
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SheetWriter: Send + Sync {
    /// Empty every cell in `range`
    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<(), SheetsError>;

    /// Write `rows` from the top-left of `range`, values taken as-is
    async fn write(&self, spreadsheet_id: &str, range: &str, rows: &[Row])
        -> Result<(), SheetsError>;
}
