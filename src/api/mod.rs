use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod signature;
pub mod unleashed_client;
pub use unleashed_client::UnleashedClient;

/// Representation requested from (and sent to) the ERP API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }

    /// Value for both `Content-Type` and `Accept`
    pub fn mime_type(&self) -> String {
        format!("application/{}", self.as_str())
    }
}

/// Raw HTTP outcome. Produced for every status code, since the ERP reports
/// failures as structured payloads in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ApiError::Remote`], keeping the body.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Remote {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// XML document returned by the ERP, checked to be well-formed
#[derive(Debug, Clone, PartialEq)]
pub struct XmlBody {
    text: String,
}

impl XmlBody {
    pub fn parse(text: String) -> Result<Self, ApiError> {
        roxmltree::Document::parse(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn document(&self) -> Result<roxmltree::Document<'_>, ApiError> {
        roxmltree::Document::parse(&self.text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Text of every element with the given local name, in document order
    pub fn texts_of(&self, tag: &str) -> Result<Vec<String>, ApiError> {
        Ok(self
            .document()?
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == tag)
            .filter_map(|n| n.text().map(str::to_string))
            .collect())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ERP API returned status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("could not decode ERP response: {0}")]
    Decode(String),

    #[error("POST to {0} requires an object identifier")]
    MissingIdentifier(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    /// Network-level failures are the only ones worth retrying
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Bounded retry with exponential backoff for transport failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            attempts,
            base_delay_ms,
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    pub async fn wait(&self, retry: u32) {
        tokio::time::sleep(self.delay_for(retry)).await;
    }
}

/// Source of ERP list endpoints (`Items` arrays)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InventoryDataSource: Send + Sync {
    async fn get_items(&self, endpoint: &str, query: &str) -> Result<Vec<Value>, ApiError>;
}
