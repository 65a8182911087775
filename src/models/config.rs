use std::time::Duration;

/// Which line list the trailing-window assembly report flattens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyLineSource {
    /// Every assembly contributes its own lines
    Own,
    /// Every assembly is paired with the first assembly's lines. This is how
    /// the twelve-week sheet has always been filled; kept selectable until the
    /// sheet owners confirm it was unintended.
    First,
}

impl AssemblyLineSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "own" => Some(Self::Own),
            "first" => Some(Self::First),
            _ => None,
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub erp_api_id: String,
    pub erp_api_key: String,
    pub erp_base_url: String,
    pub spreadsheet_id: String,
    pub sheets_base_url: String,
    pub google_token_url: String,
    pub google_credentials_path: String,
    pub google_access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub reports: ReportOptions,
}

/// Settings that shape the report catalogue. Loadable without credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub product_groups: Option<Vec<String>>,
    pub assembly_line_source: AssemblyLineSource,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            product_groups: None,
            assembly_line_source: AssemblyLineSource::First,
        }
    }
}

impl ReportOptions {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let assembly_line_source = match lookup("ASSEMBLY_LINE_SOURCE") {
            Some(raw) => AssemblyLineSource::parse(&raw).ok_or_else(|| {
                anyhow::anyhow!("ASSEMBLY_LINE_SOURCE must be 'first' or 'own', got '{}'", raw)
            })?,
            None => AssemblyLineSource::First,
        };

        Ok(Self {
            product_groups: lookup("PRODUCT_GROUPS").map(|raw| {
                raw.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect()
            }),
            assembly_line_source,
        })
    }
}

pub const DEFAULT_ERP_BASE_URL: &str = "https://api.unleashedsoftware.com/";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))
        };

        let reports = ReportOptions::from_lookup(&lookup)?;

        Ok(Config {
            erp_api_id: required("ERP_API_ID")?,
            erp_api_key: required("ERP_API_KEY")?,
            spreadsheet_id: required("SPREADSHEET_ID")?,
            erp_base_url: with_trailing_slash(
                lookup("ERP_API_BASE_URL").unwrap_or_else(|| DEFAULT_ERP_BASE_URL.to_string()),
            ),
            sheets_base_url: lookup("SHEETS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
            google_token_url: lookup("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URL.to_string()),
            google_credentials_path: lookup("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|| "credentials.json".to_string()),
            google_access_token: lookup("GOOGLE_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            retry_attempts: lookup("RETRY_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            retry_backoff_ms: lookup("RETRY_BACKOFF_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            reports,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configuration pointing both services at the given base URLs
    #[cfg(test)]
    pub(crate) fn for_endpoints(erp_base_url: &str, sheets_base_url: &str) -> Self {
        Config {
            erp_api_id: "test-api-id".to_string(),
            erp_api_key: "test-api-key".to_string(),
            erp_base_url: erp_base_url.to_string(),
            spreadsheet_id: "test-spreadsheet".to_string(),
            sheets_base_url: sheets_base_url.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
            google_credentials_path: "credentials.json".to_string(),
            google_access_token: Some("test-access-token".to_string()),
            request_timeout_secs: 5,
            retry_attempts: 0,
            retry_backoff_ms: 10,
            reports: ReportOptions::default(),
        }
    }
}

/// Endpoints are appended to the base verbatim, so it must end in `/`
fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
