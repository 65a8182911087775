use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::{SheetWriter, SheetsError};
use crate::models::{Config, Row};

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// OAuth "authorized user" credentials file
#[derive(Debug, Deserialize)]
struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

/// Service-account key file
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug)]
enum Credentials {
    AuthorizedUser(AuthorizedUser),
    ServiceAccount(ServiceAccountKey),
}

impl Credentials {
    /// Pick the shape from the file's `type` field; files without one are
    /// treated as authorized-user credentials
    fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(content)?;
        match value.get("type").and_then(Value::as_str) {
            Some("service_account") => Ok(Self::ServiceAccount(serde_json::from_value(value)?)),
            _ => Ok(Self::AuthorizedUser(serde_json::from_value(value)?)),
        }
    }
}

/// Claims of the JWT-bearer assertion a service account trades for a token
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Google Sheets v4 values client
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    token_url: String,
    credentials_path: String,
    static_token: Option<String>,
    current_token: Arc<Mutex<Option<CachedToken>>>,
}

impl GoogleSheetsClient {
    pub fn new(config: &Config) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent("erp-sheets-sync/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.sheets_base_url.clone(),
            token_url: config.google_token_url.clone(),
            credentials_path: config.google_credentials_path.clone(),
            static_token: config.google_access_token.clone(),
            current_token: Arc::new(Mutex::new(None)),
        })
    }

    fn load_credentials(&self) -> Result<Credentials, SheetsError> {
        let content = fs::read_to_string(&self.credentials_path).map_err(|e| {
            SheetsError::Credentials(format!("{}: {}", self.credentials_path, e))
        })?;
        Credentials::parse(&content)
            .map_err(|e| SheetsError::Credentials(format!("{}: {}", self.credentials_path, e)))
    }

    /// Signed RS256 assertion for the spreadsheets scope
    fn service_account_assertion(
        key: &ServiceAccountKey,
        audience: &str,
    ) -> Result<String, SheetsError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: audience,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Credentials(format!("service account private key: {}", e)))?;
        jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(|e| SheetsError::Credentials(format!("signing token assertion: {}", e)))
    }

    /// Get access token, refreshing if necessary
    async fn access_token(&self) -> Result<String, SheetsError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let mut guard = self.current_token.lock().await;
        if let Some(token) = &*guard {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.access_token.clone());
            }
            debug!("Spreadsheet access token expiring, refreshing");
        }

        let fresh = self.refresh_access_token().await?;
        let access_token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(access_token)
    }

    /// Trade the stored credentials for a new access token: a refresh token
    /// for authorized users, a signed assertion for service accounts
    async fn refresh_access_token(&self) -> Result<CachedToken, SheetsError> {
        let (token_url, params): (String, Vec<(&str, String)>) = match self.load_credentials()? {
            Credentials::AuthorizedUser(user) => (
                self.token_url.clone(),
                vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("client_id", user.client_id),
                    ("client_secret", user.client_secret),
                    ("refresh_token", user.refresh_token),
                ],
            ),
            Credentials::ServiceAccount(key) => {
                let token_url = key.token_uri.clone().unwrap_or_else(|| self.token_url.clone());
                let assertion = Self::service_account_assertion(&key, &token_url)?;
                debug!("Requesting spreadsheet token for {}", key.client_email);
                (
                    token_url,
                    vec![
                        ("grant_type", JWT_BEARER_GRANT.to_string()),
                        ("assertion", assertion),
                    ],
                )
            }
        };

        let response = self.client.post(&token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(SheetsError::Auth(format!(
                "token refresh failed with status {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await?;
        info!("🔑 Obtained spreadsheet access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`, range encoded as
    /// a single path segment
    pub fn values_url(
        &self,
        spreadsheet_id: &str,
        range: &str,
        suffix: &str,
    ) -> Result<Url, SheetsError> {
        let last = format!("{}{}", range, suffix);
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidRequest(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", last.as_str()]);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<(), SheetsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SheetsError::Auth(format!("status {}: {}", status, body)));
        }
        Err(SheetsError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl SheetWriter for GoogleSheetsClient {
    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<(), SheetsError> {
        let url = self.values_url(spreadsheet_id, range, ":clear")?;
        let token = self.access_token().await?;

        debug!("Clearing {} in {}", range, spreadsheet_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;

        Self::check(response).await?;
        info!("🧹 Cleared {}", range);
        Ok(())
    }

    async fn write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Row],
    ) -> Result<(), SheetsError> {
        if rows.is_empty() {
            warn!("No rows to write to {}, leaving it empty", range);
            return Ok(());
        }

        let mut url = self.values_url(spreadsheet_id, range, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.access_token().await?;

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });

        debug!("Writing {} rows to {} in {}", rows.len(), range, spreadsheet_id);
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        info!("📝 Wrote {} rows to {}", rows.len(), range);
        Ok(())
    }
}
