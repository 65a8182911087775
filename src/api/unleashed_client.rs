use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use super::signature::sign;
use super::{ApiError, ApiResponse, InventoryDataSource, ResponseFormat, RetryPolicy, XmlBody};
use crate::models::Config;

const API_NAMESPACE: &str = r#"xmlns="http://api.unleashedsoftware.com/version/1""#;
const NAMESPACE_ATTRIBUTES: &str = concat!(
    r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
    r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
    r#" xmlns="http://api.unleashedsoftware.com/version/1""#,
);

/// Signed client for the Unleashed ERP REST API
pub struct UnleashedClient {
    client: Client,
    base_url: String,
    api_id: String,
    api_key: String,
    retry: RetryPolicy,
}

impl UnleashedClient {
    /// Create a new ERP client
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent("erp-sheets-sync/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.erp_base_url.clone(),
            api_id: config.erp_api_id.clone(),
            api_key: config.erp_api_key.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff_ms),
        })
    }

    /// Base URL, endpoint and query joined and parsed. Parsing percent-encodes
    /// the query once; the result goes on the wire unchanged, so its `query()`
    /// is what gets signed.
    pub fn request_url(&self, endpoint: &str, query: &str) -> Result<Url, ApiError> {
        let raw = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        };
        Ok(Url::parse(&raw)?)
    }

    fn auth_headers(&self, signed: &str, format: ResponseFormat) -> Result<HeaderMap, ApiError> {
        let mime = format.mime_type();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(&mime)?);
        headers.insert(ACCEPT, HeaderValue::from_str(&mime)?);
        headers.insert("api-auth-id", HeaderValue::from_str(&self.api_id)?);
        headers.insert(
            "api-auth-signature",
            HeaderValue::from_str(&sign(signed, &self.api_key))?,
        );
        Ok(headers)
    }

    /// Send once per attempt; only transport failures are retried.
    async fn execute(
        &self,
        method: Method,
        url: &Url,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        let mut retry = 0;
        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            debug!("Making {} request to: {}", method, url);

            match Self::read_response(request).await {
                Ok(response) => {
                    debug!(
                        "ERP response {} ({} bytes): {}",
                        response.status,
                        response.body.len(),
                        response.body
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transport() && retry < self.retry.attempts() => {
                    retry += 1;
                    warn!(
                        "🔄 {} {} failed ({}), retry {}/{}",
                        method,
                        url,
                        e,
                        retry,
                        self.retry.attempts()
                    );
                    self.retry.wait(retry).await;
                }
                Err(e) => {
                    error!("❌ {} {} failed: {}", method, url, e);
                    return Err(e);
                }
            }
        }
    }

    async fn read_response(request: reqwest::RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// GET something from the API. `query` excludes the `?`; pass "" for none.
    /// Error statuses come back as a normal [`ApiResponse`].
    pub async fn get(
        &self,
        endpoint: &str,
        query: &str,
        format: ResponseFormat,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.request_url(endpoint, query)?;
        let headers = self.auth_headers(url.query().unwrap_or(""), format)?;
        self.execute(Method::GET, &url, headers, None).await
    }

    /// POST an object to `{endpoint}/{id}`. The signature covers the empty
    /// string; the API echoes the stored object back.
    pub async fn post(
        &self,
        endpoint: &str,
        id: &str,
        format: ResponseFormat,
        body: String,
    ) -> Result<ApiResponse, ApiError> {
        if id.trim().is_empty() {
            return Err(ApiError::MissingIdentifier(endpoint.to_string()));
        }

        let url = self.request_url(&format!("{}/{}", endpoint, id), "")?;
        let headers = self.auth_headers("", format)?;
        self.execute(Method::POST, &url, headers, Some(body)).await
    }

    /// GET in JSON format
    pub async fn get_json(&self, endpoint: &str, query: &str) -> Result<Value, ApiError> {
        let response = self
            .get(endpoint, query, ResponseFormat::Json)
            .await?
            .error_for_status()?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET in XML format
    pub async fn get_xml(&self, endpoint: &str, query: &str) -> Result<XmlBody, ApiError> {
        let response = self
            .get(endpoint, query, ResponseFormat::Xml)
            .await?
            .error_for_status()?;
        XmlBody::parse(response.body)
    }

    /// POST in JSON format, returning the echoed object
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        id: &str,
        data: &T,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_string(data).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .post(endpoint, id, ResponseFormat::Json, body)
            .await?
            .error_for_status()?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// POST in XML format, returning the echoed object
    pub async fn post_xml(&self, endpoint: &str, id: &str, xml: &str) -> Result<XmlBody, ApiError> {
        let body = prepare_xml_payload(xml);
        let response = self
            .post(endpoint, id, ResponseFormat::Xml, body)
            .await?
            .error_for_status()?;
        XmlBody::parse(response.body)
    }
}

#[async_trait::async_trait]
impl InventoryDataSource for UnleashedClient {
    /// GET a list endpoint and return the records under `Items`
    async fn get_items(&self, endpoint: &str, query: &str) -> Result<Vec<Value>, ApiError> {
        let data = self.get_json(endpoint, query).await?;

        let items = match data.get("Items") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => {
                warn!("{} response has no Items list", endpoint);
                Vec::new()
            }
            Some(other) => {
                return Err(ApiError::Decode(format!(
                    "{} Items is not a list: {}",
                    endpoint, other
                )))
            }
        };

        info!("📦 {} returned {} items", endpoint, items.len());
        Ok(items)
    }
}

/// The API rejects an XML declaration and needs its namespace on the root
/// element.
pub fn prepare_xml_payload(xml: &str) -> String {
    let mut payload = xml.replace(r#"<?xml version="1.0"?>"#, "");

    if !payload.contains(API_NAMESPACE) {
        if let Some(end) = root_tag_end(&payload) {
            let insert_at = if payload[..end].ends_with('/') { end - 1 } else { end };
            payload.insert_str(insert_at, NAMESPACE_ATTRIBUTES);
        }
    }

    payload.trim().to_string()
}

/// Byte offset of the `>` closing the root element's start tag
fn root_tag_end(xml: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(start) = xml[offset..].find('<').map(|i| offset + i) {
        let end = start + xml[start..].find('>')?;
        if !matches!(xml[start + 1..].chars().next(), Some('?') | Some('!')) {
            return Some(end);
        }
        offset = end + 1;
    }
    None
}
