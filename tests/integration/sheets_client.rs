//! Spreadsheet client against a mock HTTP server

use assert_matches::assert_matches;
use erp_sheets_sync::sheets::{GoogleSheetsClient, SheetWriter, SheetsError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::test_config;

#[tokio::test]
async fn test_write_uses_raw_input() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/doc-1/values/.+$"))
        .and(query_param("valueInputOption", "RAW"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleSheetsClient::new(&test_config("http://unused", &server.uri())).unwrap();
    let rows = vec![vec![json!("=SUM(A1:A2)"), json!(3)]];
    client.write("doc-1", "Unleashed Import SOH!A3:G", &rows).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["values"], json!([["=SUM(A1:A2)", 3]]));
    assert_eq!(body["range"], json!("Unleashed Import SOH!A3:G"));
    assert_eq!(body["majorDimension"], json!("ROWS"));
}

#[tokio::test]
async fn test_write_with_no_rows_sends_nothing() {
    let server = MockServer::start().await;
    let client = GoogleSheetsClient::new(&test_config("http://unused", &server.uri())).unwrap();

    client.write("doc-1", "Unleashed Import SOH!A3:G", &[]).await.unwrap();
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_failure_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r":clear$"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unable to parse range"))
        .mount(&server)
        .await;

    let client = GoogleSheetsClient::new(&test_config("http://unused", &server.uri())).unwrap();
    assert_matches!(
        client.clear("doc-1", "No Such Sheet!A1").await,
        Err(SheetsError::Remote { status: 400, body }) if body.contains("Unable to parse range")
    );
}

#[tokio::test]
async fn test_refresh_token_flow_caches_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r":clear$"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let mut credentials = tempfile::NamedTempFile::new().unwrap();
    write!(
        credentials,
        r#"{{"client_id":"cid","client_secret":"cs","refresh_token":"rt","type":"authorized_user"}}"#
    )
    .unwrap();

    let mut config = test_config("http://unused", &server.uri());
    config.google_access_token = None;
    config.google_token_url = format!("{}/token", server.uri());
    config.google_credentials_path = credentials.path().to_string_lossy().to_string();

    let client = GoogleSheetsClient::new(&config).unwrap();
    client.clear("doc-1", "Unleashed Import Products!A3:J").await.unwrap();
    client.clear("doc-1", "Unleashed Import SOH!A3:G").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let form = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(form.contains("grant_type=refresh_token"));
    assert!(form.contains("refresh_token=rt"));
}

#[tokio::test]
async fn test_rejected_refresh_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let mut credentials = tempfile::NamedTempFile::new().unwrap();
    write!(
        credentials,
        r#"{{"client_id":"cid","client_secret":"cs","refresh_token":"revoked"}}"#
    )
    .unwrap();

    let mut config = test_config("http://unused", &server.uri());
    config.google_access_token = None;
    config.google_token_url = format!("{}/token", server.uri());
    config.google_credentials_path = credentials.path().to_string_lossy().to_string();

    let client = GoogleSheetsClient::new(&config).unwrap();
    assert_matches!(
        client.clear("doc-1", "Unleashed Import SOH!A3:G").await,
        Err(SheetsError::Auth(msg)) if msg.contains("invalid_grant")
    );
}

const SERVICE_ACCOUNT_KEY: &str = include_str!("../fixtures/service_account_key.pem");
const SERVICE_ACCOUNT_PUBLIC_KEY: &str = include_str!("../fixtures/service_account_public.pem");

#[tokio::test]
async fn test_service_account_key_exchanges_signed_assertion() {
    let server = MockServer::start().await;
    let token_uri = format!("{}/token", server.uri());
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "service-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r":clear$"))
        .and(header("authorization", "Bearer service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let key_file = json!({
        "type": "service_account",
        "project_id": "dairy-ops",
        "private_key_id": "key-1",
        "private_key": SERVICE_ACCOUNT_KEY,
        "client_email": "sheets-sync@dairy-ops.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    });
    let mut credentials = tempfile::NamedTempFile::new().unwrap();
    write!(credentials, "{}", key_file).unwrap();

    let mut config = test_config("http://unused", &server.uri());
    config.google_access_token = None;
    config.google_token_url = "http://127.0.0.1:1/unused-token".to_string();
    config.google_credentials_path = credentials.path().to_string_lossy().to_string();

    let client = GoogleSheetsClient::new(&config).unwrap();
    client.clear("doc-1", "Unleashed Import SOH!A3:G").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let form: HashMap<String, String> = url::form_urlencoded::parse(&requests[0].body)
        .into_owned()
        .collect();
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[token_uri.as_str()]);
    let assertion = decode::<Value>(
        &form["assertion"],
        &DecodingKey::from_rsa_pem(SERVICE_ACCOUNT_PUBLIC_KEY.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap();

    assert_eq!(assertion.header.kid.as_deref(), Some("key-1"));
    assert_eq!(
        assertion.claims["iss"],
        json!("sheets-sync@dairy-ops.iam.gserviceaccount.com")
    );
    assert_eq!(
        assertion.claims["scope"],
        json!("https://www.googleapis.com/auth/spreadsheets")
    );
}
