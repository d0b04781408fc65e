//! Google Sheets source.
//!
//! Authenticates with a service-account key, finds the spreadsheet by title
//! through the Drive API, and reads a worksheet as records: the first row
//! holds headers, every later row becomes one [`InputRow`].
//!
//! [`InputRow`]: crate::models::InputRow

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::credentials::{ServiceAccountKey, TokenResponse};
use super::{ensure_unique_headers, RowSource, SourceError};
use crate::models::{CellValue, SourceTable};

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Errors from the Google APIs.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Spreadsheet not found: '{0}'")]
    SpreadsheetNotFound(String),

    #[error("Worksheet '{worksheet}' not found in spreadsheet '{spreadsheet}'")]
    WorksheetNotFound {
        spreadsheet: String,
        worksheet: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Configuration for the Sheets client.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet title as shown in Drive
    pub spreadsheet: String,

    /// Worksheet (tab) title
    pub worksheet: String,

    /// Request timeout
    pub timeout: Duration,

    pub sheets_base_url: String,

    pub drive_base_url: String,

    /// User agent string
    pub user_agent: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet: String::new(),
            worksheet: String::new(),
            timeout: Duration::from_secs(30),
            sheets_base_url: "https://sheets.googleapis.com".to_string(),
            drive_base_url: "https://www.googleapis.com".to_string(),
            user_agent: format!("schedule-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A spreadsheet located in Drive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Spreadsheet {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<Spreadsheet>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// An authorized Google API client.
pub struct SheetsClient {
    client: Client,
    config: SheetsConfig,
    access_token: String,
}

impl SheetsClient {
    /// Exchange the service-account key for an access token.
    pub async fn authorize(key: &ServiceAccountKey, config: SheetsConfig) -> Result<Self, SheetsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("schedule-sync")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        info!("Authenticating as {}", key.client_email);
        let assertion = key.signed_assertion(Utc::now())?;

        let response = client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Authentication(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!("Access token expires in {:?}s", token.expires_in);

        Ok(Self {
            client,
            config,
            access_token: token.access_token,
        })
    }

    /// Find a spreadsheet by its exact title. The first match wins.
    pub async fn open(&self, title: &str) -> Result<Spreadsheet, SheetsError> {
        let url = Url::parse(&self.config.drive_base_url)?.join("drive/v3/files")?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            title.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME_TYPE
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let list: FileList = check_status(response).await?.json().await?;
        list.files
            .into_iter()
            .next()
            .ok_or_else(|| SheetsError::SpreadsheetNotFound(title.to_string()))
    }

    /// Titles of every worksheet in the spreadsheet, in tab order.
    pub async fn worksheet_titles(&self, spreadsheet: &Spreadsheet) -> Result<Vec<String>, SheetsError> {
        let mut url = self.spreadsheet_url(spreadsheet)?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let metadata: SpreadsheetMetadata = check_status(response).await?.json().await?;
        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    /// Raw cell grid of a worksheet, header row included.
    pub async fn worksheet_values(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &str,
    ) -> Result<Vec<Vec<serde_json::Value>>, SheetsError> {
        let titles = self.worksheet_titles(spreadsheet).await?;
        if !titles.iter().any(|t| t == worksheet) {
            return Err(SheetsError::WorksheetNotFound {
                spreadsheet: spreadsheet.name.clone(),
                worksheet: worksheet.to_string(),
            });
        }

        let mut url = self.spreadsheet_url(spreadsheet)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push("values")
            .push(&a1_sheet_range(worksheet));

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let range: ValueRange = check_status(response).await?.json().await?;
        Ok(range.values)
    }

    /// Read a worksheet the way gspread's `get_all_records` does.
    pub async fn get_all_records(
        &self,
        spreadsheet: &Spreadsheet,
        worksheet: &str,
    ) -> Result<SourceTable, SourceError> {
        let values = self.worksheet_values(spreadsheet, worksheet).await?;
        records_from_values(values)
    }

    fn spreadsheet_url(&self, spreadsheet: &Spreadsheet) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.config.sheets_base_url)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet.id.as_str()]);
        Ok(url)
    }
}

/// Map non-success responses to [`SheetsError::HttpStatus`].
async fn check_status(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .ok()
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

    Err(SheetsError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

/// A1 range covering a whole worksheet: the quoted title.
fn a1_sheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Build a table from a raw value grid whose first row is the header.
pub fn records_from_values(values: Vec<Vec<serde_json::Value>>) -> Result<SourceTable, SourceError> {
    let mut rows = values.into_iter();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(value_to_string).collect(),
        None => return Ok(SourceTable::default()),
    };

    let grid = rows.map(|row| row.iter().map(value_to_cell).collect::<Vec<_>>());
    let table = SourceTable::from_grid(headers, grid);
    ensure_unique_headers(&table.headers)?;
    Ok(table)
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_cell(value: &serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::String(s) => CellValue::numericise(s),
        serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
        serde_json::Value::Bool(b) => CellValue::Bool(*b),
        _ => CellValue::Empty,
    }
}

/// A worksheet in a Google Sheets spreadsheet.
pub struct SheetsSource {
    key: ServiceAccountKey,
    config: SheetsConfig,
}

impl SheetsSource {
    /// Credentials are passed in explicitly; this type never reads the
    /// process environment.
    pub fn new(key: ServiceAccountKey, config: SheetsConfig) -> Self {
        Self { key, config }
    }
}

#[async_trait]
impl RowSource for SheetsSource {
    fn name(&self) -> &'static str {
        "google-sheets"
    }

    fn describe(&self) -> String {
        format!(
            "Google Sheet '{}' (Worksheet: '{}')",
            self.config.spreadsheet, self.config.worksheet
        )
    }

    async fn load(&self) -> Result<SourceTable, SourceError> {
        let client = SheetsClient::authorize(&self.key, self.config.clone()).await?;
        let spreadsheet = client.open(&self.config.spreadsheet).await?;
        debug!("Opened spreadsheet {} ({})", spreadsheet.name, spreadsheet.id);

        let table = client
            .get_all_records(&spreadsheet, &self.config.worksheet)
            .await?;
        info!("Successfully loaded {} rows", table.len());
        Ok(table)
    }
}
