//! HTTP clients for the hosted spreadsheet (Sheets v4 values API) and file
//! store (Drive v3). Both authenticate with a bearer token supplied by the
//! caller and wrap every request in [`with_retry`]. File creation is only
//! resent when the store explicitly refused it.

use super::{FileStore, SheetGateway, UploadMetadata, share_url};
use crate::error::GatewayError;
use crate::retry::{RetryConfig, with_retry, with_retry_when};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use uuid::Uuid;

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";

const SHEETS: &str = "spreadsheet service";
const DRIVE: &str = "file store";

fn transport(service: &'static str) -> impl Fn(reqwest::Error) -> GatewayError {
    move |e| GatewayError::Transport {
        service,
        message: e.to_string(),
    }
}

fn decode(service: &'static str) -> impl Fn(reqwest::Error) -> GatewayError {
    move |e| GatewayError::Decode {
        service,
        message: e.to_string(),
    }
}

async fn check(service: &'static str, response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    token: String,
    retry: RetryConfig,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: &str, sheet_name: &str, token: &str) -> Self {
        SheetsClient {
            http: Client::new(),
            base_url: SHEETS_API.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            token: token.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Prefix a range with the quoted worksheet title
    fn qualified(&self, range: &str) -> String {
        format!("'{}'!{}", self.sheet_name.replace('\'', "''"), range)
    }

    fn values_url(&self, qualified: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(qualified)
        )
    }
}

#[async_trait]
impl SheetGateway for SheetsClient {
    async fn get(&self, range: &str) -> Result<Vec<Vec<String>>, GatewayError> {
        let url = self.values_url(&self.qualified(range));
        let url = &url;
        debug!("sheets get {}", range);

        let body: ValueRange = with_retry(&self.retry, "sheets get", move || async move {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.token)
                .query(&[("majorDimension", "ROWS")])
                .send()
                .await
                .map_err(transport(SHEETS))?;
            check(SHEETS, response)
                .await?
                .json::<ValueRange>()
                .await
                .map_err(decode(SHEETS))
        })
        .await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn update(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), GatewayError> {
        let qualified = self.qualified(range);
        let url = self.values_url(&qualified);
        let body = ValueRangeBody {
            range: &qualified,
            major_dimension: "ROWS",
            values: &values,
        };
        let (url, body) = (&url, &body);
        debug!("sheets update {} ({} rows)", range, values.len());

        with_retry(&self.retry, "sheets update", move || async move {
            let response = self
                .http
                .put(url)
                .bearer_auth(&self.token)
                .query(&[("valueInputOption", "USER_ENTERED")])
                .json(body)
                .send()
                .await
                .map_err(transport(SHEETS))?;
            check(SHEETS, response).await.map(|_| ())
        })
        .await
    }
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

pub struct DriveClient {
    http: Client,
    api_base: String,
    upload_base: String,
    token: String,
    share_host: String,
    retry: RetryConfig,
}

impl DriveClient {
    pub fn new(token: &str, share_host: &str) -> Self {
        DriveClient {
            http: Client::new(),
            api_base: DRIVE_API.to_string(),
            upload_base: DRIVE_UPLOAD_API.to_string(),
            token: token.to_string(),
            share_host: share_host.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Body of a `multipart/related` upload: JSON metadata, then the media
fn related_body(boundary: &str, metadata: &str, mime_type: &str, media: &[u8]) -> Bytes {
    let mut body = Vec::with_capacity(media.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            concat!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n",
                "{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n"
            ),
            b = boundary,
            m = metadata,
            t = mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    Bytes::from(body)
}

#[async_trait]
impl FileStore for DriveClient {
    async fn upload(
        &self,
        local_path: &Path,
        mime_type: &str,
        metadata: &UploadMetadata,
    ) -> Result<String, GatewayError> {
        let media = tokio::fs::read(local_path).await?;
        let metadata_json = serde_json::to_string(metadata).map_err(|e| GatewayError::Decode {
            service: DRIVE,
            message: e.to_string(),
        })?;
        let boundary = format!("proof_{}", Uuid::new_v4().simple());
        let body = related_body(&boundary, &metadata_json, mime_type, &media);
        let content_type = format!("multipart/related; boundary={}", boundary);
        let url = format!("{}/files?uploadType=multipart&fields=id", self.upload_base);
        let (url, body, content_type) = (&url, &body, &content_type);
        debug!("uploading {} ({} bytes)", metadata.name, media.len());

        // A timed-out create may still have stored the file, so only resend
        // when the store refused the request outright
        let file: DriveFile = with_retry_when(
            &self.retry,
            "file upload",
            GatewayError::is_safe_to_resend,
            move || async move {
                let response = self
                    .http
                    .post(url)
                    .bearer_auth(&self.token)
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(body.clone())
                    .send()
                    .await
                    .map_err(transport(DRIVE))?;
                check(DRIVE, response)
                    .await?
                    .json::<DriveFile>()
                    .await
                    .map_err(decode(DRIVE))
            },
        )
        .await?;

        Ok(file.id)
    }

    async fn set_public_readable(&self, object_id: &str) -> Result<(), GatewayError> {
        let url = format!(
            "{}/files/{}/permissions",
            self.api_base,
            urlencoding::encode(object_id)
        );
        let permission = json!({ "type": "anyone", "role": "reader" });
        let (url, permission) = (&url, &permission);

        with_retry(&self.retry, "grant public read", move || async move {
            let response = self
                .http
                .post(url)
                .bearer_auth(&self.token)
                .json(permission)
                .send()
                .await
                .map_err(transport(DRIVE))?;
            check(DRIVE, response).await.map(|_| ())
        })
        .await
    }

    fn public_url(&self, object_id: &str) -> String {
        share_url(&self.share_host, object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_qualified_and_encoded() {
        let client = SheetsClient::new("sheet-key", "SCM FORWARD", "token")
            .with_base_url("http://localhost:9/v4/");
        let qualified = client.qualified("B5:FA");
        assert_eq!(qualified, "'SCM FORWARD'!B5:FA");
        assert_eq!(
            client.values_url(&qualified),
            "http://localhost:9/v4/spreadsheets/sheet-key/values/%27SCM%20FORWARD%27%21B5%3AFA"
        );
    }

    #[test]
    fn related_body_frames_metadata_then_media() {
        let body = related_body("xyz", r#"{"name":"A_proof.mp4"}"#, "video/mp4", b"DATA");
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("--xyz\r\nContent-Type: application/json"));
        assert!(text.contains(
            "{\"name\":\"A_proof.mp4\"}\r\n--xyz\r\nContent-Type: video/mp4\r\n\r\nDATA"
        ));
        assert!(text.ends_with("\r\n--xyz--\r\n"));
    }

    #[test]
    fn non_string_cells_are_rendered_as_text() {
        assert_eq!(cell_text(json!("x")), "x");
        assert_eq!(cell_text(json!(3)), "3");
        assert_eq!(cell_text(Value::Null), "");
    }
}
