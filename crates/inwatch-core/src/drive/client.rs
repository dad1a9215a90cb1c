//! Google Drive v3 REST client.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use tracing::{debug, trace};

use super::RemoteStore;
use crate::auth::TokenSource;
use crate::error::DriveError;
use crate::models::remote::{FileList, RemoteFile};

/// Fields requested from `files.list`.
const LIST_FIELDS: &str = "files(id, name)";

/// Drive client authenticated through a [`TokenSource`].
pub struct DriveClient {
    http: reqwest::Client,
    api_base: String,
    tokens: Box<dyn TokenSource>,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, tokens: Box<dyn TokenSource>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// HTTP client shared by the Drive and token requests.
    pub fn http_client() -> Result<reqwest::Client, DriveError> {
        Ok(reqwest::Client::builder()
            .user_agent(concat!("inwatch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?)
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    fn media_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_base, file_id)
    }
}

/// Search query for files of `mime_type` directly inside `folder_id`.
pub fn folder_query(folder_id: &str, mime_type: &str) -> String {
    format!(
        "'{}' in parents and mimeType='{}'",
        escape_query_value(folder_id),
        escape_query_value(mime_type)
    )
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Map a non-success response to a [`DriveError`].
async fn check_status(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::FORBIDDEN {
        return Err(DriveError::PermissionDenied(resource.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(DriveError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn list_files(&self, folder_id: &str, mime_type: &str) -> Result<Vec<RemoteFile>, DriveError> {
        let token = self.tokens.access_token().await?;
        let query = folder_query(folder_id, mime_type);
        debug!(%query, "Listing Drive folder");

        let response = self
            .http
            .get(self.files_url())
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", LIST_FIELDS)])
            .send()
            .await?;
        let response = check_status(response, folder_id).await?;

        let list: FileList = response.json().await?;
        Ok(list.files)
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(self.media_url(file_id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = check_status(response, file_id).await?;

        let mut file = File::create(dest)?;

        // Stream download chunk by chunk
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            trace!(file_id, downloaded, "Received chunk");
        }

        file.flush()?;
        Ok(downloaded)
    }
}
