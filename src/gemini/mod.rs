//! Gemini API client.
//!
//! Uploads transcript documents through the file API, waits for them to
//! become active, and answers chat prompts with the uploaded corpus attached
//! as context. Transient API failures are retried at this boundary.

mod retry;

pub use retry::RetryPolicy;

use crate::config::GeminiSettings;
use crate::error::{Result, SnakkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generation calls can take a while on long contexts.
const HTTP_TIMEOUT_SECS: u64 = 300;

const TRANSCRIPT_MIME_TYPE: &str = "text/plain";

/// One file known to the file API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub uri: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<UploadedFile>,
    next_page_token: Option<String>,
}

/// One conversation turn sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

/// One part of a turn: either text or a reference to an uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file_data: None,
        }
    }

    pub fn file(uri: impl Into<String>) -> Self {
        Self {
            text: None,
            file_data: Some(FileData {
                file_uri: uri.into(),
                mime_type: TRANSCRIPT_MIME_TYPE.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    pub file_uri: String,
    pub mime_type: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    settings: GeminiSettings,
    retry: RetryPolicy,
    uploaded: Vec<UploadedFile>,
}

impl GeminiClient {
    pub fn new(api_key: String, settings: GeminiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        let retry = RetryPolicy::new(
            settings.max_retries,
            settings.initial_backoff_ms,
            settings.max_backoff_ms,
        );

        Ok(Self {
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            http,
            settings,
            retry,
            uploaded: Vec::new(),
        })
    }

    /// Files uploaded during this session.
    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploaded
    }

    pub fn model_name(&self) -> &str {
        &self.settings.model
    }

    /// Upload one document and wait for the service to finish processing it.
    pub async fn upload_file(&mut self, path: &Path) -> Result<UploadedFile> {
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("transcript.txt")
            .to_string();

        debug!("Uploading {}", display_name);
        let contents = tokio::fs::read_to_string(path).await?;

        let mut file = self
            .retry
            .run("file upload", || {
                self.request_upload(&display_name, &contents)
            })
            .await?;

        let deadline =
            Instant::now() + Duration::from_secs(self.settings.upload_timeout_seconds);
        while file.state == "PROCESSING" {
            if Instant::now() >= deadline {
                return Err(SnakkError::Upload(format!(
                    "{} still processing after {}s",
                    file.name, self.settings.upload_timeout_seconds
                )));
            }
            tokio::time::sleep(Duration::from_secs(self.settings.upload_poll_seconds)).await;
            file = self.get_file(&file.name).await?;
        }

        if file.state == "FAILED" {
            return Err(SnakkError::Upload(format!(
                "processing failed for {}",
                display_name
            )));
        }

        info!("Uploaded {} as {}", display_name, file.name);
        self.uploaded.push(file.clone());
        Ok(file)
    }

    /// Generate a response for the given conversation turns.
    pub async fn generate(&self, contents: &[Content]) -> Result<String> {
        self.retry
            .run("generate content", || self.request_generate(contents))
            .await
    }

    /// All files the service currently holds, across pages.
    pub async fn list_files(&self) -> Result<Vec<UploadedFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/v1beta/files?key={}&pageSize=100",
                self.base_url, self.api_key
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(token);
            }

            let response = self.http.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(SnakkError::Gemini(
                    http_error_message("file list failed", response).await,
                ));
            }

            let payload: FileListResponse = response.json().await?;
            files.extend(payload.files);

            match payload.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(files)
    }

    /// Delete one file by its resource name (`files/...`).
    pub async fn delete_file(&self, name: &str) -> Result<()> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);

        let response = self.http.delete(&url).send().await?;
        if !response.status().is_success() {
            return Err(SnakkError::Gemini(
                http_error_message("file delete failed", response).await,
            ));
        }

        debug!("Deleted {}", name);
        Ok(())
    }

    /// Delete every file the service holds. Individual failures are logged
    /// and skipped so one stuck file does not block the rest.
    pub async fn clear_all_files(&mut self) -> Result<usize> {
        let files = self.list_files().await?;
        let mut deleted = 0;

        for file in &files {
            match self.delete_file(&file.name).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Could not delete {}: {}", file.name, e),
            }
        }

        self.uploaded.clear();
        info!("Cleared {} file(s)", deleted);
        Ok(deleted)
    }

    async fn request_upload(&self, display_name: &str, contents: &str) -> Result<UploadedFile> {
        let url = format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        );
        let metadata = serde_json::json!({ "file": { "display_name": display_name } });

        let form = reqwest::multipart::Form::new()
            .text("metadata", metadata.to_string())
            .text("file", contents.to_string());

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SnakkError::Upload(
                http_error_message("upload failed", response).await,
            ));
        }

        let payload: FileResponse = response.json().await?;
        Ok(payload.file)
    }

    async fn get_file(&self, name: &str) -> Result<UploadedFile> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SnakkError::Upload(
                http_error_message("file status check failed", response).await,
            ));
        }

        Ok(response.json().await?)
    }

    async fn request_generate(&self, contents: &[Content]) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.settings.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&GenerateRequest { contents })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SnakkError::Gemini(
                http_error_message("generate failed", response).await,
            ));
        }

        let payload: GenerateResponse = response.json().await?;
        extract_text(payload)
    }
}

/// Pull the answer text out of a generate response.
fn extract_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| SnakkError::Gemini("response carried no candidates".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(SnakkError::Gemini("response carried no text".to_string()));
    }
    Ok(text)
}

/// Build an `HTTP <status>: ...` message so retry classification keeps the code.
async fn http_error_message(context: &str, response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    format!("HTTP {}: {}: {}", status, context, body)
}
