// SPDX-License-Identifier: LGPL-3.0-only
//! HTTP client relaying queries to the assistant service.

use crate::filesystem::FileSystemAccessor;
use crate::query::error::QueryError;
use crate::query::request::QueryRequest;
use crate::query::response::{AssistantMessage, GenerateEnvelope, SearchEnvelope, SummarizeEnvelope};
use crate::settings::{
    AssistantSettings, DEFAULT_ASSISTANT_TIMEOUT_SECS, DEFAULT_ASSISTANT_URL,
    DEFAULT_SUMMARY_MAX_LENGTH, DEFAULT_SUMMARY_OVERLAP,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Forwards generate, summarize and search requests to the assistant service.
///
/// Failures never touch navigation state; callers either propagate the
/// [`QueryError`] or render it with [`QueryForwarder::ask`].
pub struct QueryForwarder {
    client: reqwest::Client,
    base_url: String,
    accessor: Arc<dyn FileSystemAccessor>,
    summary_max_length: u32,
    summary_overlap: u32,
}

impl QueryForwarder {
    /// Build a forwarder from the `[assistant]` settings.
    pub fn new(settings: &AssistantSettings, accessor: Arc<dyn FileSystemAccessor>) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(DEFAULT_ASSISTANT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to create HTTP client, using default config: {}", e);
                reqwest::Client::new()
            });
        let base_url = settings
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_ASSISTANT_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            client,
            base_url,
            accessor,
            summary_max_length: settings.summary_max_length.unwrap_or(DEFAULT_SUMMARY_MAX_LENGTH),
            summary_overlap: settings.summary_overlap.unwrap_or(DEFAULT_SUMMARY_OVERLAP),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the model to answer `prompt`.
    pub async fn generate(&self, prompt: &str) -> Result<AssistantMessage, QueryError> {
        if prompt.trim().is_empty() {
            return Err(QueryError::EmptyInput("prompt"));
        }
        let request = QueryRequest::Generate {
            prompt: prompt.to_string(),
        };
        let envelope: GenerateEnvelope = self.post(&request).await?;
        Ok(envelope.into_message())
    }

    /// Summarize the document at `filepath`, which must be absolute and exist.
    pub async fn summarize(&self, filepath: &Path) -> Result<AssistantMessage, QueryError> {
        self.summarize_with(filepath, self.summary_max_length, self.summary_overlap)
            .await
    }

    /// Summarize with explicit length and chunk overlap.
    pub async fn summarize_with(
        &self,
        filepath: &Path,
        max_length: u32,
        overlap: u32,
    ) -> Result<AssistantMessage, QueryError> {
        if !filepath.is_absolute() {
            return Err(QueryError::InvalidPath(filepath.display().to_string()));
        }
        if !self.accessor.exists(filepath).await {
            return Err(QueryError::NotFound(filepath.to_path_buf()));
        }
        let request = QueryRequest::Summarize {
            filepath: filepath.to_path_buf(),
            max_length,
            overlap,
        };
        let envelope: SummarizeEnvelope = self.post(&request).await?;
        Ok(envelope.into_message())
    }

    /// Find the indexed file best matching `query`.
    pub async fn search(&self, query: &str, start_dir: Option<&Path>) -> Result<AssistantMessage, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::EmptyInput("query"));
        }
        let request = QueryRequest::Search {
            query: query.to_string(),
            start_dir: start_dir
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from),
        };
        let envelope: SearchEnvelope = self.post(&request).await?;
        Ok(envelope.into_message())
    }

    /// Forward any request and normalize the reply.
    pub async fn forward(&self, request: &QueryRequest) -> Result<AssistantMessage, QueryError> {
        match request {
            QueryRequest::Generate { prompt } => self.generate(prompt).await,
            QueryRequest::Summarize {
                filepath,
                max_length,
                overlap,
            } => self.summarize_with(filepath, *max_length, *overlap).await,
            QueryRequest::Search { query, start_dir } => self.search(query, start_dir.as_deref()).await,
        }
    }

    /// Like [`forward`](Self::forward), but failures become an inline message.
    pub async fn ask(&self, request: &QueryRequest) -> AssistantMessage {
        match self.forward(request).await {
            Ok(message) => message,
            Err(e) => {
                log::warn!("assistant request to {} failed: {}", request.endpoint(), e);
                e.to_message()
            },
        }
    }

    async fn post<T: DeserializeOwned>(&self, request: &QueryRequest) -> Result<T, QueryError> {
        let url = format!("{}{}", self.base_url, request.endpoint());
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request.body())
            .send()
            .await
            .map_err(|e| QueryError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string));
            let reason = match detail {
                Some(detail) => format!("{} ({})", status, detail),
                None => status.to_string(),
            };
            return Err(QueryError::ServiceUnavailable(reason));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))
    }
}
