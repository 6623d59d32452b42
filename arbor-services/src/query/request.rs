//! Request shapes sent to the assistant service.

use serde::Serialize;
use std::path::PathBuf;

/// One of the three requests the assistant service understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// Free-form generation from a prompt.
    Generate { prompt: String },
    /// Summarize the document at an absolute path.
    Summarize {
        filepath: PathBuf,
        max_length: u32,
        overlap: u32,
    },
    /// Find the indexed file best matching `query`, optionally below `start_dir`.
    Search {
        query: String,
        start_dir: Option<PathBuf>,
    },
}

impl QueryRequest {
    /// Endpoint path relative to the service base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryRequest::Generate { .. } => "/ai-assistant",
            QueryRequest::Summarize { .. } => "/summarize-document",
            QueryRequest::Search { .. } => "/search-files",
        }
    }

    /// JSON body of the request.
    pub fn body(&self) -> serde_json::Value {
        let body = match self {
            QueryRequest::Generate { prompt } => serde_json::to_value(GenerateBody {
                action: "generate",
                params: GenerateParams { prompt },
            }),
            QueryRequest::Summarize {
                filepath,
                max_length,
                overlap,
            } => serde_json::to_value(SummarizeBody {
                filepath,
                max_length: *max_length,
                overlap: *overlap,
            }),
            QueryRequest::Search { query, start_dir } => serde_json::to_value(SearchBody {
                query,
                start_dir: start_dir.as_ref(),
            }),
        };
        // Plain structs of strings and integers always serialize.
        body.unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    action: &'static str,
    params: GenerateParams<'a>,
}

#[derive(Serialize)]
struct GenerateParams<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    filepath: &'a PathBuf,
    max_length: u32,
    overlap: u32,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_dir: Option<&'a PathBuf>,
}
