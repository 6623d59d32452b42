// SPDX-License-Identifier: LGPL-3.0-only
//! Request decoding.
//!
//! A request line is `{"id": .., "channel": "list-directory", "args": [..]}`.
//! Arguments are positional, the way a renderer passes them to an invoke call.

use crate::error::BridgeError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// A decoded IPC request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    ListDirectory { path: Option<PathBuf> },
    GetFileDetails { path: PathBuf },
    MoveFile { src: PathBuf, dst: PathBuf },
    CopyFile { src: PathBuf, dst: PathBuf },
    DeleteFile { path: PathBuf },
    CreateDirectory { path: PathBuf },
    ReadFile { path: PathBuf },
    WriteFile { path: PathBuf, content: String },
    GetRootDirectories,
    GetRecycleBin,
    CheckPath { path: PathBuf },
    GetDownloadsPath,
    AiGenerate { prompt: String },
    AiSummarize { filepath: PathBuf },
    AiSearch { query: String, start_dir: Option<PathBuf> },
}

impl IpcRequest {
    /// Build a request from its channel name and positional arguments.
    pub fn from_parts(channel: &str, args: Vec<Value>) -> Result<Self, BridgeError> {
        let args = Args { channel, values: args };
        let request = match channel {
            "list-directory" => IpcRequest::ListDirectory {
                path: args.optional(0)?,
            },
            "get-file-details" => IpcRequest::GetFileDetails {
                path: args.required(0, "path")?,
            },
            "move-file" => IpcRequest::MoveFile {
                src: args.required(0, "source")?,
                dst: args.required(1, "destination")?,
            },
            "copy-file" => IpcRequest::CopyFile {
                src: args.required(0, "source")?,
                dst: args.required(1, "destination")?,
            },
            "delete-file" => IpcRequest::DeleteFile {
                path: args.required(0, "path")?,
            },
            "create-directory" => IpcRequest::CreateDirectory {
                path: args.required(0, "path")?,
            },
            "read-file" => IpcRequest::ReadFile {
                path: args.required(0, "path")?,
            },
            "write-file" => IpcRequest::WriteFile {
                path: args.required(0, "path")?,
                content: args.required(1, "content")?,
            },
            "get-root-directories" => IpcRequest::GetRootDirectories,
            "get-recycle-bin" => IpcRequest::GetRecycleBin,
            "check-path" => IpcRequest::CheckPath {
                path: args.required(0, "path")?,
            },
            "get-downloads-path" => IpcRequest::GetDownloadsPath,
            "ai-generate" => IpcRequest::AiGenerate {
                prompt: args.required(0, "prompt")?,
            },
            "ai-summarize" => IpcRequest::AiSummarize {
                filepath: args.required(0, "filepath")?,
            },
            "ai-search" => IpcRequest::AiSearch {
                query: args.required(0, "query")?,
                start_dir: args.optional(1)?,
            },
            other => return Err(BridgeError::UnknownChannel(other.to_string())),
        };
        Ok(request)
    }

    /// Channel name, for logs.
    pub fn channel(&self) -> &'static str {
        match self {
            IpcRequest::ListDirectory { .. } => "list-directory",
            IpcRequest::GetFileDetails { .. } => "get-file-details",
            IpcRequest::MoveFile { .. } => "move-file",
            IpcRequest::CopyFile { .. } => "copy-file",
            IpcRequest::DeleteFile { .. } => "delete-file",
            IpcRequest::CreateDirectory { .. } => "create-directory",
            IpcRequest::ReadFile { .. } => "read-file",
            IpcRequest::WriteFile { .. } => "write-file",
            IpcRequest::GetRootDirectories => "get-root-directories",
            IpcRequest::GetRecycleBin => "get-recycle-bin",
            IpcRequest::CheckPath { .. } => "check-path",
            IpcRequest::GetDownloadsPath => "get-downloads-path",
            IpcRequest::AiGenerate { .. } => "ai-generate",
            IpcRequest::AiSummarize { .. } => "ai-summarize",
            IpcRequest::AiSearch { .. } => "ai-search",
        }
    }
}

struct Args<'a> {
    channel: &'a str,
    values: Vec<Value>,
}

impl Args<'_> {
    fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, BridgeError> {
        match self.values.get(index) {
            Some(Value::Null) | None => Err(BridgeError::BadRequest(format!(
                "{} expects a {} argument",
                self.channel, name
            ))),
            Some(value) => self.decode(value.clone(), name),
        }
    }

    /// Missing, `null` and empty-string arguments all read as `None`.
    fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, BridgeError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => self.decode(value.clone(), "optional").map(Some),
        }
    }

    fn decode<T: DeserializeOwned>(&self, value: Value, name: &str) -> Result<T, BridgeError> {
        serde_json::from_value(value).map_err(|e| {
            BridgeError::BadRequest(format!("{}: bad {} argument: {}", self.channel, name, e))
        })
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    id: Value,
    channel: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Decode one request line.
///
/// The request id is returned even when the rest of the line is invalid,
/// so the error reply can still be correlated.
pub fn decode_line(line: &str) -> (Value, Result<IpcRequest, BridgeError>) {
    let raw: RawEnvelope = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").cloned())
                .unwrap_or(Value::Null);
            return (id, Err(BridgeError::BadRequest(e.to_string())));
        },
    };
    let request = IpcRequest::from_parts(&raw.channel, raw.args);
    (raw.id, request)
}
