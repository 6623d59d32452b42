// SPDX-License-Identifier: LGPL-3.0-only
//! Routes decoded requests to the accessor, the root strategy and the
//! query forwarder.

use crate::channel::{decode_line, IpcRequest};
use crate::error::BridgeError;
use crate::response::{Existence, IpcResponse, Success};
use arbor_services::filesystem::{select_accessor, FileSystemAccessor};
use arbor_services::places::{downloads_dir, trash_dir, trash_listing};
use arbor_services::query::{AssistantMessage, QueryError, QueryForwarder};
use arbor_services::roots::{enumerate_roots, select_root_enumerator, HostProbe, RootEnumerator};
use arbor_services::settings::Config;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a request may touch. Built once per host process.
pub struct Bridge {
    accessor: Arc<dyn FileSystemAccessor>,
    roots: Box<dyn RootEnumerator>,
    forwarder: QueryForwarder,
    trash: Option<PathBuf>,
}

impl Bridge {
    pub fn new(
        accessor: Arc<dyn FileSystemAccessor>,
        roots: Box<dyn RootEnumerator>,
        forwarder: QueryForwarder,
        trash: Option<PathBuf>,
    ) -> Self {
        Self {
            accessor,
            roots,
            forwarder,
            trash,
        }
    }

    /// Wire the bridge for the running host.
    pub fn from_config(config: &Config) -> Self {
        let accessor = select_accessor(config.explorer.backend.unwrap_or_default());
        let roots = select_root_enumerator(&HostProbe::detect(), accessor.clone());
        let forwarder = QueryForwarder::new(&config.assistant, accessor.clone());
        Self::new(accessor, roots, forwarder, trash_dir())
    }

    pub fn accessor(&self) -> &Arc<dyn FileSystemAccessor> {
        &self.accessor
    }

    pub fn roots(&self) -> &dyn RootEnumerator {
        self.roots.as_ref()
    }

    /// Decode, dispatch and answer one request line.
    pub async fn handle_line(&self, line: &str) -> IpcResponse {
        let (id, request) = decode_line(line);
        let result = match request {
            Ok(request) => {
                log::debug!("ipc {} (id {})", request.channel(), id);
                self.dispatch(request).await
            },
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => IpcResponse::success(id, value),
            Err(e) => {
                log::warn!("ipc request {} failed: {}", id, e);
                IpcResponse::failure(id, &e)
            },
        }
    }

    /// Run one request.
    pub async fn dispatch(&self, request: IpcRequest) -> Result<Value, BridgeError> {
        let fs = &self.accessor;
        match request {
            IpcRequest::ListDirectory { path } => json(fs.list(path.as_deref()).await?),
            IpcRequest::GetFileDetails { path } => json(fs.details(&path).await?),
            IpcRequest::MoveFile { src, dst } => {
                fs.move_entry(&src, &dst).await?;
                json(Success::OK)
            },
            IpcRequest::CopyFile { src, dst } => {
                fs.copy_entry(&src, &dst).await?;
                json(Success::OK)
            },
            IpcRequest::DeleteFile { path } => {
                fs.delete(&path).await?;
                json(Success::OK)
            },
            IpcRequest::CreateDirectory { path } => {
                fs.create_directory(&path).await?;
                json(Success::OK)
            },
            IpcRequest::ReadFile { path } => json(fs.read_text(&path).await?),
            IpcRequest::WriteFile { path, content } => {
                fs.write_text(&path, &content).await?;
                json(Success::OK)
            },
            IpcRequest::GetRootDirectories => json(enumerate_roots(self.roots.as_ref()).await),
            IpcRequest::GetRecycleBin => {
                json(trash_listing(&**fs, self.trash.as_deref()).await)
            },
            IpcRequest::CheckPath { path } => json(Existence {
                exists: fs.exists(&path).await,
            }),
            IpcRequest::GetDownloadsPath => {
                let path = downloads_dir().await.ok_or(BridgeError::NoDownloads)?;
                json(path)
            },
            IpcRequest::AiGenerate { prompt } => {
                assistant_reply(self.forwarder.generate(&prompt).await)
            },
            IpcRequest::AiSummarize { filepath } => {
                assistant_reply(self.forwarder.summarize(&filepath).await)
            },
            IpcRequest::AiSearch { query, start_dir } => {
                assistant_reply(self.forwarder.search(&query, start_dir.as_deref()).await)
            },
        }
    }
}

fn json<T: Serialize>(value: T) -> Result<Value, BridgeError> {
    Ok(serde_json::to_value(value)?)
}

/// Service failures become an inline message; rejected input stays an error.
fn assistant_reply(result: Result<AssistantMessage, QueryError>) -> Result<Value, BridgeError> {
    match result {
        Ok(message) => json(message),
        Err(e @ (QueryError::ServiceUnavailable(_) | QueryError::Decode(_))) => {
            log::warn!("assistant service failed: {}", e);
            json(e.to_message())
        },
        Err(e) => Err(e.into()),
    }
}
