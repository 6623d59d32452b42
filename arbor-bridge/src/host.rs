// SPDX-License-Identifier: LGPL-3.0-only
//! JSON-lines host loop.
//!
//! Reads one request per line, runs each on its own task and writes the
//! responses back as they complete, so replies may arrive out of order.

use crate::dispatcher::Bridge;
use crate::response::IpcResponse;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Serve requests from `reader` until it reaches end of input.
///
/// Returns once every accepted request has been answered.
pub async fn serve<R, W>(bridge: Arc<Bridge>, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<IpcResponse>(100);

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_string(&response)?;
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<_, io::Error>(())
    });

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let bridge = bridge.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = bridge.handle_line(&line).await;
            if tx.send(response).await.is_err() {
                log::error!("response writer is gone, dropping reply");
            }
        });
    }
    log::debug!("ipc input closed");
    drop(tx);

    writer_task.await.map_err(io::Error::other)?
}
