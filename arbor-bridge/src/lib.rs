// SPDX-License-Identifier: LGPL-3.0-only
//! IPC surface of arbor.
//!
//! A desktop shell talks to the explorer services through newline-delimited
//! JSON requests on a pipe. This crate decodes them, runs them against the
//! services and encodes the replies.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod response;

pub use channel::{decode_line, IpcRequest};
pub use dispatcher::Bridge;
pub use error::BridgeError;
pub use host::serve;
pub use response::{ErrorPayload, Existence, IpcResponse, Success};
