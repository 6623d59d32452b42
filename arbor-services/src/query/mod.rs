//! Query forwarding to the external assistant service.
//!
//! Three request shapes go out, three reply envelopes come back, and all of
//! them are normalized into one [`AssistantMessage`].

mod client;
mod error;
mod request;
mod response;

pub use client::QueryForwarder;
pub use error::{QueryError, UNAVAILABLE_MESSAGE};
pub use request::QueryRequest;
pub use response::{
    AssistantMessage, GenerateEnvelope, Role, SearchEnvelope, SummarizeEnvelope, TopMatch,
    EMPTY_REPLY, NO_MATCH,
};
