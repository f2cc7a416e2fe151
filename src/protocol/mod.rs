//! Wire protocol shared by the server and the client.
//!
//! The response body of `POST /websearch` is a sequence of JSON objects, one
//! per line, each shaped `{"event": <name>, "data": {...}}`.

mod decoder;

pub use decoder::{DecodeError, Decoded, EventDecoder, DEFAULT_MAX_LINE_BYTES};

use crate::search::SearchResponse;
use serde::{Deserialize, Serialize};

/// Tags the decoder recognises. Anything else is reported as unknown.
pub const KNOWN_EVENTS: &[&str] = &[
    "initial_response",
    "processing_status",
    "url_processed",
    "ai_response",
    "error",
];

/// One event of a streamed search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Sent once, first: the raw search results and the settings in effect
    InitialResponse(InitialResponse),
    ProcessingStatus { status: String },
    /// A page was fetched and read. Carries the page title.
    UrlProcessed { url: String },
    /// A fragment of the markdown answer
    AiResponse { content: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialResponse {
    #[serde(rename = "User Query")]
    pub query: String,

    #[serde(rename = "Bing Search Results")]
    pub search_results: SearchResponse,

    #[serde(rename = "Headers")]
    pub headers: SearchHeaders,
}

/// Effective pipeline settings echoed back to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHeaders {
    #[serde(rename = "Set-Model")]
    pub model: String,

    #[serde(rename = "Max-Tokens")]
    pub max_tokens: u32,

    #[serde(rename = "Initial-Search-Results")]
    pub initial_search_results: u32,

    #[serde(rename = "Deep-Search-Quantity")]
    pub deep_search_quantity: usize,

    #[serde(rename = "Deep-Search-Model")]
    pub deep_search_model: String,

    #[serde(rename = "Deep-Search")]
    pub deep_search: bool,

    #[serde(rename = "Context-Only")]
    pub context_only: bool,
}

impl StreamEvent {
    pub fn status(status: impl Into<String>) -> Self {
        StreamEvent::ProcessingStatus {
            status: status.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    /// Event tag as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::InitialResponse(_) => "initial_response",
            StreamEvent::ProcessingStatus { .. } => "processing_status",
            StreamEvent::UrlProcessed { .. } => "url_processed",
            StreamEvent::AiResponse { .. } => "ai_response",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Serialize as a single newline-terminated line
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
