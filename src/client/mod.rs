//! Client for the `/websearch` endpoint

mod view;

pub use view::{ResultItem, ResultView, ViewUpdate, NO_RESULTS};

use crate::protocol::{DecodeError, Decoded, EventDecoder};
use anyhow::{bail, Context, Result};
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("stream interrupted: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    /// Whether the stream can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::Decode(DecodeError::Json { .. } | DecodeError::InvalidUtf8)
        )
    }
}

pub struct SearchClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SearchClient {
    pub fn new(endpoint: String, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post `query` and decode the response body as it arrives
    pub async fn search(
        &self,
        query: &str,
    ) -> Result<impl Stream<Item = Result<Decoded, StreamError>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP error! status: {}", status.as_u16());
        }

        Ok(decode_stream(response.bytes_stream()))
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: EventDecoder,
    ready: VecDeque<Result<Decoded, DecodeError>>,
    finished: bool,
}

/// Turn a chunked byte stream into decoded events.
///
/// A transport error ends the stream after being yielded once.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Result<Decoded, StreamError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: EventDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item.map_err(StreamError::from), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let decoded = state.decoder.push(chunk.as_ref());
                    state.ready.extend(decoded);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(StreamError::Transport(Box::new(e))), state));
                }
                None => {
                    state.finished = true;
                    state.ready.extend(state.decoder.finish());
                }
            }
        }
    })
}
