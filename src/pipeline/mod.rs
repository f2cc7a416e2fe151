//! Deep search pipeline: search, pick, read, answer.
//!
//! Every step reports progress as a [`StreamEvent`] on a bounded channel. A
//! closed channel means the client went away, and the pipeline stops before
//! calling any further upstream service.

mod fetch;
mod prompt;
mod selection;

pub use fetch::{html_to_text, total_content_time, FetchError, FetchedPage, PageFetcher, PageTiming};
pub use prompt::{build_snippet_message, build_user_message, load_system_prompt, DEFAULT_SYSTEM_PROMPT};
pub use selection::{merge_selection, select_best_urls, SelectedUrl, SelectionResponse};

use crate::llm::{ChatModel, ChatRequest};
use crate::protocol::{InitialResponse, SearchHeaders, StreamEvent};
use crate::search::{extract_candidates, SearchEngine};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub const STATUS_SELECTING: &str = "Determining which Search results to leverage...";
pub const STATUS_READING: &str = "Visiting pages and reading contents...";
pub const STATUS_GENERATING: &str = "Generating response from OpenAI...";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub initial_results: u32,
    pub market: String,
    pub answer_model: String,
    pub selection_model: String,
    pub max_tokens: u32,
    pub deep_search: bool,
    pub deep_search_quantity: usize,
    pub context_only: bool,
}

#[derive(Debug, Error)]
enum PipelineError {
    #[error("client disconnected")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
}

impl Emitter {
    async fn send(&self, event: StreamEvent) -> Result<(), PipelineError> {
        self.tx.send(event).await.map_err(|_| PipelineError::Cancelled)
    }
}

pub struct SearchPipeline {
    engine: Arc<dyn SearchEngine>,
    model: Arc<dyn ChatModel>,
    fetcher: PageFetcher,
    settings: PipelineSettings,
    system_prompt: String,
}

impl SearchPipeline {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        model: Arc<dyn ChatModel>,
        fetcher: PageFetcher,
        settings: PipelineSettings,
        system_prompt: String,
    ) -> Self {
        Self {
            engine,
            model,
            fetcher,
            settings,
            system_prompt,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn headers(&self) -> SearchHeaders {
        let s = &self.settings;
        SearchHeaders {
            model: s.answer_model.clone(),
            max_tokens: s.max_tokens,
            initial_search_results: s.initial_results,
            deep_search_quantity: s.deep_search_quantity,
            deep_search_model: s.selection_model.clone(),
            deep_search: s.deep_search,
            context_only: s.context_only,
        }
    }

    /// Run the whole pipeline for `query`, reporting into `tx`.
    ///
    /// Failures are reported as a final `error` event rather than returned.
    pub async fn run(&self, query: &str, tx: mpsc::Sender<StreamEvent>) {
        let emitter = Emitter { tx };
        match self.execute(query, &emitter).await {
            Ok(()) => tracing::info!(query, "search completed"),
            Err(PipelineError::Cancelled) => {
                tracing::info!(query, "client disconnected, search abandoned")
            }
            Err(PipelineError::Failed(e)) => {
                tracing::error!(query, error = %format!("{e:#}"), "search failed");
                let _ = emitter
                    .send(StreamEvent::error(format!("An error occurred: {e}")))
                    .await;
            }
        }
    }

    async fn execute(&self, query: &str, emitter: &Emitter) -> Result<(), PipelineError> {
        let s = &self.settings;

        let response = self
            .engine
            .search(query, s.initial_results, &s.market)
            .await?;
        let candidates = extract_candidates(&response);

        emitter
            .send(StreamEvent::InitialResponse(InitialResponse {
                query: query.to_string(),
                search_results: response,
                headers: self.headers(),
            }))
            .await?;

        let user_message = if s.deep_search {
            emitter.send(StreamEvent::status(STATUS_SELECTING)).await?;
            let selected = if candidates.is_empty() {
                Vec::new()
            } else {
                let (selected, usage) = select_best_urls(
                    self.model.as_ref(),
                    &s.selection_model,
                    s.max_tokens,
                    query,
                    &candidates,
                    s.deep_search_quantity,
                )
                .await?;
                tracing::debug!(
                    selected = selected.len(),
                    total_tokens = usage.total_tokens,
                    "urls selected"
                );
                selected
            };

            emitter.send(StreamEvent::status(STATUS_READING)).await?;
            let pages = self.read_pages(&selected, emitter).await?;
            build_user_message(query, &pages)
        } else {
            build_snippet_message(query, &candidates)
        };

        if s.context_only {
            return Ok(());
        }

        emitter.send(StreamEvent::status(STATUS_GENERATING)).await?;
        let request = ChatRequest {
            model: s.answer_model.clone(),
            system: self.system_prompt.clone(),
            user: user_message,
            max_tokens: s.max_tokens,
            json_response: false,
        };

        let mut deltas = self.model.stream(&request).await?;
        while let Some(delta) = deltas.next().await {
            emitter
                .send(StreamEvent::AiResponse { content: delta? })
                .await?;
        }

        Ok(())
    }

    async fn read_pages(
        &self,
        selected: &[SelectedUrl],
        emitter: &Emitter,
    ) -> Result<Vec<FetchedPage>, PipelineError> {
        let mut pages = Vec::with_capacity(selected.len());
        let fetches = self.fetcher.fetch_all(selected);
        futures::pin_mut!(fetches);

        while let Some((page, result)) = fetches.next().await {
            match result {
                Ok(fetched) => {
                    tracing::debug!(
                        url = %fetched.url,
                        fetch_ms = fetched.timing.fetch_time.as_millis() as u64,
                        parse_ms = fetched.timing.parse_time.as_millis() as u64,
                        chars = fetched.content.len(),
                        "page read"
                    );
                    emitter
                        .send(StreamEvent::UrlProcessed {
                            url: fetched.title.clone(),
                        })
                        .await?;
                    pages.push(fetched);
                }
                Err(e) => tracing::warn!(url = %page.url, error = %e, "failed to read page"),
            }
        }

        let timings: Vec<PageTiming> = pages.iter().map(|p| p.timing).collect();
        tracing::info!(
            pages = pages.len(),
            requested = selected.len(),
            elapsed_ms = total_content_time(&timings).as_millis() as u64,
            "pages read"
        );

        Ok(pages)
    }
}
