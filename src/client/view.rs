use crate::protocol::{Decoded, StreamEvent};
use crate::search::{NO_SNIPPET, NO_TITLE};
use serde::Serialize;

pub const NO_RESULTS: &str = "No results found.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// What changed after applying one event
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Results,
    Status(String),
    /// First fragment of the answer; status and spinner go away
    AnswerStarted(String),
    AnswerDelta(String),
    Error(String),
    Ignored,
}

/// Render state built up from the event stream
#[derive(Debug, Default)]
pub struct ResultView {
    pub query: String,
    pub results: Vec<ResultItem>,
    /// Set once `initial_response` arrived
    pub results_loaded: bool,
    pub status: Option<String>,
    pub answer: String,
    pub errors: Vec<String>,
    answer_started: bool,
}

impl ResultView {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, decoded: &Decoded) -> ViewUpdate {
        let event = match decoded {
            Decoded::Event(event) => event,
            Decoded::Unknown(tag) => {
                tracing::debug!(event = %tag, "ignoring unknown event");
                return ViewUpdate::Ignored;
            }
        };

        match event {
            StreamEvent::InitialResponse(initial) => {
                self.results = initial
                    .search_results
                    .pages()
                    .iter()
                    .map(|page| ResultItem {
                        title: page.name.clone().unwrap_or_else(|| NO_TITLE.to_string()),
                        url: page.url.clone(),
                        snippet: page
                            .snippet
                            .clone()
                            .unwrap_or_else(|| NO_SNIPPET.to_string()),
                    })
                    .collect();
                self.results_loaded = true;
                ViewUpdate::Results
            }
            StreamEvent::ProcessingStatus { status } => self.set_status(status.clone()),
            StreamEvent::UrlProcessed { url } => self.set_status(format!("Processed: {}", url)),
            StreamEvent::AiResponse { content } => {
                self.answer.push_str(content);
                if self.answer_started {
                    ViewUpdate::AnswerDelta(content.clone())
                } else {
                    self.answer_started = true;
                    self.status = None;
                    ViewUpdate::AnswerStarted(content.clone())
                }
            }
            StreamEvent::Error { message } => {
                self.errors.push(message.clone());
                ViewUpdate::Error(message.clone())
            }
        }
    }

    fn set_status(&mut self, status: String) -> ViewUpdate {
        self.status = Some(status.clone());
        ViewUpdate::Status(status)
    }

    pub fn answer_started(&self) -> bool {
        self.answer_started
    }

    /// Results to display; `None` means say "No results found."
    pub fn visible_results(&self) -> Option<&[ResultItem]> {
        (!self.results.is_empty()).then_some(self.results.as_slice())
    }
}
