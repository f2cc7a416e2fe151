//! Web search backends and the result types passed through to clients

mod bing;

pub use bing::BingSearch;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NO_TITLE: &str = "No title provided";
pub const NO_SNIPPET: &str = "No snippet provided";

#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, count: u32, market: &str) -> Result<SearchResponse>;

    fn name(&self) -> &str;
}

/// A search response.
///
/// Only the fields the pipeline and the renderer read are typed. Everything
/// else is kept in `extra` so the response reaches the client unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "webPages", default, skip_serializing_if = "Option::is_none")]
    pub web_pages: Option<WebPages>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPages {
    #[serde(default)]
    pub value: Vec<WebPage>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    #[serde(rename = "deepLinks", default, skip_serializing_if = "Option::is_none")]
    pub deep_links: Option<Vec<DeepLink>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A URL the selection model may choose from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub name: String,
    pub snippet: String,
}

impl Candidate {
    fn new(url: &str, name: Option<&String>, snippet: Option<&String>) -> Self {
        Self {
            url: url.to_string(),
            name: name.cloned().unwrap_or_else(|| NO_TITLE.to_string()),
            snippet: snippet.cloned().unwrap_or_else(|| NO_SNIPPET.to_string()),
        }
    }
}

impl SearchResponse {
    /// Top-level result pages, empty when the response carried none
    pub fn pages(&self) -> &[WebPage] {
        self.web_pages
            .as_ref()
            .map(|w| w.value.as_slice())
            .unwrap_or(&[])
    }
}

/// Flatten pages and their deep links into candidates, preserving order
pub fn extract_candidates(response: &SearchResponse) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for page in response.pages() {
        candidates.push(Candidate::new(
            &page.url,
            page.name.as_ref(),
            page.snippet.as_ref(),
        ));
        for link in page.deep_links.iter().flatten() {
            candidates.push(Candidate::new(
                &link.url,
                link.name.as_ref(),
                link.snippet.as_ref(),
            ));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SearchResponse {
        serde_json::from_value(json!({
            "_type": "SearchResponse",
            "queryContext": {"originalQuery": "rust async"},
            "webPages": {
                "totalEstimatedMatches": 2,
                "value": [
                    {
                        "id": "0",
                        "name": "Async Book",
                        "url": "https://rust-lang.github.io/async-book/",
                        "snippet": "Asynchronous programming in Rust",
                        "deepLinks": [
                            {"name": "Getting Started", "url": "https://rust-lang.github.io/async-book/01_getting_started/01_chapter.html"},
                            {"url": "https://rust-lang.github.io/async-book/02_execution/01_chapter.html", "snippet": "Under the hood"}
                        ]
                    },
                    {"url": "https://tokio.rs/"}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_candidates_includes_deep_links_in_order() {
        let candidates = extract_candidates(&sample());
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://rust-lang.github.io/async-book/",
                "https://rust-lang.github.io/async-book/01_getting_started/01_chapter.html",
                "https://rust-lang.github.io/async-book/02_execution/01_chapter.html",
                "https://tokio.rs/",
            ]
        );
    }

    #[test]
    fn test_extract_candidates_fills_defaults() {
        let candidates = extract_candidates(&sample());
        assert_eq!(candidates[1].snippet, NO_SNIPPET);
        assert_eq!(candidates[2].name, NO_TITLE);
        assert_eq!(candidates[2].snippet, "Under the hood");
        assert_eq!(candidates[3].name, NO_TITLE);
    }

    #[test]
    fn test_no_web_pages() {
        let response: SearchResponse =
            serde_json::from_value(json!({"_type": "SearchResponse"})).unwrap();
        assert!(response.pages().is_empty());
        assert!(extract_candidates(&response).is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_reserialization() {
        let original = json!({
            "_type": "SearchResponse",
            "webPages": {
                "totalEstimatedMatches": 1,
                "value": [{"id": "0", "name": "Tokio", "url": "https://tokio.rs/", "language": "en"}]
            },
            "rankingResponse": {"mainline": {"items": []}}
        });
        let parsed: SearchResponse = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), original);
    }
}
