//! Concurrent page fetching and HTML to text reduction

use super::selection::SelectedUrl;
use futures::stream::{self, Stream, StreamExt};
use rand::seq::SliceRandom;
use reqwest::{header, Client, StatusCode};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Subtrees that never hold page content
const SKIP_TAGS: &[&str] = &["header", "nav", "footer", "aside", "script", "style"];

/// `div` classes marking dialogs and overlays
const SKIP_DIV_CLASSES: &[&str] = &["modal", "popup", "overlay"];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, Copy)]
pub struct PageTiming {
    pub fetch_start: Instant,
    pub fetch_time: Duration,
    pub parse_start: Instant,
    pub parse_time: Duration,
}

impl PageTiming {
    fn parse_end(&self) -> Instant {
        self.parse_start + self.parse_time
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub content: String,
    pub timing: PageTiming,
}

pub struct PageFetcher {
    client: Client,
    user_agents: Vec<String>,
    timeout: Duration,
    concurrency: usize,
}

impl PageFetcher {
    pub fn new(
        client: Client,
        user_agents: Vec<String>,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            user_agents,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agents.choose(&mut rand::thread_rng()).cloned()
    }

    /// Fetch one page and reduce it to text
    pub async fn fetch(&self, page: &SelectedUrl) -> Result<FetchedPage, FetchError> {
        let mut request = self
            .client
            .get(&page.url)
            .timeout(self.timeout)
            .header(header::ACCEPT, ACCEPT);
        if let Some(agent) = self.user_agent() {
            request = request.header(header::USER_AGENT, agent);
        }

        let fetch_start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        let fetch_time = fetch_start.elapsed();

        let parse_start = Instant::now();
        let content = html_to_text(&body);
        let parse_time = parse_start.elapsed();

        Ok(FetchedPage {
            title: page.name.clone(),
            url: page.url.clone(),
            snippet: page.snippet.clone(),
            content,
            timing: PageTiming {
                fetch_start,
                fetch_time,
                parse_start,
                parse_time,
            },
        })
    }

    /// Fetch all pages with bounded concurrency, yielding in completion order
    pub fn fetch_all<'a>(
        &'a self,
        pages: &'a [SelectedUrl],
    ) -> impl Stream<Item = (&'a SelectedUrl, Result<FetchedPage, FetchError>)> + 'a {
        stream::iter(pages)
            .map(move |page| async move { (page, self.fetch(page).await) })
            .buffer_unordered(self.concurrency)
    }
}

/// Wall time from the first fetch start to the last parse end
pub fn total_content_time(timings: &[PageTiming]) -> Duration {
    let first_start = timings.iter().map(|t| t.fetch_start).min();
    let last_end = timings.iter().map(PageTiming::parse_end).max();
    match (first_start, last_end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start),
        _ => Duration::ZERO,
    }
}

/// Reduce an HTML document to the visible text of its body.
///
/// Navigation, scripts and overlay dialogs are dropped, text nodes are joined
/// with spaces and runs of whitespace collapse to a single space.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    match Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
    {
        Some(body) => collect_text(body, &mut parts),
        None => collect_text(doc.root_element(), &mut parts),
    }

    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_skipped(el: &scraper::node::Element) -> bool {
    let tag = el.name();
    if SKIP_TAGS.contains(&tag) {
        return true;
    }
    tag == "div"
        && el
            .attr("class")
            .is_some_and(|class| SKIP_DIV_CLASSES.iter().any(|c| class.contains(c)))
}

fn collect_text<'a>(node: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => parts.push(text),
            Node::Element(el) if !is_skipped(el) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            _ => {}
        }
    }
}
