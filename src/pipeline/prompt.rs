//! Answer prompt construction

use super::fetch::FetchedPage;
use crate::search::Candidate;
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a research assistant answering a user's question from web pages that were just read on their behalf.

Rules:
- Answer in well-structured Markdown: short paragraphs, bullet lists where they help, fenced code blocks for code.
- Base the answer on the contextual content. When the content does not cover something, say so instead of guessing.
- Cite sources inline as Markdown links using the page title and URL given with each piece of content.
- Lead with the direct answer, then supporting detail.
"#;

/// Load the system prompt from `path`, or use the built-in one
pub fn load_system_prompt(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            let prompt = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt: {}", path.display()))?;
            tracing::info!(path = %path.display(), "system prompt loaded from file");
            Ok(prompt)
        }
        None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

/// User message built from the pages that were read
pub fn build_user_message(query: &str, pages: &[FetchedPage]) -> String {
    let context = pages
        .iter()
        .map(|p| format!("{} {} {}", p.title, p.url, p.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("User Message: {query}\nContextual Content: {context}")
}

/// User message built from search snippets alone, used when pages are not read
pub fn build_snippet_message(query: &str, candidates: &[Candidate]) -> String {
    let context = candidates
        .iter()
        .map(|c| format!("{} {} {}", c.name, c.url, c.snippet))
        .collect::<Vec<_>>()
        .join("\n");
    format!("User Message: {query}\nContextual Content: {context}")
}
