//! Let the model pick which search results are worth reading

use crate::llm::{ChatModel, ChatRequest, TokenUsage};
use crate::search::{Candidate, NO_SNIPPET, NO_TITLE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionResponse {
    #[serde(default)]
    pub selected_urls: Vec<SelectedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedEntry {
    pub url: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A selected URL enriched with what the search results said about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedUrl {
    pub url: String,
    pub name: String,
    pub snippet: String,
    pub reason: Option<String>,
}

fn system_prompt(quantity: usize) -> String {
    format!(
        r#"Please select up to {quantity} URLs from the provided list that best answer the query. Provide reasons for your selection along with each of the URLs selected in JSON format.
Example format:
{{
    "selected_urls": [
        {{"url": "URL1", "reason": "Reason1"}},
        {{"url": "URL2", "reason": "Reason2"}}
    ]
}}"#
    )
}

/// Ask `model` for the best `quantity` candidates for `query`
pub async fn select_best_urls(
    model: &dyn ChatModel,
    model_name: &str,
    max_tokens: u32,
    query: &str,
    candidates: &[Candidate],
    quantity: usize,
) -> Result<(Vec<SelectedUrl>, TokenUsage)> {
    let listing = serde_json::to_string_pretty(candidates)?;
    let request = ChatRequest {
        model: model_name.to_string(),
        system: system_prompt(quantity),
        user: format!("Query: {query}\n\nURLs:\n{listing}"),
        max_tokens,
        json_response: true,
    };

    let completion = model.complete(&request).await?;
    let selection: SelectionResponse = serde_json::from_str(&completion.text)
        .context("URL selection was not valid JSON")?;

    Ok((
        merge_selection(selection, candidates, quantity),
        completion.usage,
    ))
}

/// Join the model's picks with candidate metadata and cap at `quantity`.
///
/// Picks that do not match a candidate are kept with placeholder metadata.
/// When a URL appears more than once among the candidates, the last one wins.
pub fn merge_selection(
    selection: SelectionResponse,
    candidates: &[Candidate],
    quantity: usize,
) -> Vec<SelectedUrl> {
    let by_url: HashMap<&str, &Candidate> =
        candidates.iter().map(|c| (c.url.as_str(), c)).collect();

    selection
        .selected_urls
        .into_iter()
        .take(quantity)
        .map(|entry| match by_url.get(entry.url.as_str()).copied() {
            Some(candidate) => SelectedUrl {
                url: entry.url,
                name: candidate.name.clone(),
                snippet: candidate.snippet.clone(),
                reason: entry.reason,
            },
            None => SelectedUrl {
                url: entry.url,
                name: NO_TITLE.to_string(),
                snippet: NO_SNIPPET.to_string(),
                reason: entry.reason,
            },
        })
        .collect()
}
