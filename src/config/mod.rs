//! Configuration module - handles loading and merging configs

mod defaults;
mod loader;

pub use defaults::*;

use crate::cli::Args;
use crate::pipeline::PipelineSettings;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub deep_search: DeepSearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Where `websearch serve` listens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

/// Bing Custom Search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_bing_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub custom_config_id: Option<String>,

    #[serde(default = "default_market")]
    pub market: String,

    #[serde(default = "default_initial_results")]
    pub initial_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model that writes the answer
    #[serde(default = "default_model")]
    pub model: String,

    /// Model that picks which pages to read
    #[serde(default = "default_model")]
    pub selection_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_quantity")]
    pub quantity: usize,

    /// Stop after reading pages, without generating an answer
    #[serde(default)]
    pub context_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// System prompt file; `~` and env vars are expanded
    #[serde(default)]
    pub system_prompt_path: Option<String>,
}

// Default value functions
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_bing_endpoint() -> String {
    DEFAULT_BING_ENDPOINT.to_string()
}

fn default_market() -> String {
    DEFAULT_MARKET.to_string()
}

fn default_initial_results() -> u32 {
    5
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> usize {
    3
}

fn default_fetch_timeout() -> u64 {
    5
}

fn default_concurrency() -> usize {
    10
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_bing_endpoint(),
            api_key: None,
            custom_config_id: None,
            market: default_market(),
            initial_results: default_initial_results(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_model(),
            selection_model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for DeepSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quantity: default_quantity(),
            context_only: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            concurrency: default_concurrency(),
            user_agents: default_user_agents(),
        }
    }
}

/// Credentials the server cannot start without
#[derive(Debug, Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub bing_api_key: String,
    pub custom_config_id: String,
}

impl Config {
    /// Apply CLI argument overrides (these take precedence over everything)
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref endpoint) = args.endpoint {
            self.client.endpoint = endpoint.clone();
        }
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        self
    }

    /// Settings the pipeline runs with
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            initial_results: self.search.initial_results,
            market: self.search.market.clone(),
            answer_model: self.openai.model.clone(),
            selection_model: self.openai.selection_model.clone(),
            max_tokens: self.openai.max_tokens,
            deep_search: self.deep_search.enabled,
            deep_search_quantity: self.deep_search.quantity,
            context_only: self.deep_search.context_only,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// System prompt path with `~` and environment variables expanded
    pub fn system_prompt_path(&self) -> Option<PathBuf> {
        let raw = self.prompt.system_prompt_path.as_deref()?;
        let expanded = shellexpand::full(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        Some(PathBuf::from(expanded))
    }

    /// Collect the API credentials, naming every missing one
    pub fn credentials(&self) -> Result<Credentials> {
        let mut missing = Vec::new();
        if self.openai.api_key.is_none() {
            missing.push("OpenAI API key (OPENAI_API_KEY or [openai] api_key)");
        }
        if self.search.api_key.is_none() {
            missing.push("Bing subscription key (BING_SUBSCRIPTION_KEY or [search] api_key)");
        }
        if self.search.custom_config_id.is_none() {
            missing.push("Bing custom config id (CUSTOM_CONFIG_ID or [search] custom_config_id)");
        }

        match (
            &self.openai.api_key,
            &self.search.api_key,
            &self.search.custom_config_id,
        ) {
            (Some(openai), Some(bing), Some(config_id)) => Ok(Credentials {
                openai_api_key: openai.clone(),
                bing_api_key: bing.clone(),
                custom_config_id: config_id.clone(),
            }),
            _ => Err(anyhow!(
                "Missing configuration:\n  - {}\nRun 'websearch --make-config' for an example config.",
                missing.join("\n  - ")
            )),
        }
    }
}
