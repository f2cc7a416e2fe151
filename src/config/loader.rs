//! Configuration loader - handles TOML config hierarchy

use super::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration with precedence:
    /// 1. CLI arguments (handled separately via with_cli_overrides)
    /// 2. Environment variables
    /// 3. ./websearch.toml or ./.websearch.toml (project local)
    /// 4. ~/websearch.toml (home directory)
    /// 5. ~/.config/websearch/config.toml (XDG config)
    /// 6. Defaults (hardcoded)
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();

        // Load in reverse precedence order (lowest first, higher overwrites)
        for path in [
            Self::find_xdg_config(),
            Self::find_home_config(),
            Self::find_local_config(),
        ]
        .into_iter()
        .flatten()
        {
            let loaded = Self::read_table(&path)?;
            tracing::debug!(path = %path.display(), "loaded config file");
            merge_tables(&mut merged, loaded);
        }

        let config: Config = toml::Value::Table(merged)
            .try_into()
            .context("Invalid configuration")?;
        Ok(Self::apply_env_overrides(config))
    }

    /// Find XDG config file
    /// On Linux: ~/.config/websearch/config.toml
    /// On macOS: ~/Library/Application Support/websearch/config.toml OR ~/.config/websearch/config.toml
    fn find_xdg_config() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("websearch").join("config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        #[cfg(target_os = "macos")]
        {
            if let Some(home) = dirs::home_dir() {
                let path = home.join(".config").join("websearch").join("config.toml");
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Find home directory config
    fn find_home_config() -> Option<PathBuf> {
        let path = dirs::home_dir()?.join("websearch.toml");
        path.exists().then_some(path)
    }

    /// Find project local config
    fn find_local_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        ["websearch.toml", ".websearch.toml"]
            .iter()
            .map(|name| cwd.join(name))
            .find(|path| path.exists())
    }

    /// Read a config file as a raw TOML table
    fn read_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        content
            .parse::<toml::Table>()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(config: Config) -> Config {
        Self::apply_overrides(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup
    fn apply_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
        // Plain names, as commonly kept in .env files
        if let Some(key) = var("OPENAI_API_KEY") {
            config.openai.api_key = Some(key);
        }
        if let Some(key) = var("BING_SUBSCRIPTION_KEY") {
            config.search.api_key = Some(key);
        }
        if let Some(id) = var("CUSTOM_CONFIG_ID") {
            config.search.custom_config_id = Some(id);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            config.openai.base_url = url;
        }

        if let Some(endpoint) = var("WEBSEARCH_ENDPOINT") {
            config.client.endpoint = endpoint;
        }
        if let Some(port) = var("WEBSEARCH_PORT").and_then(|v| v.parse().ok()) {
            config.server.port = port;
        }
        if let Some(model) = var("WEBSEARCH_MODEL") {
            config.openai.model = model;
        }
        if let Some(val) = var("WEBSEARCH_DEEP_SEARCH") {
            config.deep_search.enabled = parse_bool(&val);
        }

        config
    }
}

/// Merge `overlay` into `base`, key by key; nested tables merge recursively
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, toml::Value::Table(incoming));
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Parse boolean from string (true/false/1/0/yes/no)
fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[openai]
model = "gpt-4o-mini"
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        // Unset fields keep their defaults
        assert_eq!(config.openai.selection_model, "gpt-4o");
        assert_eq!(config.openai.max_tokens, 1000);
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn test_parse_full_template() {
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.deep_search.quantity, 3);
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[server\nport = ").is_err());
        assert!(Config::from_toml("[server]\nport = \"high\"").is_err());
    }

    #[test]
    fn test_merge_tables_overlay_wins_per_key() {
        let mut base: toml::Table = r#"
[search]
api_key = "bing-key"
custom_config_id = "cfg"
initial_results = 8

[openai]
api_key = "sk-base"
model = "gpt-4o-mini"
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = r#"
[search]
market = "pt-BR"

[openai]
api_key = "sk-local"
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);
        let merged: Config = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(merged.search.market, "pt-BR");
        assert_eq!(merged.search.initial_results, 8);
        assert_eq!(merged.search.api_key.as_deref(), Some("bing-key"));
        assert_eq!(merged.search.custom_config_id.as_deref(), Some("cfg"));
        assert_eq!(merged.openai.api_key.as_deref(), Some("sk-local"));
        assert_eq!(merged.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_read_table_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websearch.toml");
        std::fs::write(&path, "[server\nport = 1").unwrap();
        let err = Config::read_table(&path).unwrap_err();
        assert!(format!("{err:#}").contains("websearch.toml"));

        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();
        let table = Config::read_table(&path).unwrap();
        assert_eq!(table["server"]["port"].as_integer(), Some(8080));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("BING_SUBSCRIPTION_KEY", "bing-env"),
            ("CUSTOM_CONFIG_ID", "cfg-env"),
            ("WEBSEARCH_PORT", "8081"),
            ("WEBSEARCH_DEEP_SEARCH", "off"),
            ("WEBSEARCH_ENDPOINT", "http://127.0.0.1:8081/websearch"),
        ]
        .into_iter()
        .collect();

        let config = Config::apply_overrides(Config::default(), |name| {
            vars.get(name).map(|v| v.to_string())
        });
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.search.api_key.as_deref(), Some("bing-env"));
        assert_eq!(config.search.custom_config_id.as_deref(), Some("cfg-env"));
        assert_eq!(config.server.port, 8081);
        assert!(!config.deep_search.enabled);
        assert_eq!(config.client.endpoint, "http://127.0.0.1:8081/websearch");
    }

    #[test]
    fn test_env_bad_port_is_ignored() {
        let config = Config::apply_overrides(Config::default(), |name| {
            (name == "WEBSEARCH_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool("0"));
    }
}
