//! Default configuration values

/// Default Bing Custom Search endpoint
pub const DEFAULT_BING_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/custom/search";

/// Default OpenAI base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for answers and URL selection
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default server bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 5001;

/// Default endpoint the client posts queries to
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/websearch";

/// Default search market
pub const DEFAULT_MARKET: &str = "en-US";

/// Sample User-Agents rotated across page fetches
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
];

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# websearch configuration
#
# Lookup order (later wins): ~/.config/websearch/config.toml, ~/websearch.toml,
# ./websearch.toml or ./.websearch.toml, then environment variables, then flags.

[server]
host = "0.0.0.0"
port = 5001

[client]
endpoint = "http://localhost:5001/websearch"

[search]
# Bing Custom Search. Keys may also come from BING_SUBSCRIPTION_KEY / CUSTOM_CONFIG_ID.
endpoint = "https://api.bing.microsoft.com/v7.0/custom/search"
# api_key = "..."
# custom_config_id = "..."
market = "en-US"
initial_results = 5

[openai]
# api_key = "sk-..."        # or OPENAI_API_KEY
base_url = "https://api.openai.com/v1"
model = "gpt-4o"
selection_model = "gpt-4o"
max_tokens = 1000

[deep_search]
enabled = true
quantity = 3
context_only = false

[fetch]
timeout_secs = 5
concurrency = 10

[prompt]
# system_prompt_path = "~/.config/websearch/sysprompt.txt"
"#;
