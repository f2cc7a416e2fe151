//! Flexible argument parser that allows flags before or after free text

use std::env;

#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Run the HTTP server instead of querying one
    pub serve: bool,

    /// Override the listen address (serve)
    pub host: Option<String>,

    /// Override the listen port (serve)
    pub port: Option<u16>,

    /// Override the websearch endpoint (client)
    pub endpoint: Option<String>,

    /// Output in JSON format
    pub json: bool,

    /// Output a standalone HTML page
    pub html: bool,

    /// Output raw text without formatting
    pub raw: bool,

    /// Enable/disable colorized output
    /// None = default (enabled), Some(true) = --color, Some(false) = --no-color
    pub color: Option<bool>,

    /// Debug logging
    pub verbose: bool,

    /// Show version
    pub version: bool,

    /// Generate shell completions
    pub completions: Option<String>,

    /// Export example config template
    pub make_config: bool,

    /// The search query (all non-flag arguments)
    pub query: Vec<String>,
}

impl Args {
    /// Parse arguments flexibly, allowing flags before or after text
    pub fn parse_flexible() -> Self {
        let raw_args: Vec<String> = env::args().skip(1).collect();
        Self::parse_args(raw_args)
    }

    /// Query words joined with single spaces
    pub fn query_text(&self) -> String {
        self.query.join(" ").trim().to_string()
    }

    pub fn parse_args(args: Vec<String>) -> Self {
        let mut result = Args::default();
        let mut query_parts: Vec<String> = Vec::new();
        let mut i = 0;

        if env::var("NO_COLOR").is_ok() {
            result.color = Some(false);
        }

        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                "--json" => result.json = true,
                "--html" => result.html = true,
                "--raw" => result.raw = true,
                "--no-color" | "--color=false" => result.color = Some(false),
                "--color" | "--color=true" => result.color = Some(true),
                "--make-config" => result.make_config = true,
                "-v" | "--verbose" => result.verbose = true,
                "--version" | "-V" => result.version = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }

                // Subcommand, only as the first word
                "serve" if query_parts.is_empty() && !result.serve => result.serve = true,

                // Flags with values
                "-e" | "--endpoint" => {
                    i += 1;
                    if i < args.len() {
                        result.endpoint = Some(args[i].clone());
                    }
                }
                "--host" => {
                    i += 1;
                    if i < args.len() {
                        result.host = Some(args[i].clone());
                    }
                }
                "--port" => {
                    i += 1;
                    if i < args.len() {
                        result.port = args[i].parse().ok();
                    }
                }
                "--completions" => {
                    i += 1;
                    if i < args.len() {
                        result.completions = Some(args[i].clone());
                    }
                }

                s if s.starts_with("--endpoint=") => {
                    result.endpoint = s.strip_prefix("--endpoint=").map(str::to_string);
                }
                s if s.starts_with("--host=") => {
                    result.host = s.strip_prefix("--host=").map(str::to_string);
                }
                s if s.starts_with("--port=") => {
                    result.port = s.strip_prefix("--port=").and_then(|v| v.parse().ok());
                }

                // Combined short flags like -vV
                arg if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 2 => {
                    let known = arg.chars().skip(1).all(|c| matches!(c, 'v' | 'V' | 'h'));
                    if !known {
                        query_parts.push(arg.to_string());
                    } else {
                        for c in arg.chars().skip(1) {
                            match c {
                                'v' => result.verbose = true,
                                'V' => result.version = true,
                                _ => {
                                    print_help();
                                    std::process::exit(0);
                                }
                            }
                        }
                    }
                }

                // Unknown flags are kept as query words, e.g. "-1" or "--"
                _ => query_parts.push(arg.clone()),
            }

            i += 1;
        }

        result.query = query_parts;
        result
    }
}

pub fn print_help() {
    println!(
        r#"websearch - Web search with AI-written answers, streamed to your terminal

USAGE:
    websearch [OPTIONS] <your query here>
    websearch serve [--host <HOST>] [--port <PORT>]

OPTIONS:
    -e, --endpoint <URL>  Websearch endpoint (default: http://localhost:5001/websearch)
        --raw             Print the answer as plain text while it streams
        --json            Print one JSON document when done
        --html            Print a standalone HTML page when done
        --color           Enable colorized output (default)
        --no-color        Disable colorized output
        --make-config     Export example config.toml to stdout
        --completions <SHELL>  Generate shell completions (bash, zsh, fish, powershell, elvish)
    -v, --verbose         Debug logging on stderr
    -V, --version         Show version
    -h, --help            Show this help

SERVE OPTIONS:
        --host <HOST>     Listen address (default: 0.0.0.0)
        --port <PORT>     Listen port (default: 5001)

ENVIRONMENT:
    OPENAI_API_KEY        OpenAI API key (serve)
    BING_SUBSCRIPTION_KEY Bing Custom Search subscription key (serve)
    CUSTOM_CONFIG_ID      Bing Custom Search configuration id (serve)
    OPENAI_BASE_URL       OpenAI-compatible API base URL
    WEBSEARCH_ENDPOINT    Endpoint the client queries
    WEBSEARCH_PORT        Port the server listens on
    WEBSEARCH_MODEL       Model that writes the answer
    RUST_LOG              Log filter (default: info for serve, warn otherwise)
    NO_COLOR              Disable colored output

EXAMPLES:
    websearch serve
    websearch what is new in rust 1.80
    websearch --raw tokio vs async-std | less
    websearch --html rust web frameworks > answer.html
    websearch -e http://10.0.0.5:5001/websearch best sqlite crates

CONFIGURATION:
    Configuration files are loaded from (later wins):
      1. ~/.config/websearch/config.toml (XDG config)
      2. ~/websearch.toml (home directory)
      3. ./websearch.toml or ./.websearch.toml (project local)
    Use 'websearch --make-config > websearch.toml' to start from the template.
"#
    );
}
