//! CLI module - handles argument parsing and command execution

mod parser;

pub use parser::*;

use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;

use crate::client::{ResultView, SearchClient};
use crate::config::Config;
use crate::http::create_client;
use crate::output::OutputFormatter;

/// Main entry point for the CLI
pub async fn run() -> Result<()> {
    let args = Args::parse_flexible();

    crate::logging::init(args.serve, args.verbose);

    if args.color == Some(false) {
        colored::control::set_override(false);
    }

    // Handle special commands first
    if args.version {
        println!("websearch {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.make_config {
        println!("{}", crate::config::DEFAULT_CONFIG_TEMPLATE);
        return Ok(());
    }

    if let Some(ref shell) = args.completions {
        crate::completions::generate_completions(shell);
        return Ok(());
    }

    let config = Config::load()?.with_cli_overrides(&args);

    if args.serve {
        return crate::server::serve(&config).await;
    }

    let query = args.query_text();
    if query.is_empty() {
        println!("{}", "Usage: websearch [OPTIONS] <your query here>".cyan());
        println!();
        println!("Examples:");
        println!("  websearch serve");
        println!("  websearch what is new in rust");
        println!("  websearch --raw tokio select macro");
        println!();
        println!("Run 'websearch --help' for more options.");
        return Ok(());
    }

    search(&config, &args, query).await
}

async fn search(config: &Config, args: &Args, query: String) -> Result<()> {
    let client = SearchClient::new(config.client.endpoint.clone(), create_client()?);
    let mut formatter = OutputFormatter::new(args);
    let mut view = ResultView::new(query.clone());

    tracing::debug!(endpoint = %client.endpoint(), query = %query, "sending query");

    match stream_results(&client, &query, &mut view, &mut formatter).await {
        Ok(()) => formatter.finish(&view),
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "request failed");
            formatter.report_failure(&e);
            std::process::exit(1);
        }
    }
}

/// Apply every event to `view` as it arrives
async fn stream_results(
    client: &SearchClient,
    query: &str,
    view: &mut ResultView,
    formatter: &mut OutputFormatter,
) -> Result<()> {
    let stream = client.search(query).await?;
    futures::pin_mut!(stream);

    while let Some(item) = stream.next().await {
        match item {
            Ok(decoded) => {
                let update = view.apply(&decoded);
                formatter.on_update(&update)?;
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "skipping malformed event");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
