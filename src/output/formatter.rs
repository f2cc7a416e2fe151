use super::colorize::ColorScheme;
use super::html::render_document;
use super::markdown::{render_markdown, MarkdownStream};
use super::spinner::{StatusSpinner, StreamingIndicator};
use crate::cli::Args;
use crate::client::{ResultItem, ResultView, ViewUpdate, NO_RESULTS};
use anyhow::Result;
use serde::Serialize;
use std::io::{self, IsTerminal, Stdout};
use termimad::MadSkin;

pub const FETCH_FAILED: &str = "An error occurred while fetching results.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Rendered markdown with a status spinner
    Markdown,
    /// Answer text as it arrives
    Raw,
    /// One JSON document at the end
    Json,
    /// A standalone HTML page at the end
    Html,
}

impl OutputMode {
    pub fn from_args(args: &Args, is_piped: bool) -> Self {
        if args.json {
            OutputMode::Json
        } else if args.html {
            OutputMode::Html
        } else if args.raw || is_piped {
            OutputMode::Raw
        } else {
            OutputMode::Markdown
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    answer: &'a str,
    results: &'a [ResultItem],
    errors: &'a [String],
    success: bool,
}

pub struct OutputFormatter {
    mode: OutputMode,
    skin: MadSkin,
    spinner: StatusSpinner,
    blocks: MarkdownStream,
    indicator: StreamingIndicator<Stdout>,
}

impl OutputFormatter {
    pub fn new(args: &Args) -> Self {
        let is_piped = !io::stdout().is_terminal();
        let no_color = args.color == Some(false) || is_piped;
        let mode = OutputMode::from_args(args, is_piped);

        let spinner = if mode == OutputMode::Markdown && io::stderr().is_terminal() {
            StatusSpinner::start("Searching...")
        } else {
            StatusSpinner::hidden()
        };

        Self {
            mode,
            skin: if no_color {
                MadSkin::no_style()
            } else {
                MadSkin::default()
            },
            spinner,
            blocks: MarkdownStream::new(),
            indicator: StreamingIndicator::stdout(mode == OutputMode::Raw && !is_piped),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// React to one applied event
    pub fn on_update(&mut self, update: &ViewUpdate) -> Result<()> {
        match (self.mode, update) {
            (OutputMode::Markdown, ViewUpdate::Status(status)) => {
                self.spinner.set_message(status);
            }
            (OutputMode::Markdown, ViewUpdate::AnswerStarted(delta)) => {
                self.spinner.stop();
                self.print_blocks(delta);
            }
            (OutputMode::Markdown, ViewUpdate::AnswerDelta(delta)) => {
                self.print_blocks(delta);
            }
            (OutputMode::Markdown, ViewUpdate::Error(message)) => {
                self.spinner
                    .println(&ColorScheme::error(message).to_string());
            }
            (OutputMode::Raw, ViewUpdate::AnswerStarted(delta) | ViewUpdate::AnswerDelta(delta)) => {
                self.indicator.print_chunk(delta)?;
            }
            (OutputMode::Raw, ViewUpdate::Error(message)) => {
                eprintln!("{}", message);
            }
            (_, ViewUpdate::Status(status)) => {
                tracing::debug!(status = %status, "status");
            }
            _ => {}
        }
        Ok(())
    }

    /// Print everything still pending once the stream ended
    pub fn finish(&mut self, view: &ResultView) -> Result<()> {
        self.spinner.stop();
        match self.mode {
            OutputMode::Markdown => {
                if let Some(rest) = self.blocks.finish() {
                    self.print_block(&rest);
                }
                println!("{}", format_results(view));
            }
            OutputMode::Raw => {
                self.indicator.finish()?;
                if !view.answer.is_empty() {
                    println!();
                }
                println!("{}", format_results(view));
            }
            OutputMode::Json => {
                let output = JsonOutput {
                    query: &view.query,
                    answer: &view.answer,
                    results: &view.results,
                    errors: &view.errors,
                    success: view.errors.is_empty(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputMode::Html => print!("{}", render_document(view)),
        }
        Ok(())
    }

    /// Report a request that failed before or while streaming
    pub fn report_failure(&mut self, err: &anyhow::Error) {
        self.spinner.stop();
        let cause = format!("{:#}", err);
        if self.mode == OutputMode::Json {
            let output = serde_json::json!({
                "success": false,
                "error": FETCH_FAILED,
                "cause": cause,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_default()
            );
        } else {
            ColorScheme::print_error(FETCH_FAILED);
            eprintln!("  {}", ColorScheme::muted(&cause));
        }
    }

    fn print_blocks(&mut self, delta: &str) {
        for block in self.blocks.push(delta) {
            self.print_block(&block);
        }
    }

    fn print_block(&self, block: &str) {
        println!("{}", render_markdown(&self.skin, block));
    }
}

/// Terminal listing of the search results
pub fn format_results(view: &ResultView) -> String {
    let mut out = format!("{}\n", ColorScheme::heading("Bing Search Results"));
    match view.visible_results() {
        Some(results) => {
            for (i, item) in results.iter().enumerate() {
                out.push_str(&format!(
                    "\n{}. {}\n   {}\n   {}\n",
                    i + 1,
                    ColorScheme::bold(&item.title),
                    ColorScheme::link(&item.url),
                    ColorScheme::muted(&item.snippet)
                ));
            }
        }
        None => out.push_str(NO_RESULTS),
    }
    out
}
