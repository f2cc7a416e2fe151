//! websearch - web search with AI-written answers.
//!
//! `websearch serve` runs the search pipeline behind `POST /websearch` and
//! streams its progress as newline-delimited JSON events. `websearch <query>`
//! consumes that stream and renders it in the terminal.

pub mod cli;
pub mod client;
pub mod completions;
pub mod config;
pub mod http;
pub mod llm;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod protocol;
pub mod search;
pub mod server;
