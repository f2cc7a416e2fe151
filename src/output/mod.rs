//! Output formatting module

mod colorize;
mod formatter;
mod html;
mod markdown;
mod spinner;

pub use colorize::ColorScheme;
pub use formatter::*;
pub use html::render_document;
pub use markdown::{render_html, render_markdown, MarkdownStream};
pub use spinner::{StatusSpinner, StreamingIndicator};
