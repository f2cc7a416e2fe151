//! Markdown rendering for terminal output

use pulldown_cmark::{html, Options, Parser};
use termimad::MadSkin;

/// Render markdown to terminal
pub fn render_markdown(skin: &MadSkin, text: &str) -> String {
    skin.term_text(text).to_string()
}

/// Render markdown to an HTML fragment
pub fn render_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Splits a growing markdown answer into blocks that are safe to render.
///
/// A block ends at a blank line outside a fenced code block. Text after the
/// last boundary stays buffered until more arrives or `finish` is called.
#[derive(Debug, Default)]
pub struct MarkdownStream {
    pending: String,
}

impl MarkdownStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return the blocks it completed
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.pending.push_str(delta);

        // `pending` always starts right after a block boundary, outside any fence
        let mut in_fence = false;
        let mut blocks = Vec::new();
        let mut block_start = 0;
        let mut line_start = 0;

        while let Some(offset) = self.pending[line_start..].find('\n') {
            let line_end = line_start + offset;
            let line = self.pending[line_start..line_end].trim_end_matches('\r');

            if is_fence(line) {
                in_fence = !in_fence;
            } else if line.trim().is_empty() && !in_fence {
                let block = self.pending[block_start..line_end].trim_end();
                if !block.trim().is_empty() {
                    blocks.push(block.to_string());
                }
                block_start = line_end + 1;
            }

            line_start = line_end + 1;
        }

        self.pending.drain(..block_start);
        blocks
    }

    /// Flush whatever is left
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim_end();
        (!rest.trim().is_empty()).then(|| rest.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.trim().is_empty()
    }
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_complete_on_blank_line() {
        let mut stream = MarkdownStream::new();
        assert!(stream.push("# Title\n").is_empty());
        let blocks = stream.push("\nFirst para");
        assert_eq!(blocks, vec!["# Title"]);
        assert!(stream.push(" continues").is_empty());
        assert_eq!(stream.push("\n\nSecond"), vec!["First para continues"]);
        assert_eq!(stream.finish().as_deref(), Some("Second"));
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_blank_line_inside_fence_does_not_split() {
        let mut stream = MarkdownStream::new();
        let blocks = stream.push("```rust\nfn main() {\n\n    run();\n");
        assert!(blocks.is_empty());
        let blocks = stream.push("}\n```\n\nAfter");
        assert_eq!(blocks, vec!["```rust\nfn main() {\n\n    run();\n}\n```"]);
        assert_eq!(stream.finish().as_deref(), Some("After"));
    }

    #[test]
    fn test_fence_split_across_deltas() {
        let mut stream = MarkdownStream::new();
        assert_eq!(stream.push("intro\n\n``"), vec!["intro"]);
        assert!(stream.push("`\ncode\n\nmore code\n").is_empty());
        assert_eq!(
            stream.push("```\n\n"),
            vec!["```\ncode\n\nmore code\n```"]
        );
        assert!(stream.is_empty());
    }

    #[test]
    fn test_unclosed_fence_is_flushed_on_finish() {
        let mut stream = MarkdownStream::new();
        assert!(stream.push("```\nno end\n\n").is_empty());
        assert_eq!(stream.finish().as_deref(), Some("```\nno end"));
    }

    #[test]
    fn test_render_html() {
        let html = render_html("# Answer\n\nSee [Rust](https://www.rust-lang.org).");
        assert!(html.contains("<h1>Answer</h1>"));
        assert!(html.contains("<a href=\"https://www.rust-lang.org\">Rust</a>"));
    }

    #[test]
    fn test_render_markdown_keeps_text() {
        let skin = MadSkin::no_style();
        let out = render_markdown(&skin, "plain words");
        assert!(out.contains("plain words"));
    }
}
