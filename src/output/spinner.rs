use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

const MARKER: &str = "●";
const ERASE_MARKER: &str = "\x08 \x08";

/// Status line shown on stderr while waiting for the answer
pub struct StatusSpinner {
    bar: ProgressBar,
}

impl StatusSpinner {
    pub fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Spinner that draws nothing, for non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Print a line above the spinner without garbling it
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            eprintln!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    pub fn stop(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for StatusSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Streaming indicator that shows ● at the end of text while streaming
pub struct StreamingIndicator<W: Write> {
    out: W,
    show_marker: bool,
    has_marker: bool,
}

impl StreamingIndicator<io::Stdout> {
    pub fn stdout(show_marker: bool) -> Self {
        Self::new(io::stdout(), show_marker)
    }
}

impl<W: Write> StreamingIndicator<W> {
    pub fn new(out: W, show_marker: bool) -> Self {
        Self {
            out,
            show_marker,
            has_marker: false,
        }
    }

    /// Print chunk and move the ● marker after it
    pub fn print_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.clear_marker()?;
        self.out.write_all(chunk.as_bytes())?;
        if self.show_marker {
            self.out.write_all(MARKER.as_bytes())?;
            self.has_marker = true;
        }
        self.out.flush()
    }

    /// Remove the marker
    pub fn finish(&mut self) -> io::Result<()> {
        self.clear_marker()?;
        self.out.flush()
    }

    fn clear_marker(&mut self) -> io::Result<()> {
        if self.has_marker {
            self.out.write_all(ERASE_MARKER.as_bytes())?;
            self.has_marker = false;
        }
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_indicator_moves_marker() {
        let mut indicator = StreamingIndicator::new(Vec::new(), true);
        indicator.print_chunk("Hello ").unwrap();
        indicator.print_chunk("World").unwrap();
        indicator.finish().unwrap();
        let out = String::from_utf8(indicator.into_inner()).unwrap();
        assert_eq!(out, "Hello ●\x08 \x08World●\x08 \x08");
    }

    #[test]
    fn test_streaming_indicator_without_marker_is_plain() {
        let mut indicator = StreamingIndicator::new(Vec::new(), false);
        indicator.print_chunk("a").unwrap();
        indicator.print_chunk("b").unwrap();
        indicator.finish().unwrap();
        assert_eq!(indicator.into_inner(), b"ab");
    }

    #[test]
    fn test_streaming_indicator_finish_without_chunks() {
        let mut indicator = StreamingIndicator::new(Vec::new(), true);
        indicator.finish().unwrap();
        assert!(indicator.into_inner().is_empty());
    }

    #[test]
    fn test_hidden_spinner_lifecycle() {
        let spinner = StatusSpinner::hidden();
        spinner.set_message("Visiting pages and reading contents...");
        spinner.stop();
    }
}
