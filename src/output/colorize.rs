use colored::{ColoredString, Colorize};

pub struct ColorScheme;

impl ColorScheme {
    /// Error message (red)
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// Section heading (bold cyan)
    pub fn heading(text: &str) -> ColoredString {
        text.cyan().bold()
    }

    /// Link text (blue)
    pub fn link(text: &str) -> ColoredString {
        text.blue()
    }

    /// Muted text (bright black/gray)
    pub fn muted(text: &str) -> ColoredString {
        text.bright_black()
    }

    /// Bold text
    pub fn bold(text: &str) -> ColoredString {
        text.bold()
    }

    /// Print an error indicator
    pub fn print_error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }
}
