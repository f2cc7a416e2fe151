//! Standalone HTML page for `--html`

use super::markdown::render_html;
use crate::client::{ResultView, NO_RESULTS};
use html_escape::{encode_double_quoted_attribute, encode_text};

const STYLE: &str = r#"body { font-family: sans-serif; max-width: 960px; margin: 2em auto; padding: 0 1em; line-height: 1.5; }
h2 { border-bottom: 1px solid #ddd; padding-bottom: .3em; }
.result { margin-bottom: 1.2em; }
.result a { font-size: 1.1em; }
.url { color: #067d17; font-size: .9em; }
.error { color: #b00020; }
pre { background: #f6f8fa; padding: 1em; overflow-x: auto; }"#;

/// Build the full page: the answer first, then the search results
pub fn render_document(view: &ResultView) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} - websearch</title>\n<style>\n{}\n</style>\n</head>\n<body>\n",
        encode_text(&view.query),
        STYLE
    ));

    html.push_str("<section id=\"answer\">\n<h2>GenAI Answer</h2>\n");
    for error in &view.errors {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", encode_text(error)));
    }
    html.push_str(&render_html(&view.answer));
    html.push_str("</section>\n");

    html.push_str("<section id=\"results\">\n<h2>Bing Search Results</h2>\n");
    match view.visible_results() {
        Some(results) => {
            for item in results {
                html.push_str(&format!(
                    "<div class=\"result\">\n<a href=\"{}\" target=\"_blank\">{}</a>\n<div class=\"url\">{}</div>\n<p>{}</p>\n</div>\n",
                    encode_double_quoted_attribute(&item.url),
                    encode_text(&item.title),
                    encode_text(&item.url),
                    encode_text(&item.snippet),
                ));
            }
        }
        None => html.push_str(&format!("<p>{}</p>\n", NO_RESULTS)),
    }
    html.push_str("</section>\n</body>\n</html>\n");
    html
}
