//! evtrack HTML Parser
//!
//! Builds an `evtrack-dom` document from HTML source using html5ever.

mod parser;

pub use parser::HtmlParser;
pub use evtrack_dom::Document;

/// Parse an HTML string into a document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),
}
