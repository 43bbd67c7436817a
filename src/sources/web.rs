//! Fetch a web page and reduce it to its visible body text.

use std::time::Duration;

use reqwest::Client;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::FetchError;
use crate::models::FetchConfig;
use crate::utils::collapse_whitespace;

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: Client,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    /// Download the raw HTML of `url`.
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Download `url` and return its visible text on a single line.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let html = self.fetch_html(url).await?;
        let text = extract_text(&html)?;

        debug!(
            url,
            html_bytes = html.len(),
            text_chars = text.chars().count(),
            "fetched page"
        );

        Ok(text)
    }
}

/// Visible text of an HTML document's `<body>`, whitespace collapsed.
///
/// Documents without a body fall back to the root element.
pub fn extract_text(html: &str) -> Result<String, FetchError> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body")
        .map_err(|e| FetchError::ParseError(format!("invalid CSS selector: {e:?}")))?;

    let mut parts = Vec::new();
    match document.select(&body_selector).next() {
        Some(body) => collect_text(body, &mut parts),
        None => collect_text(document.root_element(), &mut parts),
    }

    Ok(collapse_whitespace(&parts.join(" ")))
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}
