use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{Chunk, OutputFormat, SearchResults, SourceRef};
use crate::sources::DownloadReport;
use crate::utils::preview;

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_chunks(&self, report: &ChunkReport) -> String;
    fn format_download(&self, report: &DownloadReport) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Result of splitting a source without embedding it.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    pub source: SourceRef,
    pub checksum: String,
    pub interval: usize,
    pub overlap: usize,
    pub chunks: Vec<Chunk>,
}

fn score_label(score: Option<f32>) -> String {
    match score {
        Some(s) => format!("{s:.3}"),
        None => "n/a".to_string(),
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(output, "Source: {}", results.source).unwrap();
        writeln!(
            output,
            "Top {} of {} chunks in {}ms\n",
            results.len(),
            results.total_chunks,
            results.duration_ms
        )
        .unwrap();

        for hit in &results.results {
            writeln!(
                output,
                "{}. [Score: {}] chunk #{}",
                hit.rank,
                score_label(hit.score),
                hit.chunk_index
            )
            .unwrap();
            writeln!(output, "   ---").unwrap();
            writeln!(output, "   {}", preview(&hit.content, PREVIEW_CHARS)).unwrap();
            writeln!(output).unwrap();
        }

        output
    }

    fn format_chunks(&self, report: &ChunkReport) -> String {
        if report.chunks.is_empty() {
            return format!("No chunks produced from {}\n", report.source);
        }

        let mut output = String::new();
        writeln!(
            output,
            "{} chunks from {} (interval {}, overlap {})\n",
            report.chunks.len(),
            report.source,
            report.interval,
            report.overlap
        )
        .unwrap();

        for chunk in &report.chunks {
            writeln!(
                output,
                "[{}] {} tokens, {} chars, {} carried",
                chunk.index,
                chunk.token_count,
                chunk.char_len(),
                chunk.carried
            )
            .unwrap();
            writeln!(output, "   {}", chunk.text).unwrap();
        }

        output
    }

    fn format_download(&self, report: &DownloadReport) -> String {
        let mut output = String::new();
        writeln!(output, "Model: {}", report.model_id).unwrap();
        writeln!(output, "Path:  {}", report.target.display()).unwrap();
        writeln!(output, "-----").unwrap();
        writeln!(output, "Downloaded: {}", report.downloaded.len()).unwrap();
        writeln!(output, "Skipped:    {}", report.skipped.len()).unwrap();
        writeln!(output, "Failed:     {}", report.failed.len()).unwrap();
        for failed in &report.failed {
            writeln!(output, "  ✗ {} - {}", failed.file, failed.error).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(results)
    }

    fn format_chunks(&self, report: &ChunkReport) -> String {
        self.render(report)
    }

    fn format_download(&self, report: &DownloadReport) -> String {
        self.render(report)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(output, "**Source:** `{}`\n", results.source).unwrap();
        writeln!(
            output,
            "Top {} of {} chunks in {}ms\n",
            results.len(),
            results.total_chunks,
            results.duration_ms
        )
        .unwrap();

        for hit in &results.results {
            writeln!(
                output,
                "### {}. Score: {}\n",
                hit.rank,
                score_label(hit.score)
            )
            .unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", hit.content).unwrap();
            writeln!(output, "```\n").unwrap();
        }

        output
    }

    fn format_chunks(&self, report: &ChunkReport) -> String {
        if report.chunks.is_empty() {
            return format!("## Chunks\n\n*No chunks produced from `{}`.*\n", report.source);
        }

        let mut output = String::new();
        writeln!(output, "## Chunks\n").unwrap();
        writeln!(output, "**Source:** `{}`\n", report.source).unwrap();
        writeln!(output, "| # | Tokens | Carried | Text |").unwrap();
        writeln!(output, "|---|--------|---------|------|").unwrap();
        for chunk in &report.chunks {
            writeln!(
                output,
                "| {} | {} | {} | {} |",
                chunk.index,
                chunk.token_count,
                chunk.carried,
                chunk.text.replace('|', "\\|")
            )
            .unwrap();
        }
        output
    }

    fn format_download(&self, report: &DownloadReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Model Download\n").unwrap();
        writeln!(output, "- **Model:** `{}`", report.model_id).unwrap();
        writeln!(output, "- **Path:** `{}`", report.target.display()).unwrap();
        writeln!(output, "- **Downloaded:** {}", report.downloaded.len()).unwrap();
        writeln!(output, "- **Skipped:** {}", report.skipped.len()).unwrap();
        writeln!(output, "- **Failed:** {}", report.failed.len()).unwrap();
        if !report.failed.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "| File | Error |").unwrap();
            writeln!(output, "|------|-------|").unwrap();
            for failed in &report.failed {
                writeln!(output, "| `{}` | {} |", failed.file, failed.error).unwrap();
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchHit;

    fn results() -> SearchResults {
        SearchResults {
            query: "risks".to_string(),
            source: SourceRef::Url("https://example.com".to_string()),
            checksum: "abc".to_string(),
            results: vec![
                SearchHit {
                    rank: 1,
                    chunk_index: 7,
                    score: Some(0.8123),
                    content: "also raises risks .".to_string(),
                },
                SearchHit {
                    rank: 2,
                    chunk_index: 0,
                    score: None,
                    content: "AI helps people .".to_string(),
                },
            ],
            total_chunks: 8,
            duration_ms: 12,
        }
    }

    #[test]
    fn test_text_search_results() {
        let output = TextFormatter.format_search_results(&results());
        assert!(output.contains("Search results for: \"risks\""));
        assert!(output.contains("Top 2 of 8 chunks"));
        assert!(output.contains("1. [Score: 0.812] chunk #7"));
        assert!(output.contains("2. [Score: n/a] chunk #0"));
    }

    #[test]
    fn test_json_search_results() {
        let output = JsonFormatter::new(false).format_search_results(&results());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["query"], "risks");
        assert_eq!(json["source"]["kind"], "url");
        assert_eq!(json["results"][0]["chunk_index"], 7);
        assert!(json["results"][1]["score"].is_null());
    }

    #[test]
    fn test_markdown_chunks_escape_pipes() {
        let report = ChunkReport {
            source: SourceRef::Inline,
            checksum: String::new(),
            interval: 20,
            overlap: 3,
            chunks: vec![Chunk::new(0, &["a", "|", "b"], 0)],
        };
        let output = MarkdownFormatter.format_chunks(&report);
        assert!(output.contains("a \\| b"));
    }

    #[test]
    fn test_empty_outputs() {
        let mut empty = results();
        empty.results.clear();
        assert!(TextFormatter
            .format_search_results(&empty)
            .starts_with("No results found"));

        let report = ChunkReport {
            source: SourceRef::Inline,
            checksum: String::new(),
            interval: 20,
            overlap: 3,
            chunks: Vec::new(),
        };
        assert_eq!(
            TextFormatter.format_chunks(&report),
            "No chunks produced from <inline>\n"
        );
    }

    #[test]
    fn test_error_formats() {
        assert_eq!(TextFormatter.format_error("boom"), "Error: boom\n");
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::new(false).format_error("boom")).unwrap();
        assert_eq!(json["error"], "boom");
    }
}
