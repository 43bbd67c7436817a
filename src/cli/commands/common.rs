use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{ChunkingConfig, Config, SourceRef, Tokenization};
use crate::sources::WebFetcher;
use crate::utils::{MAX_SOURCE_BYTES, read_text_file};

/// Where to read source text from; stdin is used when none is given.
#[derive(Debug, Default, Args)]
pub struct InputArgs {
    #[arg(long, short = 'u', group = "input", help = "Fetch a web page and use its visible text")]
    pub url: Option<String>,

    #[arg(long, group = "input", help = "Read source text from a file")]
    pub file: Option<PathBuf>,

    #[arg(long, group = "input", help = "Use the given text directly")]
    pub text: Option<String>,
}

/// Per-run overrides of the `[chunking]` config section.
#[derive(Debug, Default, Args)]
pub struct SplitterArgs {
    #[arg(long, help = "Maximum chunk length in characters")]
    pub interval: Option<usize>,

    #[arg(long, help = "Tokens carried over into the next chunk")]
    pub overlap: Option<usize>,

    #[arg(long, help = "Paragraph delimiter; \\n and \\t escapes are understood")]
    pub delimiter: Option<String>,

    #[arg(long, help = "Tokenization: lexical or whitespace")]
    pub tokenization: Option<Tokenization>,

    #[arg(long, help = "Drop chunks whose first 50 characters repeat")]
    pub dedup: bool,
}

impl SplitterArgs {
    pub fn apply(&self, base: &ChunkingConfig) -> ChunkingConfig {
        let mut config = base.clone();
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(overlap) = self.overlap {
            config.overlap = overlap;
        }
        if let Some(ref delimiter) = self.delimiter {
            config.delimiter = unescape(delimiter);
        }
        if let Some(tokenization) = self.tokenization {
            config.tokenization = tokenization;
        }
        if self.dedup {
            config.dedup = true;
        }
        config
    }
}

/// Expand `\n`, `\r`, `\t` and `\\` as typed on a command line.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Resolve the input arguments to source text.
pub async fn load_source(input: &InputArgs, config: &Config) -> Result<(SourceRef, String)> {
    if let Some(ref url) = input.url {
        let fetcher = WebFetcher::new(&config.fetch)?;
        let text = fetcher
            .fetch_text(url)
            .await
            .with_context(|| format!("failed to fetch {url}"))?;
        return Ok((SourceRef::Url(url.clone()), text));
    }

    if let Some(ref path) = input.file {
        let text = read_text_file(path, MAX_SOURCE_BYTES)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok((SourceRef::File(path.display().to_string()), text));
    }

    if let Some(ref text) = input.text {
        return Ok((SourceRef::Inline, text.clone()));
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("no input given: pass --url, --file or --text, or pipe text on stdin");
    }
    let text = std::io::read_to_string(stdin).context("failed to read stdin")?;
    Ok((SourceRef::Inline, text))
}

pub fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("\\n\\n"), "\n\n");
        assert_eq!(unescape("a\\tb"), "a\tb");
        assert_eq!(unescape("---"), "---");
        assert_eq!(unescape("\\\\n"), "\\n");
        assert_eq!(unescape("\\x"), "\\x");
        assert_eq!(unescape("end\\"), "end\\");
    }

    #[test]
    fn test_splitter_args_override() {
        let args = SplitterArgs {
            interval: Some(20),
            overlap: Some(3),
            delimiter: Some("\\n".to_string()),
            tokenization: Some(Tokenization::Whitespace),
            dedup: true,
        };
        let config = args.apply(&ChunkingConfig::default());
        assert_eq!(config.interval, 20);
        assert_eq!(config.overlap, 3);
        assert_eq!(config.delimiter, "\n");
        assert_eq!(config.tokenization, Tokenization::Whitespace);
        assert!(config.dedup);
    }

    #[test]
    fn test_splitter_args_keep_config() {
        let base = ChunkingConfig {
            dedup: true,
            ..Default::default()
        };
        let config = SplitterArgs::default().apply(&base);
        assert_eq!(config.interval, base.interval);
        assert_eq!(config.delimiter, base.delimiter);
        assert!(config.dedup);
    }

    #[tokio::test]
    async fn test_load_inline_text() {
        let input = InputArgs {
            text: Some("hello".to_string()),
            ..Default::default()
        };
        let (source, text) = load_source(&input, &Config::default()).await.unwrap();
        assert_eq!(source, SourceRef::Inline);
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.txt");
        std::fs::write(&path, "para one\n\npara two").unwrap();

        let input = InputArgs {
            file: Some(path.clone()),
            ..Default::default()
        };
        let (source, text) = load_source(&input, &Config::default()).await.unwrap();
        assert_eq!(source, SourceRef::File(path.display().to_string()));
        assert_eq!(text, "para one\n\npara two");
    }
}
