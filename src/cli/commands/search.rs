use anyhow::{Context, Result, bail};
use clap::Args;
use std::time::Instant;

use super::common::{InputArgs, SplitterArgs, load_source, progress_bar};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, SearchHit, SearchResults};
use crate::providers::create_provider;
use crate::services::{BatchEmbedder, Pipeline, TextSplitter};
use crate::utils::calculate_checksum;

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u32>,

    #[command(flatten)]
    pub splitter: SplitterArgs,

    #[arg(long, help = "Chunks sent to the embedding provider per call")]
    pub batch_size: Option<u32>,

    #[arg(long, help = "Minimum similarity score threshold (-1.0 to 1.0)")]
    pub min_score: Option<f32>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let limit = args.limit.unwrap_or(config.search.default_limit);
    if limit == 0 {
        bail!("limit must be at least 1");
    }

    if let Some(score) = args.min_score
        && !(-1.0..=1.0).contains(&score)
    {
        bail!("min_score must be between -1.0 and 1.0");
    }

    let chunking = args.splitter.apply(&config.chunking);
    let batch_size = args.batch_size.unwrap_or(config.embedding.batch_size);
    let splitter = TextSplitter::new(&chunking).context("invalid chunking options")?;

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Limit: {limit}");
        eprintln!(
            "  Chunking: interval {}, overlap {}, {:?} tokens{}",
            chunking.interval,
            chunking.overlap,
            chunking.tokenization,
            if chunking.dedup { ", dedup" } else { "" }
        );
        eprintln!(
            "  Embedding: {} ({}), batch size {batch_size}",
            config.embedding.model_id, config.embedding.provider
        );
        if let Some(score) = args.min_score {
            eprintln!("  Min score: {score:.3}");
        }
    }

    let fetch_start = Instant::now();
    let (source, text) = load_source(&args.input, &config).await?;
    let fetch_ms = fetch_start.elapsed().as_millis();

    let provider = create_provider(&config).context("failed to initialize embedding provider")?;
    let embedder = BatchEmbedder::new(provider, batch_size as usize)?;
    let pipeline = Pipeline::new(splitter, embedder);

    let split_start = Instant::now();
    let checksum = calculate_checksum(&text);
    let chunks = pipeline.split(&text);
    let split_ms = split_start.elapsed().as_millis();

    let embed_start = Instant::now();
    let pb = progress_bar(chunks.len() as u64)?;
    pb.set_message("embedding");
    let corpus = pipeline
        .embed_chunks(source, checksum, chunks, |progress| {
            pb.set_position(progress.processed as u64)
        })
        .await
        .context("failed to embed chunks")?;
    pb.finish_and_clear();
    let embed_ms = embed_start.elapsed().as_millis();

    let rank_start = Instant::now();
    let ranked = pipeline
        .search(&corpus, query, limit as usize)
        .await
        .context("search failed")?;
    let rank_ms = rank_start.elapsed().as_millis();

    if verbose {
        let total_ms = start_time.elapsed().as_millis();
        eprintln!("Timing:");
        eprintln!("  Load source: {fetch_ms}ms");
        eprintln!("  Split: {split_ms}ms ({} chunks)", corpus.len());
        eprintln!("  Embed: {embed_ms}ms");
        eprintln!("  Query + rank: {rank_ms}ms");
        eprintln!("  Total: {total_ms}ms");
        eprintln!();
    }

    let results: Vec<SearchHit> = ranked
        .into_iter()
        .filter(|r| match args.min_score {
            Some(min) => r.is_scored() && r.score >= min,
            None => true,
        })
        .enumerate()
        .map(|(i, r)| SearchHit {
            rank: i + 1,
            chunk_index: r.index,
            score: r.is_scored().then_some(r.score),
            content: r.text.to_string(),
        })
        .collect();

    let search_results = SearchResults {
        query: query.to_string(),
        source: corpus.source.clone(),
        checksum: corpus.checksum.clone(),
        results,
        total_chunks: corpus.len() as u64,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    print!("{}", formatter.format_search_results(&search_results));

    Ok(())
}
