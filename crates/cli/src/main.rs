use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recall_code_chunker::{Chunker, ParserRegistry};
use recall_search::{chunk_content, CodeIndex, CodeTokenizer, SearchConfig};
use recall_vector_store::InMemoryVectorStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Structure-aware chunking and hybrid search over source code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML config file (RECALL_* environment variables still apply)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a source file into structure-aligned chunks
    Chunk(ChunkArgs),

    /// Show the tokens produced for a piece of text
    Tokenize(TokenizeArgs),

    /// Show the rewrites generated for a search query
    Variations(VariationsArgs),

    /// Index a directory in memory and search it
    Search(SearchArgs),
}

#[derive(Args)]
struct ChunkArgs {
    /// Source file to chunk
    file: PathBuf,

    /// Override the maximum chunk size in bytes
    #[arg(long)]
    max_chunk_size: Option<usize>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TokenizeArgs {
    /// Text to tokenize
    text: String,

    /// Tokenize as a query (also emits recombined spellings such as `addscore`, `add_score`)
    #[arg(long)]
    query: bool,
}

#[derive(Args)]
struct VariationsArgs {
    /// Search query
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[derive(Args)]
struct SearchArgs {
    /// Directory to index
    root: PathBuf,

    /// Search query
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,

    /// Maximum number of results
    #[arg(long, short = 'n')]
    limit: Option<usize>,

    /// Share of the vector score in hybrid ranking (0.0 - 1.0)
    #[arg(long)]
    vector_weight: Option<f32>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SearchHit {
    id: Option<String>,
    score: f32,
    path: Option<String>,
    start_line: Option<u64>,
    end_line: Option<u64>,
    node_kind: Option<String>,
    content: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chunk(args) => run_chunk(args, config)?,
        Commands::Tokenize(args) => run_tokenize(&args),
        Commands::Variations(args) => run_variations(&args),
        Commands::Search(args) => run_search(args, config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => SearchConfig::from_env().context("Invalid RECALL_* environment configuration"),
    }
}

fn run_chunk(args: ChunkArgs, config: SearchConfig) -> Result<()> {
    let mut chunker_config = config.chunker;
    if let Some(max) = args.max_chunk_size {
        chunker_config.max_chunk_size = max;
    }

    let chunker = Chunker::new(chunker_config, Arc::new(ParserRegistry::with_defaults()))
        .context("Invalid chunker configuration")?;
    let chunks = chunker
        .chunk_file(&args.file)
        .with_context(|| format!("Failed to chunk {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{}. {} lines {}-{} ({} bytes)",
            i + 1,
            chunk.node_kind,
            chunk.start_line,
            chunk.end_line,
            chunk.size
        );
        for line in chunk.content.lines() {
            println!("   {line}");
        }
        println!();
    }
    Ok(())
}

fn run_tokenize(args: &TokenizeArgs) {
    for token in &CodeTokenizer::new().tokenize(&args.text, args.query) {
        println!("{token}");
    }
}

fn run_variations(args: &VariationsArgs) {
    let query = args.query.join(" ");
    for variation in CodeTokenizer::new().generate_query_variations(&query) {
        println!("{variation}");
    }
}

async fn run_search(args: SearchArgs, mut config: SearchConfig) -> Result<()> {
    if let Some(weight) = args.vector_weight {
        config.vector_weight = weight;
    }
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Invalid project path {}", args.root.display()))?;
    let query = args.query.join(" ");

    let mut index = CodeIndex::new(config, InMemoryVectorStore::new())
        .context("Failed to build search index")?;
    let stats = index
        .index_directory(&root)
        .await
        .with_context(|| format!("Failed to index {}", root.display()))?;
    log::info!(
        "Indexed {} files into {} chunks",
        stats.files_indexed,
        stats.chunks_indexed
    );

    let limit = index.config().effective_limit(args.limit);
    let results = index.search(&query, limit).await.context("Search failed")?;

    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|result| SearchHit {
            path: result.metadata.get("path").and_then(|v| v.as_str()).map(str::to_string),
            start_line: result.metadata.get("start_line").and_then(|v| v.as_u64()),
            end_line: result.metadata.get("end_line").and_then(|v| v.as_u64()),
            node_kind: result
                .metadata
                .get("node_kind")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            content: chunk_content(&result.text).to_string(),
            id: result.id,
            score: result.score,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        eprintln!("No results for '{query}'");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. {} (score: {:.3})",
            i + 1,
            hit.path.as_deref().unwrap_or("<unknown>"),
            hit.score
        );
        if let (Some(start), Some(end)) = (hit.start_line, hit.end_line) {
            println!("   Lines: {start}-{end}");
        }
        if let Some(kind) = &hit.node_kind {
            println!("   Kind: {kind}");
        }
        println!();
    }
    Ok(())
}
