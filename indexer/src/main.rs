use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use urlindex_core::persist::{read_index, read_metadata};
use urlindex_core::{
    Accumulator, BuildOptions, DocTable, IndexEngine, IndexFormat, IndexKind, Language, Metadata, NonPositionalIndex,
    OutputPaths, PageSource, PositionalIndex, TokenizerConfig, TracingSink,
};
use urlindex_fetcher::{ContentKind, FetchConfig, HttpPageSource};

mod input;

#[derive(Parser)]
#[command(name = "urlindex")]
#[command(about = "Build positional or non-positional inverted indexes from a list of urls", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every url and write the index plus its metadata
    Build(BuildArgs),
    /// Read a built index back and print its statistics
    Inspect(InspectArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// JSON array of urls (or of objects with a `url` field), or one url per line
    #[arg(long)]
    input: PathBuf,
    /// Output path prefix, e.g. `out/title` -> `out/title.non_pos_index.json`
    #[arg(long)]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = KindArg::NonPositional)]
    kind: KindArg,
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,
    /// Part of each page that gets indexed
    #[arg(long, value_enum, default_value_t = ContentArg::Body)]
    content: ContentArg,
    /// Number of pages fetched in parallel; 1 keeps ids in input order
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    #[arg(long, default_value = "urlindex-bot/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// Pages larger than this are skipped
    #[arg(long, default_value_t = 2 * 1024 * 1024)]
    max_body_bytes: usize,
    /// Drop stop-words of this language before indexing
    #[arg(long, value_enum)]
    stopwords: Option<LanguageArg>,
    /// Stem terms in this language before indexing
    #[arg(long, value_enum)]
    stem: Option<LanguageArg>,
    /// Documents producing more tokens than this are counted as failed
    #[arg(long)]
    max_tokens: Option<usize>,
    /// Also write a copy of the index with terms stemmed in this language
    #[arg(long, value_enum)]
    stemmed_copy: Option<LanguageArg>,
}

#[derive(Args)]
struct InspectArgs {
    /// Output path prefix used when building
    #[arg(long)]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,
    /// Print the posting of this term
    #[arg(long)]
    term: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    NonPositional,
    Positional,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Bincode,
}

#[derive(Clone, Copy, ValueEnum)]
enum ContentArg {
    Body,
    Title,
    Headers,
    Paragraphs,
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    English,
    French,
}

impl From<KindArg> for IndexKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::NonPositional => IndexKind::NonPositional,
            KindArg::Positional => IndexKind::Positional,
        }
    }
}

impl From<FormatArg> for IndexFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => IndexFormat::Json,
            FormatArg::Bincode => IndexFormat::Bincode,
        }
    }
}

impl From<ContentArg> for ContentKind {
    fn from(c: ContentArg) -> Self {
        match c {
            ContentArg::Body => ContentKind::Body,
            ContentArg::Title => ContentKind::Title,
            ContentArg::Headers => ContentKind::Headers,
            ContentArg::Paragraphs => ContentKind::Paragraphs,
        }
    }
}

impl From<LanguageArg> for Language {
    fn from(l: LanguageArg) -> Self {
        match l {
            LanguageArg::English => Language::English,
            LanguageArg::French => Language::French,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build(args),
        Commands::Inspect(args) => inspect(args),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let urls = input::read_urls(&args.input)?;
    let source = HttpPageSource::new(FetchConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        user_agent: args.user_agent.clone(),
        max_body_bytes: args.max_body_bytes,
        content: args.content.into(),
        ..Default::default()
    })
    .context("failed to set up http client")?;

    let options = BuildOptions {
        tokenizer: TokenizerConfig {
            stopwords: args.stopwords.map(Into::into),
            stemmer: args.stem.map(Into::into),
            max_tokens: args.max_tokens,
        },
        concurrency: args.concurrency.max(1),
        format: args.format.into(),
        stemmed_copy: args.stemmed_copy.map(Into::into),
    };
    let kind: IndexKind = args.kind.into();
    let format = options.format;
    tracing::info!(urls = urls.len(), %kind, concurrency = options.concurrency, "starting build");

    let paths = OutputPaths::new(&args.output);
    let meta = match kind {
        IndexKind::NonPositional => run::<NonPositionalIndex>(&urls, &source, options, &paths)?,
        IndexKind::Positional => run::<PositionalIndex>(&urls, &source, options, &paths)?,
    };

    println!("{}", meta.summary());
    eprintln!(
        "done: documents={} failed={} -> {}",
        meta.num_documents,
        meta.failed_urls,
        paths.index(kind, format).display()
    );
    Ok(())
}

fn run<A: Accumulator>(
    urls: &[String],
    source: &(dyn PageSource + Sync),
    options: BuildOptions,
    paths: &OutputPaths,
) -> Result<Metadata> {
    let engine = IndexEngine::<A>::new(options, Arc::new(TracingSink));
    let meta = engine.run(urls, source, paths).context("failed to write index")?;
    Ok(meta)
}

fn inspect(args: InspectArgs) -> Result<()> {
    let paths = OutputPaths::new(&args.output);
    let meta = read_metadata(&paths.metadata())?;
    println!("{}", meta.summary());
    for failure in &meta.failures {
        println!("failed {} ({:?}): {}", failure.url, failure.kind, failure.reason);
    }

    let Some(term) = args.term else { return Ok(()) };
    let docs = meta.doc_table().ok_or_else(|| anyhow!("document table in metadata has gaps"))?;
    let format: IndexFormat = args.format.into();
    let path = paths.index(meta.index_kind, format);
    let term = term.to_lowercase();
    match meta.index_kind {
        IndexKind::NonPositional => show_term::<NonPositionalIndex>(&path, format, &term, &docs),
        IndexKind::Positional => show_term::<PositionalIndex>(&path, format, &term, &docs),
    }
}

fn show_term<A: Accumulator>(path: &Path, format: IndexFormat, term: &str, docs: &DocTable) -> Result<()> {
    let index: A = read_index(path, format)?;
    let Some(posting) = index.serialize_posting(term) else {
        println!("{term}: not in index");
        return Ok(());
    };
    println!("{term}: {posting}");
    let ids: Vec<u64> = match &posting {
        serde_json::Value::Array(ids) => ids.iter().filter_map(|v| v.as_u64()).collect(),
        serde_json::Value::Object(by_doc) => by_doc.keys().filter_map(|k| k.parse().ok()).collect(),
        _ => Vec::new(),
    };
    for id in ids {
        let url = u32::try_from(id).ok().and_then(|id| docs.url_of(id)).unwrap_or("?");
        println!("  {id}\t{url}");
    }
    Ok(())
}
