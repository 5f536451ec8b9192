use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clusterdex::source::load_corpus;
use clusterdex::{evaluate, BuildStats, Engine, EngineConfig, Hit, Judgment};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "clusterdex")]
#[command(about = "Build a clustered TF-IDF index over a corpus and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Input path (file or directory of .txt/.json/.jsonl documents)
    #[arg(long)]
    input: PathBuf,
    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for leader selection, overrides the config file
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and report cluster statistics
    Build {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Write the cluster dump to this file ("-" for stdout)
        #[arg(long)]
        dump: Option<String>,
        /// Print statistics and clusters as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build the index and run one query against it
    Query {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Rank by title/body zones instead of clusters
        #[arg(long, default_value_t = false)]
        zone: bool,
        /// Print hits as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Query words
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Build the index and score it against relevance judgments
    Eval {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// JSON array of {"query": "...", "relevant": [doc ids]}
        #[arg(long)]
        judgments: PathBuf,
        /// Number of results retrieved per query
        #[arg(long, default_value_t = 100)]
        k: usize,
        /// Print the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    built_at: String,
    stats: &'a BuildStats,
    clusters: Vec<clusterdex::ClusterSummary>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, dump, json } => build(&corpus, dump.as_deref(), json),
        Commands::Query { corpus, zone, json, terms } => query(&corpus, &terms.join(" "), zone, json),
        Commands::Eval { corpus, judgments, k, json } => eval(&corpus, &judgments, k, json),
    }
}

fn load_engine(args: &CorpusArgs) -> Result<(Engine, BuildStats)> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let outcome = load_corpus(&args.input)?;
    for (origin, reason) in &outcome.skipped {
        tracing::warn!(origin = %origin, reason = %reason, "document skipped");
    }
    let engine = Engine::with_corpus(config, outcome.corpus);
    let stats = engine.build()?;
    Ok((engine, stats))
}

fn build(args: &CorpusArgs, dump: Option<&str>, json: bool) -> Result<()> {
    let (engine, stats) = load_engine(args)?;
    let snapshot = engine.snapshot()?;
    let report = snapshot.report();

    match dump {
        Some("-") => print!("{report}"),
        Some(path) => {
            fs::write(path, report.to_string()).with_context(|| format!("writing cluster dump {path}"))?;
            tracing::info!(path, "cluster dump written");
        }
        None => {}
    }

    if json {
        let summary = BuildSummary {
            built_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            stats: &stats,
            clusters: report.summaries(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if dump != Some("-") {
        println!(
            "{} documents, {} terms, {} clusters (max size {}), {} unassigned",
            stats.num_docs, stats.num_terms, stats.num_leaders, stats.max_cluster_size, stats.unassigned
        );
    }
    Ok(())
}

fn query(args: &CorpusArgs, text: &str, zone: bool, json: bool) -> Result<()> {
    let (engine, _) = load_engine(args)?;
    let hits: Vec<Hit> = if zone { engine.query_zones(text)? } else { engine.query(text)? };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no results");
    }
    for hit in hits {
        println!("{}. {} (relevance = {})", hit.doc_id, hit.title, hit.score);
    }
    Ok(())
}

fn eval(args: &CorpusArgs, judgments: &Path, k: usize, json: bool) -> Result<()> {
    let raw = fs::read_to_string(judgments).with_context(|| format!("reading judgments {}", judgments.display()))?;
    let judgments: Vec<Judgment> = serde_json::from_str(&raw).context("parsing judgments")?;
    let (engine, _) = load_engine(args)?;
    let report = evaluate(&*engine.snapshot()?, &judgments, k);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} queries @ {}: precision = {:.4}, recall = {:.4}, f1 = {:.4}",
            report.queries.len(), report.k, report.precision, report.recall, report.f1
        );
    }
    Ok(())
}
