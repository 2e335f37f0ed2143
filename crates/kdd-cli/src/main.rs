use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use kdd_core::{EdgeType, IndexLevel, ManifestStats};
use kdd_index::{ArtifactStore, Container};
use kdd_vector::{Embedder, HttpEmbedder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "kdd")]
#[command(about = "KDD knowledge graph indexer and query CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    output: OutputFormat,

    /// Index directory
    #[arg(long, global = true, env = "KDD_INDEX_PATH", default_value = ".kdd-index")]
    index_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a specs tree into the artifact store
    Index {
        /// Root directory to walk for markdown source files
        #[arg(env = "KDD_SPECS_PATH", default_value = "specs")]
        specs_path: PathBuf,

        /// Restrict indexing to files whose path contains this domain segment
        #[arg(long)]
        domain: Option<String>,

        /// Index level to build (L2 requires KDD_EMBEDDING_ENDPOINT)
        #[arg(long, value_enum, default_value = "l1")]
        level: LevelArg,
    },

    /// Hybrid search: lexical + semantic + graph expansion
    Search {
        query: String,
        #[arg(long, default_value_t = 0.5)]
        min_score: f64,
        #[arg(short = 'n', long = "n", default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        kind: Vec<String>,
        #[arg(long)]
        no_embeddings: bool,
    },

    /// Graph traversal from a root node
    Graph {
        root: String,
        #[arg(long, default_value_t = 2)]
        depth: usize,
        #[arg(long)]
        kind: Vec<String>,
    },

    /// Impact analysis for a node
    Impact {
        node: String,
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },

    /// Pure semantic (vector) search
    Semantic {
        query: String,
        #[arg(long, default_value_t = 0.7)]
        min_score: f64,
        #[arg(short = 'n', long = "n", default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        kind: Vec<String>,
    },

    /// Coverage report for a node
    Coverage { node: String },

    /// List every layer-violating edge
    Violations {
        #[arg(long)]
        kind: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum LevelArg {
    L1,
    L2,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("kdd=info".parse()?))
        .init();

    let cli = Cli::parse();

    match execute_command(&cli).await {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<serde_json::Value> {
    match &cli.command {
        Commands::Index { specs_path, domain, level } => run_index(&cli.index_path, specs_path, domain.as_deref(), level).await,
        Commands::Search { query, min_score, limit, kind, no_embeddings } => {
            run_search(&cli.index_path, query, *min_score, *limit, kind, *no_embeddings).await
        }
        Commands::Graph { root, depth, kind } => run_graph(&cli.index_path, root, *depth, kind),
        Commands::Impact { node, depth } => run_impact(&cli.index_path, node, *depth),
        Commands::Semantic { query, min_score, limit, kind } => run_semantic(&cli.index_path, query, *min_score, *limit, kind).await,
        Commands::Coverage { node } => run_coverage(&cli.index_path, node),
        Commands::Violations { kind } => run_violations(&cli.index_path, kind),
    }
}

fn load_container(index_path: &Path) -> Result<Container> {
    if !index_path.exists() {
        return Err(kdd_core::KddError::IndexUnavailable(format!(
            "'{}' does not exist; run `kdd index` first",
            index_path.display()
        ))
        .into());
    }
    Container::load(index_path).context("failed to load artifact tree")
}

fn some_if_nonempty(kinds: &[String]) -> Option<&[String]> {
    if kinds.is_empty() {
        None
    } else {
        Some(kinds)
    }
}

fn build_embedder(no_embeddings: bool) -> Option<HttpEmbedder> {
    if no_embeddings {
        return None;
    }
    let endpoint = std::env::var("KDD_EMBEDDING_ENDPOINT").ok()?;
    let model = std::env::var("KDD_EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
    let api_key = std::env::var("KDD_EMBEDDING_API_KEY").ok();
    Some(HttpEmbedder::new(endpoint, model, api_key))
}

async fn run_index(index_path: &Path, specs_path: &Path, domain: Option<&str>, level: &LevelArg) -> Result<serde_json::Value> {
    let store = ArtifactStore::new(index_path);
    let embedder = match level {
        LevelArg::L2 => build_embedder(false),
        LevelArg::L1 => None,
    };
    if matches!(level, LevelArg::L2) && embedder.is_none() {
        tracing::warn!("L2 requested but KDD_EMBEDDING_ENDPOINT is unset; indexing at L1");
    }
    let embedder_ref: Option<&dyn Embedder> = embedder.as_ref().map(|e| e as &dyn Embedder);

    let indexed_at = chrono::Utc::now().to_rfc3339();
    store.clear_edges()?;

    let mut stats = ManifestStats::default();
    let mut skipped = 0usize;
    let mut warnings = Vec::new();

    for entry in WalkDir::new(specs_path).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let path_str = path.to_string_lossy();
        if let Some(domain) = domain {
            if !path_str.contains(domain) {
                continue;
            }
        }

        let content = std::fs::read(path).with_context(|| format!("failed to read {path_str}"))?;
        let result = kdd_index::index_document(&store, path, &content, &indexed_at, embedder_ref)
            .await
            .with_context(|| format!("failed to index {path_str}"))?;

        if !result.success {
            skipped += 1;
            continue;
        }
        stats.nodes += 1;
        stats.edges += result.edge_count;
        stats.embeddings += result.embedding_count;
        if let Some(warning) = result.warning {
            warnings.push(warning);
        }
    }

    let manifest = kdd_core::Manifest {
        format_version: "1".to_string(),
        kdd_version: env!("CARGO_PKG_VERSION").to_string(),
        embedding_model: embedder.as_ref().map(|e| e.model_name().to_string()),
        dimensions: None,
        indexed_at: indexed_at.clone(),
        indexer: "kdd-cli".to_string(),
        structure: "json-tree".to_string(),
        index_level: IndexLevel::determine(embedder.is_some(), false),
        stats: stats.clone(),
        domains: domain.map(|d| vec![d.to_string()]).unwrap_or_default(),
        git_commit: None,
    };
    store.write_manifest(&manifest)?;

    Ok(serde_json::json!({
        "nodes": stats.nodes,
        "edges": stats.edges,
        "embeddings": stats.embeddings,
        "skipped": skipped,
        "indexLevel": manifest.index_level,
        "warnings": warnings,
    }))
}

async fn run_search(
    index_path: &Path,
    query: &str,
    min_score: f64,
    limit: usize,
    kind: &[String],
    no_embeddings: bool,
) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let vectors = container.vectors();
    let embedder = build_embedder(no_embeddings);
    let embedder_ref: Option<&dyn Embedder> = embedder.as_ref().map(|e| e as &dyn Embedder);

    let result = kdd_query::hybrid_query(
        &graph,
        &vectors,
        embedder_ref,
        query,
        true,
        2,
        some_if_nonempty(kind),
        None,
        true,
        min_score,
        limit,
        8000,
    )
    .await?;
    Ok(serde_json::to_value(result)?)
}

fn run_graph(index_path: &Path, root: &str, depth: usize, kind: &[String]) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let result = kdd_query::graph_query(&graph, root, depth, None::<&[EdgeType]>, some_if_nonempty(kind), true)?;
    Ok(serde_json::to_value(result)?)
}

fn run_impact(index_path: &Path, node: &str, depth: usize) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let result = kdd_query::impact_query(&graph, node, "modify_attribute", depth)?;
    Ok(serde_json::to_value(result)?)
}

async fn run_semantic(index_path: &Path, query: &str, min_score: f64, limit: usize, kind: &[String]) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let vectors = container.vectors();
    let embedder = build_embedder(false).context("semantic search requires KDD_EMBEDDING_ENDPOINT")?;
    let result = kdd_query::semantic_query(&graph, &vectors, &embedder, query, some_if_nonempty(kind), None, min_score, limit).await?;
    Ok(serde_json::to_value(result)?)
}

fn run_coverage(index_path: &Path, node: &str) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let result = kdd_query::coverage_query(&graph, node)?;
    Ok(serde_json::to_value(result)?)
}

fn run_violations(index_path: &Path, kind: &[String]) -> Result<serde_json::Value> {
    let container = load_container(index_path)?;
    let graph = container.graph();
    let result = kdd_query::violations_query(&graph, some_if_nonempty(kind), None);
    Ok(serde_json::to_value(result)?)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Pretty => print_pretty(value)?,
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => println!("{}: {}", key_colored, s.green()),
                    serde_json::Value::Number(n) => println!("{}: {}", key_colored, n.to_string().yellow()),
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}: {}", key_colored, val_colored);
                    }
                    _ => println!("{}: {}", key_colored, val),
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}:", "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item)?;
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
