use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use onto_layout::Config;
use onto_layout::graph::Graph;
use onto_layout::layout::{
    self, CacheOrchestrator, FileStore, LayoutConfig, PositionStore, positions,
};
use onto_layout::sparql::parse_select_results;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutChoice {
    Euler,
    EulerTight,
    Grid,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// SPARQL JSON results of the class query.
    #[arg(long)]
    classes: PathBuf,
    /// SPARQL JSON results of the property query.
    #[arg(long)]
    properties: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".layout-cache")]
    cache_dir: PathBuf,
    #[arg(long)]
    no_cache: bool,
    #[arg(long, value_enum, default_value = "euler")]
    layout: LayoutChoice,
    /// Overrides the spring length of the force-directed layouts.
    #[arg(long)]
    spring_length: Option<f64>,
    /// Comma-separated subontologies; defaults to the configured ones.
    #[arg(long, value_delimiter = ',')]
    subs: Vec<String>,
    #[arg(long)]
    separate_subs: bool,
    /// Writes the final positions as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "silent" | "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn layout_config(choice: LayoutChoice, spring_length: Option<f64>) -> LayoutConfig {
    match (choice, spring_length) {
        (LayoutChoice::Grid, _) => layout::config::grid(),
        (LayoutChoice::Euler | LayoutChoice::EulerTight, Some(length)) => {
            layout::config::euler_variable(length)
        }
        (LayoutChoice::Euler, None) => layout::config::euler(),
        (LayoutChoice::EulerTight, None) => layout::config::euler_tight(),
    }
}

fn load_graph(classes: &Path, properties: &Path) -> Result<Graph> {
    let raw_classes = fs::read_to_string(classes)
        .with_context(|| format!("failed to read {}", classes.display()))?;
    let raw_properties = fs::read_to_string(properties)
        .with_context(|| format!("failed to read {}", properties.display()))?;

    let classes = parse_select_results(&raw_classes)
        .with_context(|| format!("failed to parse {}", classes.display()))?;
    let properties = parse_select_results(&raw_properties)
        .with_context(|| format!("failed to parse {}", properties.display()))?;

    Ok(Graph::from_bindings(&classes, &properties))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    setup_logging(args.log_level.as_deref().unwrap_or(&config.log_level));

    let mut graph = load_graph(&args.classes, &args.properties)?;
    let subs = if args.subs.is_empty() {
        config.default_sub_ontologies.clone()
    } else {
        args.subs.clone()
    }
    .into_iter()
    .collect::<BTreeSet<_>>();
    for sub in config.unknown_sub_ontologies(&subs) {
        log::warn!("Unknown subontology {sub}, it will contribute no nodes.");
    }

    let store = if args.no_cache {
        PositionStore::unavailable()
    } else {
        PositionStore::detect(FileStore::open(&args.cache_dir))
    };
    let mut orchestrator = CacheOrchestrator::from_config(store, &config);
    let layout = layout_config(args.layout, args.spring_length);

    let started = orchestrator
        .run_cached(&mut graph, &layout, &subs, args.separate_subs)
        .context("layout failed")?;
    let stop = orchestrator.runner_mut().finish(&mut graph);

    println!(
        "{} nodes, {} edges, layout {} ({})",
        graph.node_count(),
        graph.edge_count(),
        layout.name(),
        match orchestrator.last_outcome() {
            Some(outcome) => format!("{outcome:?}").to_lowercase(),
            None => "not run".to_owned(),
        }
    );
    match stop {
        Some(stop) => println!(
            "stopped: {} after {} iterations in {} ms{}",
            stop.status,
            stop.iterations,
            stop.elapsed.as_millis(),
            if stop.persisted { ", cached" } else { "" }
        ),
        None if started => println!("applied cached layout"),
        None => println!("nothing to lay out"),
    }

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&positions(graph.nodes()))
            .context("failed to serialize positions")?;
        fs::write(output, json)
            .with_context(|| format!("failed to write {}", output.display()))?;
    }

    Ok(())
}
