//! refscout CLI - find symbol usages through a persistent dependency graph.
//!
//! Usage:
//!   refscout usages <file> --line 42    # Usages of the symbol at file:42
//!   refscout build                      # Rebuild the dependency graph
//!   refscout watch                      # Keep the graph fresh on saves
//!   refscout stats                      # Graph statistics
//!   refscout clear-cache                # Drop all cached graphs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use refscout::{find_subject, GraphCache, ProjectRegistry, Settings};
use refscout::project::BuildHandle;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Spinner frames for build progress, cycled every poll.
const LOADING_FRAMES: [&str; 8] = [
    "=    ", " =   ", "  =  ", "   = ", "    =", "   = ", "  =  ", " =   ",
];

/// How often the build progress display is refreshed.
const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Give up on *displaying* progress after this long; the build worker
/// itself always runs to completion.
const PROGRESS_DISPLAY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "refscout")]
#[command(about = "Find symbol usages through a persistent dependency graph", long_about = None)]
struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Project name for settings overrides and the graph cache
    /// (default: the root directory's name)
    #[arg(short, long)]
    project: Option<String>,

    /// Settings file (default: <root>/refscout.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find usages of the symbol at a cursor position
    Usages {
        /// File the cursor is in
        file: PathBuf,

        /// 1-based cursor line
        #[arg(short, long)]
        line: u32,

        /// 1-based cursor column
        #[arg(long, default_value = "1")]
        column: u32,
    },

    /// Rebuild the dependency graph for the project
    Build,

    /// Watch project folders and refresh the graph on every save
    Watch,

    /// Show dependency graph statistics
    Stats,

    /// Remove all cached dependency graphs
    ClearCache,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let project = cli
        .project
        .clone()
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "default".to_string());
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join("refscout.toml"));
    let settings = Settings::load(&config_path, Some(&project))?;

    init_logging(&settings);

    let registry = Arc::new(ProjectRegistry::new(GraphCache::new(root.join(".refscout"))));
    let folders = vec![root.clone()];

    match cli.command {
        Commands::Usages { file, line, column } => {
            let file = file.canonicalize().unwrap_or(file);
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let cursor = cursor_offset(&text, line, column);

            let Some(subject) = find_subject(&text, cursor) else {
                println!("No class/function/variable definition found at or above the cursor");
                return Ok(());
            };

            if !settings.disable_dep_graph {
                if let Some(handle) = registry.ensure_graph(&project, &folders, &settings) {
                    wait_for_build(handle)?;
                }
            }

            let usages = registry.find_usages(&project, &subject.name, &file, &folders, &settings);
            if usages.is_empty() {
                println!("No usages of `{}` found", subject.name);
                return Ok(());
            }
            println!("{} usage(s) of `{}`:", usages.len(), subject.name);
            for usage in &usages {
                println!("  {}", usage.display_label(&folders));
            }
        }

        Commands::Build => {
            let Some(handle) = registry.rebuild(&project, folders, settings) else {
                println!("A build for `{project}` is already in progress");
                return Ok(());
            };
            wait_for_build(handle)?;
        }

        Commands::Watch => {
            if let Some(handle) = registry.ensure_graph(&project, &folders, &settings) {
                wait_for_build(handle)?;
            }
            let _watcher = refscout::start_watching(
                Arc::clone(&registry),
                &project,
                &folders,
                settings,
            )?;
            println!("Watching {} for changes. Press Ctrl+C to stop.", root.display());
            loop {
                std::thread::park();
            }
        }

        Commands::Stats => {
            let cache = GraphCache::new(root.join(".refscout"));
            let Some((graph, record)) = cache.load(&project) else {
                println!("No cached graph for `{project}`. Run `refscout build` first.");
                return Ok(());
            };
            let built = chrono::DateTime::from_timestamp(record.last_update, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Project:      {project}");
            println!("Dependencies: {}", graph.num_deps());
            println!("Last build:   {built}");
            if record.is_stale() {
                println!("              (older than 24h, next query will rebuild)");
            }
        }

        Commands::ClearCache => {
            registry.clear_caches()?;
            println!("Cleared all cached dependency graphs");
        }
    }

    Ok(())
}

fn init_logging(settings: &Settings) {
    let default_level = if settings.verbose_logging {
        "refscout=debug"
    } else {
        "refscout=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Byte offset of a 1-based (line, column) cursor position. Columns
/// count characters, not bytes, so positions stay valid in non-ASCII
/// lines.
fn cursor_offset(text: &str, line: u32, column: u32) -> usize {
    let mut offset = 0;
    for (nr, raw) in text.split_inclusive('\n').enumerate() {
        if nr as u32 + 1 == line {
            let content = raw.trim_end_matches(['\n', '\r']);
            let col = column.saturating_sub(1) as usize;
            let byte = content
                .char_indices()
                .nth(col)
                .map(|(i, _)| i)
                .unwrap_or(content.len());
            return offset + byte;
        }
        offset += raw.len();
    }
    text.len()
}

/// Animate the spinner while the build worker runs. Display gives up
/// after 60 seconds; the worker still finishes and persists its graph.
fn wait_for_build(handle: BuildHandle) -> Result<()> {
    let started = Instant::now();
    let mut frame = 0usize;

    loop {
        match handle.done.recv_timeout(PROGRESS_POLL) {
            Ok(summary) => {
                eprint!("\r");
                println!(
                    "Graph built: {} files scanned, {} dependencies in {:.1}s",
                    summary.files_scanned,
                    summary.num_deps,
                    summary.elapsed.as_secs_f64()
                );
                return Ok(());
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if started.elapsed() > PROGRESS_DISPLAY_TIMEOUT {
                    eprintln!("\rBuild is taking a while; it will finish in the background");
                    return Ok(());
                }
                eprint!(
                    "\r[{}] refscout: {} dependencies",
                    LOADING_FRAMES[frame],
                    handle.progress.deps_found()
                );
                let _ = std::io::stderr().flush();
                frame = (frame + 1) % LOADING_FRAMES.len();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                bail!("build worker terminated unexpectedly");
            }
        }
    }
}
