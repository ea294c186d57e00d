//! Grove - hierarchical tree engine
//!
//! Binary entry point: print a tree as an outline or browse it in the
//! terminal. All logic lives in the workspace crates.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use grove_app::config::{load_options, TreeOptions};
use grove_app::persistence::{FileStore, MemoryStore};
use grove_app::{Engine, LoggingCallbacks};
use grove_core::{DataKind, MultipleMode};
use tracing::{info, warn};

/// Grove - browse and rearrange a tree in the terminal
#[derive(Parser, Debug)]
#[command(name = "grove")]
#[command(about = "Browse and rearrange a tree in the terminal", long_about = None)]
struct Args {
    /// Tree data: a JSON, XML or HTML file, or a directory of `<id>.json` files
    /// loaded on demand
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Tree options (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the tree as an outline and exit
    #[arg(long)]
    print: bool,

    /// Allow selecting more than one node
    #[arg(long)]
    multiple: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Err(e) = grove_core::logging::init() {
        eprintln!("Logging disabled: {e}");
    }

    let options = build_options(&args)?;
    let mut engine = Engine::new();

    if args.print {
        let id = engine.create_tree(options, LoggingCallbacks, MemoryStore::new());
        engine.settle().await;
        if let Some(tree) = engine.tree(id) {
            print!("{}", tree.outline());
        }
        return Ok(());
    }

    engine.create_tree(options, LoggingCallbacks, FileStore::default_location());
    grove_tui::run(engine).await?;
    Ok(())
}

/// Options from `--config` (or the terminal defaults) plus the data source.
fn build_options(args: &Args) -> Result<TreeOptions> {
    let mut options = match &args.config {
        Some(path) => {
            info!("Loading options from {}", path.display());
            load_options(path)
        }
        None => TreeOptions {
            drag: grove_tui::runner::terminal_drag_settings(),
            ..TreeOptions::default()
        },
    };

    attach_data(&mut options, &args.data)?;
    if args.multiple {
        options.rules.multiple = MultipleMode::On;
    }
    Ok(options)
}

fn attach_data(options: &mut TreeOptions, data: &Path) -> Result<()> {
    if data.is_dir() {
        options.data.url = Some(data.display().to_string());
        options.data.async_load = true;
        return Ok(());
    }
    if options.data.url.is_some() {
        warn!("Ignoring data.url from config; reading {}", data.display());
        options.data.url = None;
    }
    let body = std::fs::read_to_string(data)
        .wrap_err_with(|| format!("Failed to read tree data from {}", data.display()))?;
    options.data.kind = DataKind::from_path(data);
    match options.data.kind {
        DataKind::Json => options.data.json = Some(body),
        DataKind::Markup | DataKind::Xml => options.data.markup = Some(body),
    }
    Ok(())
}
