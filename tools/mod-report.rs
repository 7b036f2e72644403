//! Report installed mods, their activation status and load order
//!
//! Runs discovery and the dependency pass without compiling or starting anything.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use modhost::module::{FileAssetStore, SearchPathOverlay, SourceFile};
use modhost::utils::init_logging;
use modhost::{CodeCompiler, CodeUnit, CompileError, ModLoaderConfig, ModManager, ModStatus};

#[derive(Parser, Debug)]
#[command(name = "mod-report", about = "Show installed mods and their dependency status")]
struct Args {
    /// Loader configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mods directory (overrides the configuration)
    #[arg(short, long)]
    mods_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log filter (e.g. "debug")
    #[arg(long)]
    log: Option<String>,
}

/// Compiler stand-in; the report never initializes mods
struct NoCompile;

impl CodeCompiler for NoCompile {
    fn compile(
        &self,
        unit_name: &str,
        _sources: &[SourceFile],
        _allow_host_api: bool,
    ) -> Result<Arc<dyn CodeUnit>, CompileError> {
        Err(CompileError::new([format!(
            "{} not compiled: report mode",
            unit_name
        )]))
    }
}

#[derive(Serialize)]
struct ModRow {
    name: String,
    display_name: String,
    author: String,
    version: String,
    game_version: String,
    status: ModStatus,
    dependencies: Vec<String>,
    missing: Vec<String>,
}

#[derive(Serialize)]
struct Report {
    mods_dir: PathBuf,
    mods: Vec<ModRow>,
    load_order: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref().or(Some("warn")));

    let mut config = match &args.config {
        Some(path) => ModLoaderConfig::from_file(path)?,
        None => ModLoaderConfig::default(),
    };
    if let Some(dir) = args.mods_dir {
        config.mods_dir = dir;
    }

    let mods_dir = config.mods_dir.clone();
    let mut manager = ModManager::new(
        config,
        Arc::new(NoCompile),
        Arc::new(SearchPathOverlay::new()),
        Arc::new(FileAssetStore::new()),
    );
    manager.discover()?;
    manager.resolve_statuses()?;

    let report = Report {
        mods_dir,
        mods: manager
            .catalog()
            .all_entries()
            .iter()
            .map(|entry| {
                let d = entry.descriptor();
                ModRow {
                    name: d.name().to_string(),
                    display_name: d.display_name().to_string(),
                    author: d.author().to_string(),
                    version: d.version().to_string(),
                    game_version: d.game_version().to_string(),
                    status: entry.status(),
                    dependencies: d.dependencies().to_vec(),
                    missing: entry.missing_dependencies().iter().cloned().collect(),
                }
            })
            .collect(),
        load_order: manager.load_order().to_vec(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Mods in {}", report.mods_dir.display());
    if report.mods.is_empty() {
        println!("  (none)");
    }
    for row in &report.mods {
        println!(
            "  {:<24} {:<10} {:<12} by {}",
            row.name, row.status, row.version, row.author
        );
        if row.display_name != row.name {
            println!("      shown as: {}", row.display_name);
        }
        if !row.missing.is_empty() {
            println!("      missing: {}", row.missing.join(", "));
        }
    }
    println!("Load order: {}", report.load_order.join(" -> "));
    Ok(())
}
