//! Catalog command - inspect, check and export pattern catalogs.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use gomrok_core::PatternCatalog;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List the fields of the active catalog
    Show {
        /// Catalog file (default: configured or built-in)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Load a catalog file and report problems
    Check {
        /// Catalog file to check
        path: PathBuf,
    },

    /// Write the built-in catalog as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(args: CatalogArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        CatalogCommand::Show { catalog } => {
            let config = super::load_config(config_path)?;
            let catalog = super::load_catalog(&config, catalog.as_ref())?;
            show_catalog(&catalog);
            Ok(())
        }
        CatalogCommand::Check { path } => check_catalog(&path),
        CatalogCommand::Export { output } => export_catalog(output),
    }
}

fn show_catalog(catalog: &PatternCatalog) {
    println!(
        "{} catalog v{} ({} fields)",
        style("Pattern").bold(),
        catalog.version(),
        catalog.len()
    );
    println!();
    println!(
        "  {:<26} {:<8} {:<15} {:<9} {}",
        "FIELD", "TYPE", "GROUP", "STRATEGY", "PATTERNS"
    );

    for field in catalog.fields() {
        let spec = &field.spec;
        let group = spec
            .group
            .map(|g| format!("{:?}", g).to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        let strategy = spec.strategy.map(|s| s.as_str()).unwrap_or("default");
        let active = field.active_patterns();
        let patterns = if active == field.patterns.len() {
            style(format!("{}", active)).green()
        } else {
            style(format!("{}/{}", active, field.patterns.len())).yellow()
        };

        println!(
            "  {:<26} {:<8} {:<15} {:<9} {}",
            spec.name,
            spec.value_type.as_str(),
            group,
            strategy,
            patterns
        );
    }
}

fn check_catalog(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Catalog file not found: {}", path.display());
    }

    let catalog = PatternCatalog::from_file(path)?;

    let mut skipped = 0;
    for field in catalog.fields() {
        for pattern in field.patterns.iter().filter(|p| p.regex.is_none()) {
            skipped += 1;
            println!(
                "{} {} pattern #{} does not compile: {}",
                style("⚠").yellow(),
                field.name(),
                pattern.index,
                pattern.source
            );
        }
        if field.patterns.is_empty() {
            println!(
                "{} {} has no patterns and will never match",
                style("⚠").yellow(),
                field.name()
            );
        }
    }

    println!(
        "{} Catalog v{} loaded: {} fields, {} skipped pattern(s)",
        style("✓").green(),
        catalog.version(),
        catalog.len(),
        skipped
    );

    Ok(())
}

fn export_catalog(output: Option<PathBuf>) -> anyhow::Result<()> {
    let json = PatternCatalog::builtin()?.definition().to_json()?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, json)?;
            println!(
                "{} Catalog written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
