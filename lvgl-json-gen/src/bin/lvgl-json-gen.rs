//! CLI entry point for lvgl-json-gen.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lvgl_json_gen::config::{self, Config, RegistryVariant};

/// lvgl-json-gen: generate a JSON-driven LVGL interpreter in C.
#[derive(Parser, Debug)]
#[command(name = "lvgl-json-gen", version, about)]
struct Cli {
    /// Path to the lvgl-json-gen.toml configuration file.
    config: Option<PathBuf>,

    /// API description JSON (overrides config).
    #[arg(long)]
    api: Option<PathBuf>,

    /// Output file path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a companion header (overrides config).
    #[arg(long)]
    header: Option<PathBuf>,

    /// Registry storage (overrides config).
    #[arg(long, value_enum)]
    registry: Option<RegistryVariant>,

    /// Static-array registry capacity (overrides config).
    #[arg(long)]
    capacity: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lvgl_json_gen=info")),
        )
        .init();

    let cli = Cli::parse();

    let (mut cfg, base_dir) = match &cli.config {
        Some(path) => {
            let cfg = config::load_config(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (cfg, base_dir)
        }
        None => (Config::default(), PathBuf::from(".")),
    };

    // Command-line paths are relative to the working directory, not the config.
    if let Some(api) = &cli.api {
        cfg.input.api = Some(std::path::absolute(api)?);
    }
    if let Some(header) = &cli.header {
        cfg.output.header = Some(std::path::absolute(header)?);
    }
    if let Some(variant) = cli.registry {
        cfg.registry.variant = variant;
    }
    if let Some(capacity) = cli.capacity {
        cfg.registry.capacity = capacity;
    }

    lvgl_json_gen::write_outputs(&cfg, &base_dir, cli.output.as_deref())?;
    Ok(())
}
