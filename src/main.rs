//! Command-line entry point: run one compression pass over a directory of
//! build outputs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use asset_press::{AssetPress, PressFileConfig, loader};
use asset_press::config::TestPatterns;

/// Selectively recompress generated build assets in place.
#[derive(Debug, Parser)]
#[command(name = "asset_press", version, about)]
struct Cli {
  /// Directory containing the finalized build outputs.
  dir: PathBuf,

  /// Explicit configuration file (defaults to `press.config.json` in DIR).
  #[arg(long)]
  config: Option<PathBuf>,

  /// Naming template for compressed variants, e.g. `[path].gz[query]`.
  #[arg(long)]
  asset: Option<String>,

  /// Built-in algorithm name: gzip, zlib, or deflate.
  #[arg(long)]
  algorithm: Option<String>,

  /// Selector pattern; repeat for OR-combined alternatives.
  #[arg(long = "test")]
  test: Vec<String>,

  /// Skip assets whose content is shorter than this many bytes.
  #[arg(long)]
  threshold: Option<u64>,

  /// Maximum accepted compressed/original size ratio, in (0, 1].
  #[arg(long)]
  min_ratio: Option<f64>,

  /// Remove originals after materializing compressed variants.
  #[arg(long)]
  delete_original_assets: bool,

  /// Number of compression iterations for the built-in encoders.
  #[arg(long)]
  numiterations: Option<u32>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut config = match &cli.config {
    Some(path) => PressFileConfig::from_path(path)
      .with_context(|| format!("failed to load configuration from {}", path.display()))?,
    None => PressFileConfig::discover(&cli.dir),
  };

  if let Some(asset) = cli.asset {
    config.asset = asset;
  }
  if let Some(algorithm) = cli.algorithm {
    config.algorithm = algorithm;
  }
  if !cli.test.is_empty() {
    config.test = Some(TestPatterns::Many(cli.test));
  }
  if let Some(threshold) = cli.threshold {
    config.threshold = threshold;
  }
  if let Some(min_ratio) = cli.min_ratio {
    config.min_ratio = min_ratio;
  }
  if cli.delete_original_assets {
    config.delete_original_assets = true;
  }
  if let Some(numiterations) = cli.numiterations {
    config.tuning.numiterations = numiterations;
  }

  let options = config.into_options()?;
  let press = AssetPress::new(options)?;

  let mut assets = loader::load_dir(&cli.dir)
    .with_context(|| format!("failed to load assets from {}", cli.dir.display()))?;
  let before: BTreeSet<String> = assets.names().map(str::to_string).collect();

  press.run(&mut assets)?;

  loader::apply_changes(&cli.dir, &before, &assets)
    .with_context(|| format!("failed to write results under {}", cli.dir.display()))?;

  Ok(())
}
