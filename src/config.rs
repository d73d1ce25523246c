//! Option normalization and the JSON file configuration used by the CLI.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::compressor::{self, Algorithm, CompressionTuning, CompressorFn};
use crate::naming::DEFAULT_TEMPLATE;
use crate::pipeline::PressError;
use crate::selector::{Selector, SelectorSpec};

/// Default file name searched for when discovering CLI configuration.
pub const DEFAULT_CONFIG_FILE: &str = "press.config.json";

/// Hook mapping a computed output name to the final name.
pub type NameTransform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Raw pipeline options; every field is optional and falls back to a
/// documented default during construction.
#[derive(Default)]
pub struct PressOptions {
  /// Naming template for compressed variants. Defaults to
  /// `"[path].gz[query]"`.
  pub asset: Option<String>,
  /// Compression algorithm. Defaults to the built-in `"gzip"` encoder.
  pub algorithm: Option<Algorithm>,
  /// Optional rename hook applied after template expansion.
  pub filename: Option<NameTransform>,
  /// Selector deciding which asset names are eligible. Absent means every
  /// asset is eligible.
  pub test: Option<SelectorSpec>,
  /// Assets with content shorter than this many bytes are skipped.
  /// Defaults to 0.
  pub threshold: Option<u64>,
  /// Maximum accepted compressed/original size ratio, in `(0, 1]`.
  /// Defaults to 0.8.
  pub min_ratio: Option<f64>,
  /// Remove the original entry after materializing the compressed variant.
  /// Defaults to `false`.
  pub delete_original_assets: Option<bool>,
  /// Override for [`CompressionTuning::verbose`].
  pub verbose: Option<bool>,
  /// Override for [`CompressionTuning::verbose_more`].
  pub verbose_more: Option<bool>,
  /// Override for [`CompressionTuning::numiterations`].
  pub numiterations: Option<u32>,
  /// Override for [`CompressionTuning::blocksplitting`].
  pub blocksplitting: Option<bool>,
  /// Override for [`CompressionTuning::blocksplittinglast`].
  pub blocksplittinglast: Option<bool>,
  /// Override for [`CompressionTuning::blocksplittingmax`].
  pub blocksplittingmax: Option<u16>,
}

impl std::fmt::Debug for PressOptions {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PressOptions")
      .field("asset", &self.asset)
      .field("algorithm", &self.algorithm)
      .field("filename", &self.filename.as_ref().map(|_| "<hook>"))
      .field("test", &self.test)
      .field("threshold", &self.threshold)
      .field("min_ratio", &self.min_ratio)
      .field("delete_original_assets", &self.delete_original_assets)
      .finish_non_exhaustive()
  }
}

/// Immutable configuration resolved once at construction time.
pub(crate) struct ResolvedPress {
  pub(crate) template: String,
  pub(crate) compressor: CompressorFn,
  pub(crate) tuning: CompressionTuning,
  pub(crate) rename: Option<NameTransform>,
  pub(crate) selector: Selector,
  pub(crate) threshold: u64,
  pub(crate) min_ratio: f64,
  pub(crate) delete_original: bool,
}

impl std::fmt::Debug for ResolvedPress {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolvedPress")
      .field("template", &self.template)
      .field("compressor", &"<fn>")
      .field("tuning", &self.tuning)
      .field("rename", &self.rename.as_ref().map(|_| "<hook>"))
      .field("selector", &self.selector)
      .field("threshold", &self.threshold)
      .field("min_ratio", &self.min_ratio)
      .field("delete_original", &self.delete_original)
      .finish()
  }
}

/// Validate raw options and resolve them into the immutable configuration.
///
/// Fails immediately — never at first use — when the algorithm is neither a
/// recognized built-in name nor a supplied capability, or when `min_ratio`
/// falls outside `(0, 1]`.
pub(crate) fn resolve(options: PressOptions) -> Result<ResolvedPress, PressError> {
  let defaults = CompressionTuning::default();
  let tuning = CompressionTuning {
    verbose: options.verbose.unwrap_or(defaults.verbose),
    verbose_more: options.verbose_more.unwrap_or(defaults.verbose_more),
    numiterations: options.numiterations.unwrap_or(defaults.numiterations),
    blocksplitting: options.blocksplitting.unwrap_or(defaults.blocksplitting),
    blocksplittinglast: options
      .blocksplittinglast
      .unwrap_or(defaults.blocksplittinglast),
    blocksplittingmax: options
      .blocksplittingmax
      .unwrap_or(defaults.blocksplittingmax),
  };

  let compressor = match options.algorithm {
    None => compressor::resolve_builtin("gzip").ok_or_else(missing_algorithm)?,
    Some(Algorithm::Named(name)) => {
      compressor::resolve_builtin(&name).ok_or_else(missing_algorithm)?
    }
    Some(Algorithm::Custom(capability)) => capability,
  };

  let min_ratio = options.min_ratio.unwrap_or(0.8);
  if !(min_ratio > 0.0 && min_ratio <= 1.0) {
    return Err(PressError::Configuration {
      message: format!("minRatio must lie in (0, 1], got {min_ratio}"),
    });
  }

  Ok(ResolvedPress {
    template: options.asset.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
    compressor,
    tuning,
    rename: options.filename,
    selector: Selector::from_spec(options.test),
    threshold: options.threshold.unwrap_or(0),
    min_ratio,
    delete_original: options.delete_original_assets.unwrap_or(false),
  })
}

fn missing_algorithm() -> PressError {
  PressError::Configuration {
    message: "algorithm incorrect or not found".to_string(),
  }
}

/// Selector patterns in file configuration: a single pattern string or an
/// ordered list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TestPatterns {
  /// A single pattern.
  One(String),
  /// An ordered set of patterns, combined with OR semantics.
  Many(Vec<String>),
}

/// File configuration recognized by the CLI.
///
/// Mirrors the library option surface, minus the rename hook (which is
/// code-only). Missing fields fall back to the pipeline defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PressFileConfig {
  /// Naming template for compressed variants.
  pub asset: String,
  /// Built-in algorithm name.
  pub algorithm: String,
  /// Selector patterns; absent means every asset is eligible.
  ///
  /// Also recognized under the legacy `regExp` key.
  #[serde(alias = "regExp")]
  pub test: Option<TestPatterns>,
  /// Minimum content length in bytes.
  pub threshold: u64,
  /// Maximum accepted compressed/original size ratio.
  pub min_ratio: f64,
  /// Remove originals after materializing compressed variants.
  pub delete_original_assets: bool,
  /// Encoder tuning keys, accepted at the top level of the file.
  #[serde(flatten)]
  pub tuning: CompressionTuning,
}

impl Default for PressFileConfig {
  fn default() -> Self {
    Self {
      asset: DEFAULT_TEMPLATE.to_string(),
      algorithm: "gzip".to_string(),
      test: None,
      threshold: 0,
      min_ratio: 0.8,
      delete_original_assets: false,
      tuning: CompressionTuning::default(),
    }
  }
}

impl PressFileConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall
  /// back to default values so the CLI can run without any configuration.
  pub fn discover(dir: &Path) -> Self {
    Self::from_path(&dir.join(DEFAULT_CONFIG_FILE)).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Convert the file configuration into raw pipeline options.
  ///
  /// Selector patterns are compiled here; an invalid pattern is a
  /// configuration error.
  pub fn into_options(self) -> Result<PressOptions, PressError> {
    let test = match self.test {
      None => None,
      Some(TestPatterns::One(pattern)) => Some(SelectorSpec::Pattern(compile(&pattern)?)),
      Some(TestPatterns::Many(patterns)) => {
        let compiled = patterns
          .iter()
          .map(|pattern| compile(pattern))
          .collect::<Result<Vec<_>, _>>()?;
        Some(SelectorSpec::AnyOf(compiled))
      }
    };

    Ok(PressOptions {
      asset: Some(self.asset),
      algorithm: Some(Algorithm::Named(self.algorithm)),
      filename: None,
      test,
      threshold: Some(self.threshold),
      min_ratio: Some(self.min_ratio),
      delete_original_assets: Some(self.delete_original_assets),
      verbose: Some(self.tuning.verbose),
      verbose_more: Some(self.tuning.verbose_more),
      numiterations: Some(self.tuning.numiterations),
      blocksplitting: Some(self.tuning.blocksplitting),
      blocksplittinglast: Some(self.tuning.blocksplittinglast),
      blocksplittingmax: Some(self.tuning.blocksplittingmax),
    })
  }
}

fn compile(pattern: &str) -> Result<Regex, PressError> {
  Regex::new(pattern).map_err(|err| PressError::Configuration {
    message: format!("invalid test pattern `{pattern}`: {err}"),
  })
}
