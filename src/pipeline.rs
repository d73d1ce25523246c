//! The conditional-compression pass over a shared asset collection.

use std::io;

use rayon::prelude::*;

use crate::assets::AssetCollection;
use crate::config::{self, PressOptions, ResolvedPress};
use crate::naming::expand_template;

/// Errors produced by pipeline construction and execution.
#[derive(Debug)]
pub enum PressError {
  /// The supplied options could not be resolved into a usable pipeline.
  Configuration {
    /// Human-readable description of the invalid option.
    message: String,
  },
  /// The compressor capability failed for one asset's content.
  Compression {
    /// Name of the asset whose compression failed.
    asset: String,
    /// Error reported by the compressor.
    source: io::Error,
  },
}

impl std::fmt::Display for PressError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Configuration { message } => write!(f, "{message}"),
      Self::Compression { asset, source } => {
        write!(f, "failed to compress `{asset}`: {source}")
      }
    }
  }
}

impl std::error::Error for PressError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Configuration { .. } => None,
      Self::Compression { source, .. } => Some(source),
    }
  }
}

/// Result of one successfully gated compression unit, ready to commit.
struct PressedAsset {
  source_name: String,
  target_name: String,
  bytes: Vec<u8>,
}

/// The asset selection and conditional-compression pipeline.
///
/// Construction resolves and validates all options once; the resulting value
/// is immutable and can drive any number of passes.
pub struct AssetPress {
  config: ResolvedPress,
}

impl AssetPress {
  /// Resolve options into a reusable pipeline.
  ///
  /// Fails with [`PressError::Configuration`] when the algorithm is neither
  /// a recognized built-in name nor a supplied capability, or when
  /// `min_ratio` falls outside `(0, 1]`.
  pub fn new(options: PressOptions) -> Result<Self, PressError> {
    Ok(Self {
      config: config::resolve(options)?,
    })
  }

  /// Run one pass over the collection.
  ///
  /// Every asset name is considered independently: the selector decides
  /// eligibility, content shorter than the threshold is skipped, the
  /// compressor runs, and results failing the ratio gate are discarded.
  /// Surviving results are inserted under their computed names (overwriting
  /// any occupant); originals are removed when configured.
  ///
  /// Eligible (name, content) pairs are snapshotted up front, compression
  /// fans out across the rayon thread pool, and all collection mutations are
  /// applied on the calling thread after every unit has finished. A failing
  /// unit does not stop the others: results that finished successfully are
  /// still committed, and the returned error is the first failure in asset
  /// name order.
  pub fn run(&self, assets: &mut AssetCollection) -> Result<(), PressError> {
    let jobs: Vec<(String, Vec<u8>)> = assets
      .iter()
      .filter(|(name, _)| self.config.selector.is_eligible(name))
      .map(|(name, asset)| (name.to_string(), asset.content().into_owned()))
      .filter(|(_, content)| content.len() as u64 >= self.config.threshold)
      .collect();

    let outcomes: Vec<Result<Option<PressedAsset>, PressError>> = jobs
      .par_iter()
      .map(|(name, content)| self.press_one(name, content))
      .collect();

    let mut first_error = None;
    for outcome in outcomes {
      match outcome {
        Ok(Some(pressed)) => {
          assets.insert_raw(pressed.target_name.clone(), pressed.bytes);
          if self.config.delete_original && pressed.target_name != pressed.source_name {
            assets.remove(&pressed.source_name);
          }
        }
        Ok(None) => {}
        Err(err) => {
          if first_error.is_none() {
            first_error = Some(err);
          }
        }
      }
    }

    match first_error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  /// Compress one snapshotted asset and apply the ratio gate.
  fn press_one(&self, name: &str, content: &[u8]) -> Result<Option<PressedAsset>, PressError> {
    let compressed =
      (self.config.compressor)(content, &self.config.tuning).map_err(|source| {
        PressError::Compression {
          asset: name.to_string(),
          source,
        }
      })?;

    // The gate only admits results that affirmatively satisfy the bound: a
    // zero-length original yields an infinite ratio (or NaN when the output
    // is also empty), and both fail here.
    let ratio = compressed.len() as f64 / content.len() as f64;
    if !(ratio <= self.config.min_ratio) {
      return Ok(None);
    }

    let mut target_name = expand_template(&self.config.template, name);
    if let Some(rename) = &self.config.rename {
      target_name = rename(&target_name);
    }

    Ok(Some(PressedAsset {
      source_name: name.to_string(),
      target_name,
      bytes: compressed,
    }))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use regex::Regex;

  use super::*;
  use crate::compressor::Algorithm;
  use crate::selector::SelectorSpec;

  /// Compressor that emits `target_len` zero bytes regardless of input.
  fn fixed_size_compressor(target_len: usize) -> Algorithm {
    Algorithm::Custom(Arc::new(
      move |_content: &[u8], _tuning: &crate::CompressionTuning| Ok(vec![0u8; target_len]),
    ))
  }

  /// Compressor that fails for names captured in the content, succeeds
  /// otherwise with a one-byte result.
  fn failing_compressor(poison: &'static [u8]) -> Algorithm {
    Algorithm::Custom(Arc::new(move |content: &[u8], _tuning: &crate::CompressionTuning| {
      if content == poison {
        Err(io::Error::other("poisoned input"))
      } else {
        Ok(vec![0u8])
      }
    }))
  }

  fn js_selector() -> Option<SelectorSpec> {
    Some(SelectorSpec::Pattern(
      Regex::new(r"\.js$").expect("test pattern should compile"),
    ))
  }

  #[test]
  fn threshold_and_selection_scenario() {
    // a.js: 600 bytes, compresses to 400 (ratio 0.667). b.js: below threshold.
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(400)),
      test: js_selector(),
      threshold: Some(100),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection =
      [("a.js", vec![b'a'; 600]), ("b.js", vec![b'b'; 50])]
        .into_iter()
        .collect();

    press.run(&mut assets).expect("pass should succeed");

    assert_eq!(
      assets.get("a.js.gz").expect("variant should exist").content().len(),
      400
    );
    // Original preserved by default.
    assert_eq!(assets.get("a.js").expect("original should remain").content().len(), 600);
    // Below threshold: entirely untouched.
    assert!(assets.contains("b.js"));
    assert!(!assets.contains("b.js.gz"));
    assert_eq!(assets.len(), 3);
  }

  #[test]
  fn ratio_gate_rejects_weak_compression() {
    // 550 / 600 ≈ 0.917 > 0.8.
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(550)),
      test: js_selector(),
      threshold: Some(100),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("a.js", vec![b'a'; 600])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(!assets.contains("a.js.gz"));
    assert_eq!(assets.len(), 1);
  }

  #[test]
  fn ratio_equal_to_min_ratio_is_accepted() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(80)),
      min_ratio: Some(0.8),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("a.js", vec![b'a'; 100])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(assets.contains("a.js.gz"));
  }

  #[test]
  fn unselected_assets_are_untouched() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(1)),
      test: js_selector(),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("logo.png", vec![0u8; 500])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert_eq!(assets.len(), 1);
    assert!(assets.contains("logo.png"));
  }

  #[test]
  fn or_selector_accepts_match_on_second_predicate() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(1)),
      test: Some(SelectorSpec::AnyOf(vec![
        Regex::new(r"\.css$").expect("test pattern should compile"),
        Regex::new(r"\.js$").expect("test pattern should compile"),
      ])),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("app.js", vec![b'x'; 200])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(assets.contains("app.js.gz"));
  }

  #[test]
  fn delete_original_removes_the_source_entry() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(10)),
      delete_original_assets: Some(true),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("a.js", vec![b'a'; 100])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(assets.contains("a.js.gz"));
    assert!(!assets.contains("a.js"));
    assert_eq!(assets.len(), 1);
  }

  #[test]
  fn delete_original_keeps_variant_when_names_coincide() {
    // `[file]` maps the variant onto the original name; the overwritten
    // entry must survive the delete step.
    let press = AssetPress::new(PressOptions {
      asset: Some("[file]".to_string()),
      algorithm: Some(fixed_size_compressor(10)),
      delete_original_assets: Some(true),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("a.js", vec![b'a'; 100])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert_eq!(assets.len(), 1);
    assert_eq!(assets.get("a.js").expect("entry should exist").content().len(), 10);
  }

  #[test]
  fn query_component_is_preserved_in_the_variant_name() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(10)),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("app.js?v=2", vec![b'a'; 100])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(assets.contains("app.js.gz?v=2"));
  }

  #[test]
  fn rename_hook_controls_the_final_name() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(10)),
      filename: Some(Box::new(|name: &str| format!("compressed/{name}"))),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("a.js", vec![b'a'; 100])].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(assets.contains("compressed/a.js.gz"));
  }

  #[test]
  fn materializer_overwrites_an_occupied_target_name() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(10)),
      test: js_selector(),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [
      ("a.js", vec![b'a'; 100]),
      ("a.js.gz", vec![b'z'; 999]),
    ]
    .into_iter()
    .collect();
    press.run(&mut assets).expect("pass should succeed");

    assert_eq!(
      assets.get("a.js.gz").expect("entry should exist").content().len(),
      10
    );
  }

  #[test]
  fn compression_failure_reports_first_error_and_commits_the_rest() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(failing_compressor(b"poison")),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [
      ("a.js", b"fine-a".to_vec()),
      ("b.js", b"poison".to_vec()),
      ("c.js", b"fine-c".to_vec()),
    ]
    .into_iter()
    .collect();

    let err = press.run(&mut assets).expect_err("pass should fail");
    match err {
      PressError::Compression { asset, .. } => assert_eq!(asset, "b.js"),
      other => panic!("unexpected error: {other}"),
    }

    // Units that finished successfully are still committed.
    assert!(assets.contains("a.js.gz"));
    assert!(assets.contains("c.js.gz"));
    assert!(!assets.contains("b.js.gz"));
  }

  #[test]
  fn zero_length_assets_are_skipped_by_the_ratio_gate() {
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(10)),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("empty.js", Vec::<u8>::new())].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(!assets.contains("empty.js.gz"));
  }

  #[test]
  fn zero_length_assets_are_skipped_even_when_the_output_is_empty() {
    // 0 / 0 is NaN; the gate must still reject the result rather than
    // materialize an empty variant.
    let press = AssetPress::new(PressOptions {
      algorithm: Some(fixed_size_compressor(0)),
      ..PressOptions::default()
    })
    .expect("options should resolve");

    let mut assets: AssetCollection = [("empty.js", Vec::<u8>::new())].into_iter().collect();
    press.run(&mut assets).expect("pass should succeed");

    assert!(!assets.contains("empty.js.gz"));
    assert_eq!(assets.len(), 1);
  }

  #[test]
  fn builtin_gzip_end_to_end() {
    let press = AssetPress::new(PressOptions::default()).expect("defaults should resolve");

    let mut assets: AssetCollection =
      [("bundle.js", b"function f() { return 1; }\n".repeat(64))]
        .into_iter()
        .collect();
    press.run(&mut assets).expect("pass should succeed");

    let variant = assets.get("bundle.js.gz").expect("variant should exist");
    let content = variant.content();
    assert_eq!(&content[..2], &[0x1f, 0x8b]);
    assert!(content.len() < assets.get("bundle.js").expect("original").content().len());
  }
}
