//! Compressor capabilities and the built-in zopfli-backed encoders.

use std::io;
use std::num::NonZeroU64;
use std::sync::Arc;

use serde::Deserialize;
use zopfli::Format;

/// Tuning options handed to the compressor capability alongside each asset's
/// content.
///
/// The bag is passed through verbatim; custom capabilities may interpret it
/// however they like. For the built-in encoders, `numiterations`,
/// `blocksplitting`, and `blocksplittingmax` map onto the corresponding
/// zopfli knobs, while `verbose`, `verbose_more`, and `blocksplittinglast`
/// are accepted for compatibility with the original option surface but have
/// no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompressionTuning {
  /// Emit verbose encoder output.
  pub verbose: bool,
  /// Emit even more verbose encoder output.
  pub verbose_more: bool,
  /// Number of compression iterations; more iterations trade time for size.
  pub numiterations: u32,
  /// Whether the encoder may split the input into multiple blocks.
  pub blocksplitting: bool,
  /// Whether block splitting is attempted after the last block.
  pub blocksplittinglast: bool,
  /// Maximum number of blocks to split into.
  pub blocksplittingmax: u16,
}

impl Default for CompressionTuning {
  fn default() -> Self {
    Self {
      verbose: false,
      verbose_more: false,
      numiterations: 15,
      blocksplitting: true,
      blocksplittinglast: false,
      blocksplittingmax: 15,
    }
  }
}

/// Compressor capability: content plus tuning in, compressed bytes or an
/// error out.
///
/// Capabilities are invoked concurrently, one call per eligible asset, and
/// must therefore be free of shared mutable state.
pub type CompressorFn = Arc<dyn Fn(&[u8], &CompressionTuning) -> io::Result<Vec<u8>> + Send + Sync>;

/// Compression algorithm selection.
#[derive(Clone)]
pub enum Algorithm {
  /// A built-in encoder by name: `"gzip"`, `"zlib"`, or `"deflate"`.
  ///
  /// Unrecognized names fail pipeline construction.
  Named(String),
  /// A caller-supplied compressor capability.
  Custom(CompressorFn),
}

impl std::fmt::Debug for Algorithm {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
      Self::Custom(_) => f.debug_tuple("Custom").field(&"<capability>").finish(),
    }
  }
}

/// Resolve a built-in encoder by name.
///
/// Returns `None` for unrecognized names; the caller turns that into a
/// configuration error.
pub(crate) fn resolve_builtin(name: &str) -> Option<CompressorFn> {
  let format = match name {
    "gzip" => Format::Gzip,
    "zlib" => Format::Zlib,
    "deflate" => Format::Deflate,
    _ => return None,
  };

  Some(Arc::new(move |content: &[u8], tuning: &CompressionTuning| {
    let mut out = Vec::new();
    zopfli::compress(zopfli_options(tuning), format, content, &mut out)?;
    Ok(out)
  }))
}

fn zopfli_options(tuning: &CompressionTuning) -> zopfli::Options {
  zopfli::Options {
    iteration_count: NonZeroU64::new(u64::from(tuning.numiterations)).unwrap_or(NonZeroU64::MIN),
    maximum_block_splits: if tuning.blocksplitting {
      tuning.blocksplittingmax
    } else {
      1
    },
    ..zopfli::Options::default()
  }
}
