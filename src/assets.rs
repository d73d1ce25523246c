//! Asset handles and the shared collection mutated by a compression pass.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Capability required of a build artifact: produce its current content as bytes.
///
/// The pipeline takes a single read-only snapshot of each asset's content per
/// pass; implementations are free to generate it lazily.
pub trait Asset: Send + Sync {
  /// Current content of the asset.
  fn content(&self) -> Cow<'_, [u8]>;
}

/// In-memory asset backed by an owned byte buffer.
///
/// Compressed variants materialized by the pipeline are always of this type.
pub struct RawAsset {
  bytes: Vec<u8>,
}

impl RawAsset {
  /// Wrap an owned byte buffer as an asset.
  pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      bytes: bytes.into(),
    }
  }
}

impl Asset for RawAsset {
  fn content(&self) -> Cow<'_, [u8]> {
    Cow::Borrowed(&self.bytes)
  }
}

impl std::fmt::Debug for RawAsset {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RawAsset")
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// Mapping from unique asset name to asset handle.
///
/// Names are commonly relative paths, optionally carrying a `?query` suffix.
/// The collection is owned by the invoking build process; the pipeline is
/// granted mutating access for the duration of one pass, during which it may
/// add compressed variants and remove originals. Iteration order is the name
/// order of the underlying `BTreeMap`.
#[derive(Default)]
pub struct AssetCollection {
  entries: BTreeMap<String, Box<dyn Asset>>,
}

impl AssetCollection {
  /// Create an empty collection.
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert an asset under `name`, replacing any existing entry.
  pub fn insert(&mut self, name: impl Into<String>, asset: impl Asset + 'static) {
    self.entries.insert(name.into(), Box::new(asset));
  }

  /// Insert raw bytes under `name` as a [`RawAsset`].
  pub fn insert_raw(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
    self.insert(name, RawAsset::new(bytes));
  }

  /// Remove and return the asset stored under `name`.
  pub fn remove(&mut self, name: &str) -> Option<Box<dyn Asset>> {
    self.entries.remove(name)
  }

  /// Look up the asset stored under `name`.
  pub fn get(&self, name: &str) -> Option<&dyn Asset> {
    self.entries.get(name).map(|asset| asset.as_ref())
  }

  /// Returns `true` when an entry exists under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// Iterate entry names in name order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  /// Iterate entries in name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Asset)> {
    self
      .entries
      .iter()
      .map(|(name, asset)| (name.as_str(), asset.as_ref()))
  }

  /// Number of entries in the collection.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when the collection holds no entries.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl std::fmt::Debug for AssetCollection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.entries.keys()).finish()
  }
}

impl<N: Into<String>, B: Into<Vec<u8>>> FromIterator<(N, B)> for AssetCollection {
  fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
    let mut collection = Self::new();
    for (name, bytes) in iter {
      collection.insert_raw(name, bytes);
    }
    collection
  }
}
