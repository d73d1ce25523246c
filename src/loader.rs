//! Bridge between a directory of build outputs and an [`AssetCollection`].
//!
//! The CLI loads every file under a directory into a collection, runs one
//! pass, and then syncs the collection's additions and deletions back to
//! disk. Asset names are paths relative to the directory root with `/`
//! separators on every platform.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::assets::AssetCollection;

/// Load every regular file under `root` into a collection.
pub fn load_dir(root: &Path) -> Result<AssetCollection> {
  let mut collection = AssetCollection::new();
  collect_files(root, Path::new(""), &mut collection)?;
  Ok(collection)
}

fn collect_files(root: &Path, relative: &Path, collection: &mut AssetCollection) -> Result<()> {
  let current = if relative.as_os_str().is_empty() {
    root.to_path_buf()
  } else {
    root.join(relative)
  };

  let entries = fs::read_dir(&current)
    .with_context(|| format!("failed to read directory {}", current.display()))?;

  for entry in entries {
    let entry = entry?;
    let child_relative = if relative.as_os_str().is_empty() {
      Path::new(&entry.file_name()).to_path_buf()
    } else {
      relative.join(entry.file_name())
    };

    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      collect_files(root, &child_relative, collection)?;
    } else if file_type.is_file() {
      let bytes = fs::read(entry.path())
        .with_context(|| format!("failed to read {}", entry.path().display()))?;
      collection.insert_raw(asset_name(&child_relative), bytes);
    }
  }

  Ok(())
}

/// Write the pass's additions back under `root` and remove deleted originals.
///
/// `before` is the set of names present when the collection was loaded.
/// Entries that appeared since are written out (creating parent directories
/// as needed); names that disappeared are deleted from disk.
pub fn apply_changes(root: &Path, before: &BTreeSet<String>, assets: &AssetCollection) -> Result<()> {
  for (name, asset) in assets.iter() {
    if before.contains(name) {
      continue;
    }
    let destination = root.join(name);
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&destination, asset.content())
      .with_context(|| format!("failed to write {}", destination.display()))?;
  }

  for name in before {
    if !assets.contains(name) {
      let removed = root.join(name);
      fs::remove_file(&removed)
        .with_context(|| format!("failed to remove {}", removed.display()))?;
    }
  }

  Ok(())
}

fn asset_name(relative: &Path) -> String {
  relative.to_string_lossy().replace('\\', "/")
}
