//! Output-name computation: path/query splitting and naming-template expansion.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Default naming template: append `.gz` to the path, preserving any query.
pub const DEFAULT_TEMPLATE: &str = "[path].gz[query]";

fn template_tokens() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"\[(file|path|query)\]").expect("invalid token regex"))
}

/// Split an asset name into its path and query components.
///
/// The query starts at the first `?` and includes it; it is empty when the
/// name carries no query.
pub fn split_name(name: &str) -> (&str, &str) {
  match name.find('?') {
    Some(index) => (&name[..index], &name[index..]),
    None => (name, ""),
  }
}

/// Expand a naming template against an asset name.
///
/// Exactly three tokens are recognized: `[file]` (the whole original name),
/// `[path]` (the portion before any query), and `[query]` (the query with its
/// leading `?`, or the empty string). Substitution happens in a single pass,
/// so token-shaped text contributed by the asset name itself is never
/// re-expanded, and unrecognized bracket tokens are left verbatim.
pub fn expand_template(template: &str, name: &str) -> String {
  let (path, query) = split_name(name);
  template_tokens()
    .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
      "file" => name,
      "path" => path,
      _ => query,
    })
    .into_owned()
}
