//! Eligibility predicates deciding which asset names enter the pipeline.

use regex::Regex;

/// Raw selector input, as supplied through [`crate::PressOptions`].
#[derive(Debug, Clone)]
pub enum SelectorSpec {
  /// A single pattern; the asset is eligible when it matches.
  Pattern(Regex),
  /// An ordered set of patterns; the asset is eligible when **any** matches.
  ///
  /// Note the OR semantics: an asset is skipped only when every pattern
  /// rejects it. An empty set therefore matches nothing.
  AnyOf(Vec<Regex>),
}

/// Normalized selector used by the pipeline.
#[derive(Debug, Clone)]
pub enum Selector {
  /// No selector configured; every asset is eligible.
  All,
  /// Eligible when any of the patterns matches the asset name.
  AnyOf(Vec<Regex>),
}

impl Selector {
  /// Normalize an optional [`SelectorSpec`] into a [`Selector`].
  pub fn from_spec(spec: Option<SelectorSpec>) -> Self {
    match spec {
      None => Self::All,
      Some(SelectorSpec::Pattern(pattern)) => Self::AnyOf(vec![pattern]),
      Some(SelectorSpec::AnyOf(patterns)) => Self::AnyOf(patterns),
    }
  }

  /// Returns `true` when the named asset should enter the pipeline.
  pub fn is_eligible(&self, name: &str) -> bool {
    match self {
      Self::All => true,
      Self::AnyOf(patterns) => patterns.iter().any(|pattern| pattern.is_match(name)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("test pattern should compile")
  }

  #[test]
  fn absent_selector_matches_everything() {
    let selector = Selector::from_spec(None);
    assert!(selector.is_eligible("app.js"));
    assert!(selector.is_eligible("image.png"));
  }

  #[test]
  fn single_pattern_selects_matching_names() {
    let selector = Selector::from_spec(Some(SelectorSpec::Pattern(regex(r"\.js$"))));
    assert!(selector.is_eligible("app.js"));
    assert!(!selector.is_eligible("app.css"));
  }

  #[test]
  fn any_match_in_the_set_is_sufficient() {
    let selector = Selector::from_spec(Some(SelectorSpec::AnyOf(vec![
      regex(r"\.css$"),
      regex(r"\.js$"),
    ])));

    // Matches only the second pattern; still eligible.
    assert!(selector.is_eligible("app.js"));
    assert!(selector.is_eligible("style.css"));
    assert!(!selector.is_eligible("logo.svg"));
  }

  #[test]
  fn empty_set_matches_nothing() {
    let selector = Selector::from_spec(Some(SelectorSpec::AnyOf(Vec::new())));
    assert!(!selector.is_eligible("app.js"));
  }
}
