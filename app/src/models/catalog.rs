// app/src/models/catalog.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Service level chosen at order creation. Ordered: basic < plus < deluxe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  Basic,
  Plus,
  Deluxe,
}

impl Tier {
  pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Plus, Tier::Deluxe];

  /// Exact parse; `premium` is accepted as an alias of `plus`.
  pub fn parse(raw: &str) -> Option<Tier> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "basic" => Some(Tier::Basic),
      "plus" | "premium" => Some(Tier::Plus),
      "deluxe" => Some(Tier::Deluxe),
      _ => None,
    }
  }

  /// Missing or unknown tiers fall back to basic.
  pub fn parse_or_basic(raw: Option<&str>) -> Tier {
    raw.and_then(Tier::parse).unwrap_or(Tier::Basic)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Tier::Basic => "basic",
      Tier::Plus => "plus",
      Tier::Deluxe => "deluxe",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Tier::Basic => "Soulmate Sketch",
      Tier::Plus => "Soulmate Sketch Plus",
      Tier::Deluxe => "Deluxe Soul Reading",
    }
  }

  /// Plus and deluxe orders get the extended content page.
  pub fn includes_plus_content(&self) -> bool {
    *self >= Tier::Plus
  }

  /// Only the highest tier gets the premium page.
  pub fn includes_premium_content(&self) -> bool {
    *self == Tier::Deluxe
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addon {
  Aura,
  TwinFlame,
  PastLife,
}

impl Addon {
  pub fn parse(raw: &str) -> Option<Addon> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
      "aura" => Some(Addon::Aura),
      "twin_flame" | "twinflame" => Some(Addon::TwinFlame),
      "past_life" | "pastlife" => Some(Addon::PastLife),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Addon::Aura => "aura",
      Addon::TwinFlame => "twin_flame",
      Addon::PastLife => "past_life",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Addon::Aura => "Aura Reading",
      Addon::TwinFlame => "Twin Flame Connection",
      Addon::PastLife => "Past Life Connection",
    }
  }
}

/// Requested add-ons. Order and duplicates in the input don't matter; serialized as a
/// sorted JSON list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonSet(BTreeSet<Addon>);

impl AddonSet {
  /// Builds a set from raw names, silently dropping names that are not add-ons.
  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    AddonSet(names.into_iter().filter_map(|n| Addon::parse(n.as_ref())).collect())
  }

  pub fn contains(&self, addon: Addon) -> bool {
    self.0.contains(&addon)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = Addon> + '_ {
    self.0.iter().copied()
  }

  pub fn names(&self) -> Vec<&'static str> {
    self.iter().map(|a| a.as_str()).collect()
  }
}

impl FromIterator<Addon> for AddonSet {
  fn from_iter<T: IntoIterator<Item = Addon>>(iter: T) -> Self {
    AddonSet(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tier_aliases_and_fallback() {
    assert_eq!(Tier::parse("Premium"), Some(Tier::Plus));
    assert_eq!(Tier::parse(" deluxe "), Some(Tier::Deluxe));
    assert_eq!(Tier::parse_or_basic(Some("platinum")), Tier::Basic);
    assert_eq!(Tier::parse_or_basic(None), Tier::Basic);
  }

  #[test]
  fn tier_content_levels() {
    assert!(!Tier::Basic.includes_plus_content());
    assert!(Tier::Plus.includes_plus_content());
    assert!(!Tier::Plus.includes_premium_content());
    assert!(Tier::Deluxe.includes_plus_content() && Tier::Deluxe.includes_premium_content());
  }

  #[test]
  fn addon_set_dedups_sorts_and_drops_unknown() {
    let set = AddonSet::from_names(["past_life", "aura", "aura", "crystals", "twin-flame"]);
    assert_eq!(set.names(), vec!["aura", "twin_flame", "past_life"]);
    assert_eq!(serde_json::to_string(&set).unwrap(), r#"["aura","twin_flame","past_life"]"#);
  }
}
