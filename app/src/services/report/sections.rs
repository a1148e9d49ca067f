// app/src/services/report/sections.rs

//! Report headings and the heading-based section splitter.
//!
//! A line is a heading when, after trimming, removing one leading `#`/`##` marker and a
//! trailing `:`, it equals one of the known headings exactly (case-sensitive). Body text
//! that happens to contain a heading on its own line is split there too.

use crate::models::Addon;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
  Overview,
  Personality,
  Connection,
  Meeting,
  Seeking,
  Astrology,
  Aura,
  TwinFlame,
  PastLife,
}

impl Section {
  pub const ALL: [Section; 9] = [
    Section::Overview,
    Section::Personality,
    Section::Connection,
    Section::Meeting,
    Section::Seeking,
    Section::Astrology,
    Section::Aura,
    Section::TwinFlame,
    Section::PastLife,
  ];

  /// The six sections every report has.
  pub const CORE: [Section; 6] = [
    Section::Overview,
    Section::Personality,
    Section::Connection,
    Section::Meeting,
    Section::Seeking,
    Section::Astrology,
  ];

  pub fn heading(&self) -> &'static str {
    match self {
      Section::Overview => "Overview",
      Section::Personality => "Personality & Vibe",
      Section::Connection => "Attachment Style & Love Languages",
      Section::Meeting => "First Meeting Scenario",
      Section::Seeking => "What They're Looking For Now",
      Section::Astrology => "Numerology & Astro Notes",
      Section::Aura => "Aura Reading",
      Section::TwinFlame => "Twin Flame Connection",
      Section::PastLife => "Past Life Connection",
    }
  }

  /// The extra section an add-on unlocks.
  pub fn for_addon(addon: Addon) -> Section {
    match addon {
      Addon::Aura => Section::Aura,
      Addon::TwinFlame => Section::TwinFlame,
      Addon::PastLife => Section::PastLife,
    }
  }

  pub fn from_heading_line(line: &str) -> Option<Section> {
    let mut candidate = line.trim();
    if let Some(rest) = candidate.strip_prefix("##") {
      candidate = rest;
    } else if let Some(rest) = candidate.strip_prefix('#') {
      candidate = rest;
    }
    let candidate = candidate.trim();
    let candidate = candidate.strip_suffix(':').unwrap_or(candidate).trim();
    Section::ALL.into_iter().find(|s| s.heading() == candidate)
  }
}

/// Section bodies keyed by section. Only non-empty bodies are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSections(BTreeMap<Section, String>);

impl ParsedSections {
  pub fn get(&self, section: Section) -> Option<&str> {
    self.0.get(&section).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
    self.0.iter().map(|(s, body)| (*s, body.as_str()))
  }
}

pub fn parse_sections(text: &str) -> ParsedSections {
  let mut bodies: BTreeMap<Section, Vec<&str>> = BTreeMap::new();
  let mut current = Section::Overview;

  for line in text.lines() {
    match Section::from_heading_line(line) {
      Some(section) => current = section,
      None => bodies.entry(current).or_default().push(line),
    }
  }

  ParsedSections(
    bodies
      .into_iter()
      .filter_map(|(section, lines)| {
        let body = lines.join("\n").trim().to_string();
        (!body.is_empty()).then_some((section, body))
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn heading_markers_and_colons_are_stripped() {
    assert_eq!(Section::from_heading_line("## Overview"), Some(Section::Overview));
    assert_eq!(Section::from_heading_line("  # Aura Reading:  "), Some(Section::Aura));
    assert_eq!(Section::from_heading_line("Personality & Vibe:"), Some(Section::Personality));
    assert_eq!(Section::from_heading_line("overview"), None);
    assert_eq!(Section::from_heading_line("The Overview"), None);
  }

  #[test]
  fn text_without_headings_is_overview() {
    let parsed = parse_sections("Just a paragraph.\nAnd another line.");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed.get(Section::Overview), Some("Just a paragraph.\nAnd another line."));
  }

  #[test]
  fn preamble_goes_to_overview_and_empty_sections_drop() {
    let text = "Intro text\n## Personality & Vibe\nKind.\n## First Meeting Scenario\n\n## Aura Reading:\nGolden.";
    let parsed = parse_sections(text);
    assert_eq!(parsed.get(Section::Overview), Some("Intro text"));
    assert_eq!(parsed.get(Section::Personality), Some("Kind."));
    assert_eq!(parsed.get(Section::Meeting), None);
    assert_eq!(parsed.get(Section::Aura), Some("Golden."));
  }

  #[test]
  fn heading_inside_body_still_splits() {
    let parsed = parse_sections("## Overview\nHello\nAura Reading\nthis was meant as prose");
    assert_eq!(parsed.get(Section::Overview), Some("Hello"));
    assert_eq!(parsed.get(Section::Aura), Some("this was meant as prose"));
  }
}
