// app/src/models/quiz.rs

//! Structured quiz answers collected at intake.
//!
//! Every field is optional on the wire. Accessors return the documented default when a
//! field is absent, and [`QuizAnswers::normalized`] performs the cleanup applied before
//! answers are stored: trimming, blank-to-absent, lowercasing keywords, clamping
//! sliders and deriving the zodiac sign from the birth date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "Friend";
pub const DEFAULT_ART_STYLE: &str = "realistic";
pub const SLIDER_DEFAULT: u8 = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizAnswers {
  pub user: UserSection,
  pub birth: BirthSection,
  pub appearance: AppearanceSection,
  pub personality: PersonalitySection,
  pub relationship: RelationshipSection,
  pub preferences: PreferencesSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
  pub name: Option<String>,
  pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirthSection {
  /// `YYYY-MM-DD`
  pub date: Option<String>,
  pub time: Option<String>,
  pub place: Option<String>,
  pub zodiac: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSection {
  pub partner_gender: Option<String>,
  pub age_range: Option<String>,
  pub hair_color: Option<String>,
  pub eye_color: Option<String>,
  pub build: Option<String>,
  pub style: Option<String>,
}

/// Sliders from 0 to 100. 0 leans to the first trait of the pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalitySection {
  pub introvert_extrovert: Option<i64>,
  pub logical_emotional: Option<i64>,
  pub spontaneous_planned: Option<i64>,
  pub adventurous_homebody: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipSection {
  pub looking_for: Option<String>,
  pub love_languages: Vec<String>,
  pub attachment_hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesSection {
  pub art_style: Option<String>,
  pub cultural_background: Option<String>,
  pub mood: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_keyword(value: Option<String>) -> Option<String> {
  clean(value).map(|v| v.to_lowercase())
}

fn clamp_slider(value: Option<i64>) -> Option<i64> {
  value.map(|v| v.clamp(0, 100))
}

/// Western zodiac sign for a calendar date.
pub fn zodiac_for(date: NaiveDate) -> &'static str {
  let (month, day) = (date.month(), date.day());
  match (month, day) {
    (3, 21..=31) | (4, 1..=19) => "aries",
    (4, _) | (5, 1..=20) => "taurus",
    (5, _) | (6, 1..=20) => "gemini",
    (6, _) | (7, 1..=22) => "cancer",
    (7, _) | (8, 1..=22) => "leo",
    (8, _) | (9, 1..=22) => "virgo",
    (9, _) | (10, 1..=22) => "libra",
    (10, _) | (11, 1..=21) => "scorpio",
    (11, _) | (12, 1..=21) => "sagittarius",
    (12, _) | (1, 1..=19) => "capricorn",
    (1, _) | (2, 1..=18) => "aquarius",
    _ => "pisces",
  }
}

impl QuizAnswers {
  /// Parses the raw `quiz` form field. A blank string is an empty quiz.
  pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
    if raw.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_json::from_str(raw)
  }

  pub fn normalized(self) -> Self {
    let birth_date = clean(self.birth.date);
    let zodiac = clean_keyword(self.birth.zodiac).or_else(|| {
      birth_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| zodiac_for(d).to_string())
    });

    QuizAnswers {
      user: UserSection {
        name: clean(self.user.name),
        gender: clean_keyword(self.user.gender),
      },
      birth: BirthSection {
        date: birth_date,
        time: clean(self.birth.time),
        place: clean(self.birth.place),
        zodiac,
      },
      appearance: AppearanceSection {
        partner_gender: clean_keyword(self.appearance.partner_gender),
        age_range: clean(self.appearance.age_range),
        hair_color: clean_keyword(self.appearance.hair_color),
        eye_color: clean_keyword(self.appearance.eye_color),
        build: clean_keyword(self.appearance.build),
        style: clean_keyword(self.appearance.style),
      },
      personality: PersonalitySection {
        introvert_extrovert: clamp_slider(self.personality.introvert_extrovert),
        logical_emotional: clamp_slider(self.personality.logical_emotional),
        spontaneous_planned: clamp_slider(self.personality.spontaneous_planned),
        adventurous_homebody: clamp_slider(self.personality.adventurous_homebody),
      },
      relationship: RelationshipSection {
        looking_for: clean(self.relationship.looking_for),
        love_languages: self
          .relationship
          .love_languages
          .into_iter()
          .filter_map(|l| clean_keyword(Some(l)))
          .collect(),
        attachment_hint: clean_keyword(self.relationship.attachment_hint),
      },
      preferences: PreferencesSection {
        art_style: clean_keyword(self.preferences.art_style),
        cultural_background: clean(self.preferences.cultural_background),
        mood: clean_keyword(self.preferences.mood),
      },
    }
  }

  pub fn display_name(&self) -> &str {
    self.user.name.as_deref().unwrap_or(DEFAULT_NAME)
  }

  pub fn user_gender(&self) -> &str {
    self.user.gender.as_deref().unwrap_or("unspecified")
  }

  pub fn partner_gender(&self) -> &str {
    self.appearance.partner_gender.as_deref().unwrap_or("any")
  }

  pub fn age_range(&self) -> &str {
    self.appearance.age_range.as_deref().unwrap_or("25-35")
  }

  pub fn art_style(&self) -> &str {
    self.preferences.art_style.as_deref().unwrap_or(DEFAULT_ART_STYLE)
  }

  pub fn mood(&self) -> &str {
    self.preferences.mood.as_deref().unwrap_or("warm")
  }

  pub fn looking_for(&self) -> &str {
    self.relationship.looking_for.as_deref().unwrap_or("a lasting connection")
  }

  pub fn zodiac(&self) -> Option<&str> {
    self.birth.zodiac.as_deref()
  }

  /// `(introvert_extrovert, logical_emotional, spontaneous_planned, adventurous_homebody)`
  pub fn sliders(&self) -> [u8; 4] {
    let p = &self.personality;
    [
      p.introvert_extrovert,
      p.logical_emotional,
      p.spontaneous_planned,
      p.adventurous_homebody,
    ]
    .map(|v| v.map(|v| v.clamp(0, 100) as u8).unwrap_or(SLIDER_DEFAULT))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_object_uses_defaults() {
    let quiz = QuizAnswers::from_json_str("{}").unwrap().normalized();
    assert_eq!(quiz.display_name(), "Friend");
    assert_eq!(quiz.art_style(), "realistic");
    assert_eq!(quiz.sliders(), [50, 50, 50, 50]);
    assert_eq!(quiz.zodiac(), None);
  }

  #[test]
  fn normalization_trims_lowercases_and_clamps() {
    let raw = r#"{
      "user": {"name": "  Mara ", "gender": "Female"},
      "birth": {"date": "1994-08-03"},
      "appearance": {"hair_color": "  ", "eye_color": "Green"},
      "personality": {"introvert_extrovert": 140, "logical_emotional": -5},
      "relationship": {"love_languages": ["Quality Time", " "]},
      "preferences": {"art_style": "Ethereal"},
      "unknown_section": {"x": 1}
    }"#;
    let quiz = QuizAnswers::from_json_str(raw).unwrap().normalized();
    assert_eq!(quiz.display_name(), "Mara");
    assert_eq!(quiz.user_gender(), "female");
    assert_eq!(quiz.appearance.hair_color, None);
    assert_eq!(quiz.appearance.eye_color.as_deref(), Some("green"));
    assert_eq!(quiz.personality.introvert_extrovert, Some(100));
    assert_eq!(quiz.personality.logical_emotional, Some(0));
    assert_eq!(quiz.relationship.love_languages, vec!["quality time"]);
    assert_eq!(quiz.art_style(), "ethereal");
    assert_eq!(quiz.zodiac(), Some("leo"));
  }

  #[test]
  fn zodiac_boundaries() {
    let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    assert_eq!(zodiac_for(d("2000-03-21")), "aries");
    assert_eq!(zodiac_for(d("2000-03-20")), "pisces");
    assert_eq!(zodiac_for(d("2000-12-22")), "capricorn");
    assert_eq!(zodiac_for(d("2000-01-20")), "aquarius");
    assert_eq!(zodiac_for(d("2000-02-19")), "pisces");
  }

  #[test]
  fn blank_quiz_field_is_an_empty_quiz() {
    assert_eq!(QuizAnswers::from_json_str("  ").unwrap(), QuizAnswers::default());
    assert!(QuizAnswers::from_json_str("{not json").is_err());
  }
}
