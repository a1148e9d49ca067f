// app/src/services/profile_text.rs
use crate::models::{AddonSet, QuizAnswers, Tier};
use crate::services::ai_client::TextModel;
use crate::services::report::sections::Section;
use std::fmt::Write as _;
use tracing::{info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a warm, insightful relationship astrologer writing a personal soulmate \
profile. Write in second person, vivid but grounded. Use each requested heading exactly as given, alone on \
its own line, followed by two or three short paragraphs. Do not add any other headings.";

/// Returned verbatim whenever the language model is unavailable or fails.
pub const FALLBACK_PROFILE: &str = "## Overview
Your soulmate is someone whose presence feels familiar from the very first moment. They carry a calm \
warmth that makes conversations flow easily, and they notice the small details that others miss.

## Personality & Vibe
Balanced between curiosity and steadiness, they enjoy both quiet evenings and spontaneous adventures. \
Friends describe them as loyal, thoughtful and quietly funny.

## Attachment Style & Love Languages
They lean toward a secure attachment style. Quality time and words of affirmation matter most to them, \
and they show love through consistent, attentive gestures.

## First Meeting Scenario
You are likely to meet in an everyday setting: a shared interest, a mutual friend's gathering or a chance \
conversation that runs longer than either of you expected.

## What They're Looking For Now
They are ready for a genuine, lasting connection built on honesty, laughter and growing together.

## Numerology & Astro Notes
Their energy resonates with harmony and partnership. Watch for meaningful coincidences in the coming months.
";

/// Whether the text came from the model or the built-in fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
  Model,
  Fallback,
}

impl TextSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      TextSource::Model => "model",
      TextSource::Fallback => "fallback",
    }
  }
}

#[derive(Debug, Clone)]
pub struct ProfileText {
  pub text: String,
  pub source: TextSource,
}

/// Headings the generated profile must contain, in order.
pub fn requested_sections(tier: Tier, addons: &AddonSet) -> Vec<Section> {
  let mut sections: Vec<Section> = Section::CORE
    .into_iter()
    .filter(|s| *s != Section::Astrology || tier.includes_plus_content())
    .collect();
  sections.extend(addons.iter().map(Section::for_addon));
  sections
}

pub fn build_prompt(quiz: &QuizAnswers, tier: Tier, addons: &AddonSet) -> String {
  let [social, feeling, planning, adventure] = quiz.sliders();
  let mut prompt = String::new();

  let _ = writeln!(prompt, "Write a soulmate profile for {}.", quiz.display_name());
  let _ = writeln!(prompt, "They identify as: {}.", quiz.user_gender());
  let _ = writeln!(
    prompt,
    "Their soulmate: {} partner, age {}.",
    quiz.partner_gender(),
    quiz.age_range()
  );
  if let Some(sign) = quiz.zodiac() {
    let _ = writeln!(prompt, "Zodiac sign: {}.", sign);
  }
  if let Some(place) = quiz.birth.place.as_deref() {
    let _ = writeln!(prompt, "Birthplace: {}.", place);
  }
  let _ = writeln!(
    prompt,
    "Personality sliders (0-100): introvert→extrovert {}, logical→emotional {}, spontaneous→planned {}, adventurous→homebody {}.",
    social, feeling, planning, adventure
  );
  let _ = writeln!(prompt, "Looking for: {}.", quiz.looking_for());
  if !quiz.relationship.love_languages.is_empty() {
    let _ = writeln!(prompt, "Love languages: {}.", quiz.relationship.love_languages.join(", "));
  }
  if let Some(hint) = quiz.relationship.attachment_hint.as_deref() {
    let _ = writeln!(prompt, "Attachment notes: {}.", hint);
  }
  let _ = writeln!(prompt, "Overall mood: {}.", quiz.mood());
  let _ = writeln!(prompt, "Package: {}.", tier.display_name());

  prompt.push_str("\nUse exactly these headings, in this order:\n");
  for section in requested_sections(tier, addons) {
    let _ = writeln!(prompt, "## {}", section.heading());
  }
  prompt
}

/// Produces profile text with the configured model, or the fixed fallback.
pub struct ProfileWriter {
  model: Option<Box<dyn TextModel>>,
}

impl ProfileWriter {
  pub fn new(model: Option<Box<dyn TextModel>>) -> Self {
    Self { model }
  }

  pub fn fallback_only() -> Self {
    Self { model: None }
  }

  #[instrument(name = "profile_text::generate", skip_all, fields(tier = tier.as_str()))]
  pub async fn generate(&self, quiz: &QuizAnswers, tier: Tier, addons: &AddonSet) -> ProfileText {
    let Some(model) = self.model.as_ref() else {
      info!("No text model configured; using fallback profile.");
      return Self::fallback();
    };

    let prompt = build_prompt(quiz, tier, addons);
    match model.complete(SYSTEM_PROMPT, &prompt).await {
      Ok(text) => ProfileText {
        text,
        source: TextSource::Model,
      },
      Err(e) => {
        warn!(error = %format!("{:#}", e), "Text generation failed; using fallback profile.");
        Self::fallback()
      }
    }
  }

  fn fallback() -> ProfileText {
    ProfileText {
      text: FALLBACK_PROFILE.to_string(),
      source: TextSource::Fallback,
    }
  }
}
