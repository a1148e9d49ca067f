// app/src/services/portrait/prompt.rs

//! Quiz answers → image prompt. Everything here is plain string mapping.

use crate::models::{Addon, AddonSet, QuizAnswers};

pub const NEGATIVE_EXCLUSIONS: &str = "Exclusions: no text, no letters, no watermark, no logo, no frame, \
no nudity, no extra limbs, no distorted or duplicated faces, only one person in the image.";

pub fn style_description(style: &str) -> &'static str {
  match style {
    "ethereal" => "ethereal dreamlike portrait, soft pastel light, gentle bloom, delicate glow",
    "anime" => "anime-style portrait illustration, clean line art, expressive eyes, cel shading",
    "mystical" => "mystical portrait, deep jewel tones, candlelight, subtle celestial symbols in the background",
    "watercolor" => "watercolor portrait painting, loose brush strokes, soft bleeding edges, textured paper",
    "sketch" | "pencil" => "detailed graphite pencil sketch portrait, fine cross-hatching, paper texture",
    _ => "photorealistic portrait photograph, soft natural window light, shallow depth of field",
  }
}

pub fn gender_description(partner_gender: &str) -> &'static str {
  match partner_gender {
    "male" | "man" | "men" => "a man",
    "female" | "woman" | "women" => "a woman",
    "nonbinary" | "non-binary" | "androgynous" => "an androgynous person",
    _ => "a person",
  }
}

/// `"25-35"` → `"around 30 years old"`; anything unparseable → `"an adult"`.
const MIN_AGE: u64 = 18;
const MAX_AGE: u64 = 120;

/// Bounds are clamped to adult ages before the midpoint is taken.
pub fn age_description(age_range: &str) -> String {
  let bounds: Vec<u64> = age_range
    .split(|c: char| c == '-' || c == '–' || c == ' ')
    .filter_map(|part| part.trim().trim_end_matches('+').parse::<u64>().ok())
    .map(|age| age.clamp(MIN_AGE, MAX_AGE))
    .collect();
  match bounds.as_slice() {
    [low, high, ..] if low <= high => format!("around {} years old", (low + high) / 2),
    [single] => format!("around {} years old", single),
    _ => "an adult".to_string(),
  }
}

pub fn appearance_description(quiz: &QuizAnswers) -> Vec<String> {
  let a = &quiz.appearance;
  let mut parts = Vec::new();
  let known = |v: &Option<String>| v.as_deref().filter(|v| *v != "any").map(str::to_string);

  if let Some(hair) = known(&a.hair_color) {
    parts.push(format!("{} hair", hair));
  }
  if let Some(eyes) = known(&a.eye_color) {
    parts.push(format!("{} eyes", eyes));
  }
  if let Some(build) = known(&a.build) {
    parts.push(format!("{} build", build));
  }
  if let Some(style) = known(&a.style) {
    parts.push(format!("{} clothing style", style));
  }
  parts
}

/// Each slider contributes a phrase at either extreme; the middle band contributes nothing.
pub fn personality_description(sliders: [u8; 4]) -> Vec<&'static str> {
  const LOW: u8 = 35;
  const HIGH: u8 = 65;
  let table: [(&str, &str); 4] = [
    ("a quiet, thoughtful gaze", "a bright, open smile"),
    ("a calm, composed expression", "soft, empathetic eyes"),
    ("a playful, spontaneous energy", "a neat, put-together look"),
    ("an adventurous, sun-kissed glow", "a cosy, relaxed warmth"),
  ];

  sliders
    .into_iter()
    .zip(table)
    .filter_map(|(value, (low, high))| {
      if value <= LOW {
        Some(low)
      } else if value >= HIGH {
        Some(high)
      } else {
        None
      }
    })
    .collect()
}

pub fn zodiac_description(sign: &str) -> Option<&'static str> {
  let hint = match sign {
    "aries" | "leo" | "sagittarius" => "warm golden firelight accents",
    "taurus" | "virgo" | "capricorn" => "earthy tones and natural textures",
    "gemini" | "libra" | "aquarius" => "airy, luminous sky tones",
    "cancer" | "scorpio" | "pisces" => "deep, reflective water-blue tones",
    _ => return None,
  };
  Some(hint)
}

pub fn addon_effect(addon: Addon) -> &'static str {
  match addon {
    Addon::Aura => "a soft, glowing aura surrounding the figure",
    Addon::TwinFlame => "a subtle mirrored flame motif in the background",
    Addon::PastLife => "faint vintage sepia undertones suggesting another era",
  }
}

pub fn build_image_prompt(style: &str, quiz: &QuizAnswers, addons: &AddonSet) -> String {
  let mut subject = format!(
    "{}, {}",
    gender_description(quiz.partner_gender()),
    age_description(quiz.age_range())
  );
  for detail in appearance_description(quiz) {
    subject.push_str(", ");
    subject.push_str(&detail);
  }
  if let Some(culture) = quiz.preferences.cultural_background.as_deref() {
    subject.push_str(&format!(", of {} heritage", culture));
  }

  let mut prompt = format!("{}. Portrait of {}", style_description(style), subject);
  let traits = personality_description(quiz.sliders());
  if !traits.is_empty() {
    prompt.push_str(", with ");
    prompt.push_str(&traits.join(", "));
  }
  prompt.push('.');

  prompt.push_str(&format!(" Overall mood: {}.", quiz.mood()));
  if let Some(hint) = quiz.zodiac().and_then(zodiac_description) {
    prompt.push_str(&format!(" Color palette: {}.", hint));
  }
  for addon in addons.iter() {
    prompt.push_str(&format!(" Include {}.", addon_effect(addon)));
  }
  prompt.push(' ');
  prompt.push_str(NEGATIVE_EXCLUSIONS);
  prompt
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn age_ranges_map_to_midpoints() {
    assert_eq!(age_description("25-35"), "around 30 years old");
    assert_eq!(age_description("40+"), "around 40 years old");
    assert_eq!(age_description("ageless"), "an adult");
  }

  #[test]
  fn age_bounds_are_clamped() {
    assert_eq!(age_description("4000000000-4000000000"), "around 120 years old");
    assert_eq!(age_description("99999999999999999999-5"), "around 18 years old");
    assert_eq!(age_description("5-10"), "around 18 years old");
    assert_eq!(age_description("30-4294967295"), "around 75 years old");
  }

  #[test]
  fn middle_sliders_add_nothing() {
    assert!(personality_description([50, 50, 50, 50]).is_empty());
    assert_eq!(
      personality_description([90, 10, 50, 50]),
      vec!["a bright, open smile", "a calm, composed expression"]
    );
  }

  #[test]
  fn prompt_combines_tables_and_exclusions() {
    let quiz = QuizAnswers::from_json_str(
      r#"{"appearance":{"partner_gender":"female","hair_color":"auburn"},"birth":{"date":"1990-04-01"}}"#,
    )
    .unwrap()
    .normalized();
    let prompt = build_image_prompt("watercolor", &quiz, &AddonSet::from_names(["aura"]));

    assert!(prompt.starts_with("watercolor portrait painting"));
    assert!(prompt.contains("a woman, around 30 years old, auburn hair"));
    assert!(prompt.contains("firelight"));
    assert!(prompt.contains("glowing aura"));
    assert!(prompt.ends_with(NEGATIVE_EXCLUSIONS));
  }
}
