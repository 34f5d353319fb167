//! Rule-based sentiment scoring
//!
//! Each token found in the lexicon contributes its valence, adjusted by the
//! up to three tokens before it (boosters, negations, a few idioms), by
//! ALL-CAPS emphasis and by a contrastive "but". The summed valence is
//! amplified by trailing punctuation and squashed into [-1, 1].

mod lexicon;

pub use lexicon::{Lexicon, BOOST_DECREMENT, BOOST_INCREMENT};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::review::{Review, ScoredReview, SentimentLabel};
use crate::{Result, VerdictError};

/// Scores at or below this are negative
pub const NEGATIVE_THRESHOLD: f64 = -0.05;
/// Scores at or above this are positive
pub const POSITIVE_THRESHOLD: f64 = 0.05;

const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_BOOST: f64 = 0.18;
const QUESTION_CAP: f64 = 0.96;

/// Multi-word phrases whose valence replaces that of the word they end on
const IDIOMS: &[(&str, f64)] = &[
  ("the shit", 3.0),
  ("the bomb", 3.0),
  ("bad ass", 1.5),
  ("badass", 1.5),
  ("bus stop", 0.0),
  ("yeah right", -2.0),
  ("kiss of death", -1.5),
  ("to die for", 3.0),
  ("beating heart", 3.1),
  ("broken heart", -2.9),
];

fn idiom_valence(phrase: &str) -> Option<f64> {
  IDIOMS.iter().find(|(idiom, _)| *idiom == phrase).map(|&(_, valence)| valence)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
  pub compound: f64,
  pub label: SentimentLabel,
}

/// Map a compound score to its label
pub fn label_for(compound: f64) -> SentimentLabel {
  if compound <= NEGATIVE_THRESHOLD {
    SentimentLabel::Negative
  } else if compound >= POSITIVE_THRESHOLD {
    SentimentLabel::Positive
  } else {
    SentimentLabel::Neutral
  }
}

/// Scores review texts against a lexicon
#[derive(Debug, Clone, Copy)]
pub struct SentimentScorer<'a> {
  lexicon: &'a Lexicon,
}

impl Default for SentimentScorer<'static> {
  fn default() -> Self {
    Self::new(Lexicon::builtin())
  }
}

impl<'a> SentimentScorer<'a> {
  pub fn new(lexicon: &'a Lexicon) -> Self {
    Self { lexicon }
  }

  pub fn score(&self, text: &str) -> SentimentScore {
    let compound = self.compound(text);
    SentimentScore { compound, label: label_for(compound) }
  }

  /// Score raw bytes, which must be valid UTF-8
  pub fn score_bytes(&self, bytes: &[u8]) -> Result<SentimentScore> {
    let text = std::str::from_utf8(bytes)
      .map_err(|e| VerdictError::invalid_input(format!("review text is not valid UTF-8: {e}")))?;
    Ok(self.score(text))
  }

  /// Attach sentiment to every review, preserving order
  pub fn score_reviews(&self, reviews: &[Review]) -> Vec<ScoredReview> {
    let scored: Vec<ScoredReview> = reviews
      .iter()
      .map(|review| {
        let score = self.score(&review.text);
        ScoredReview {
          review: review.clone(),
          sentiment_compound: score.compound,
          sentiment_label: score.label,
        }
      })
      .collect();

    debug!("Scored sentiment - reviews={}", scored.len());
    scored
  }

  /// Compound polarity in [-1, 1], rounded to 4 decimals
  pub fn compound(&self, text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
      return 0.0;
    }

    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let caps_differential = caps_differential(&tokens);

    let mut valences = Vec::with_capacity(tokens.len());
    for i in 0..tokens.len() {
      if self.lexicon.booster(&lowered[i]).is_some() {
        valences.push(0.0);
        continue;
      }
      if lowered[i] == "kind" && lowered.get(i + 1).map(String::as_str) == Some("of") {
        valences.push(0.0);
        continue;
      }
      valences.push(self.token_valence(&tokens, &lowered, i, caps_differential));
    }

    apply_but_shift(&lowered, &mut valences);

    let mut sum: f64 = valences.iter().sum();
    let emphasis = punctuation_emphasis(text);
    if sum > 0.0 {
      sum += emphasis;
    } else if sum < 0.0 {
      sum -= emphasis;
    }

    round_to(normalize(sum), 4)
  }

  fn token_valence(&self, tokens: &[&str], lowered: &[String], i: usize, caps_differential: bool) -> f64 {
    let word = lowered[i].as_str();
    let Some(base) = self.lexicon.valence(word) else {
      return 0.0;
    };
    let mut valence = base;

    // "no" directly before another sentiment word acts as a negation, not a sentiment
    if word == "no" && lowered.get(i + 1).is_some_and(|next| self.lexicon.contains(next)) {
      valence = 0.0;
    }

    let preceded_by_no = (i > 0 && lowered[i - 1] == "no")
      || (i > 1 && lowered[i - 2] == "no")
      || (i > 2 && lowered[i - 3] == "no" && matches!(lowered[i - 1].as_str(), "or" | "nor"));
    if preceded_by_no {
      valence = base * NEGATION_SCALAR;
    }

    if is_upper(tokens[i]) && caps_differential {
      valence += if valence > 0.0 { CAPS_INCREMENT } else { -CAPS_INCREMENT };
    }

    for distance in 0..3 {
      if i <= distance {
        break;
      }
      let previous = i - (distance + 1);
      if self.lexicon.contains(&lowered[previous]) {
        continue;
      }

      let mut scalar = self.booster_scalar(tokens[previous], &lowered[previous], valence, caps_differential);
      if distance == 1 {
        scalar *= 0.95;
      } else if distance == 2 {
        scalar *= 0.9;
      }
      valence += scalar;
      valence = self.negation_check(valence, lowered, distance, i);
      if distance == 2 {
        valence = self.idiom_check(valence, lowered, i);
      }
    }

    self.least_check(valence, lowered, i)
  }

  fn booster_scalar(&self, token: &str, lowered: &str, valence: f64, caps_differential: bool) -> f64 {
    let Some(mut scalar) = self.lexicon.booster(lowered) else {
      return 0.0;
    };
    if valence < 0.0 {
      scalar = -scalar;
    }
    if is_upper(token) && caps_differential {
      scalar += if valence > 0.0 { CAPS_INCREMENT } else { -CAPS_INCREMENT };
    }
    scalar
  }

  fn negation_check(&self, valence: f64, lowered: &[String], distance: usize, i: usize) -> f64 {
    let word_at = |back: usize| lowered[i - back].as_str();
    match distance {
      0 => {
        if self.lexicon.is_negation(word_at(1)) {
          return valence * NEGATION_SCALAR;
        }
      }
      1 => {
        if word_at(2) == "never" && matches!(word_at(1), "so" | "this") {
          return valence * 1.25;
        }
        if word_at(2) == "without" && word_at(1) == "doubt" {
          return valence;
        }
        if self.lexicon.is_negation(word_at(2)) {
          return valence * NEGATION_SCALAR;
        }
      }
      _ => {
        if (word_at(3) == "never" && matches!(word_at(2), "so" | "this"))
          || matches!(word_at(1), "so" | "this")
        {
          return valence * 1.25;
        }
        if word_at(3) == "without" && (word_at(2) == "doubt" || word_at(1) == "doubt") {
          return valence;
        }
        if self.lexicon.is_negation(word_at(3)) {
          return valence * NEGATION_SCALAR;
        }
      }
    }
    valence
  }

  /// Idioms ending on or starting at token `i`, then "kind of" style
  /// dampeners in the three tokens before it. Needs `i >= 3`.
  fn idiom_check(&self, valence: f64, lowered: &[String], i: usize) -> f64 {
    let w = |j: usize| lowered[j].as_str();
    let two_one = format!("{} {}", w(i - 2), w(i - 1));
    let three_two_one = format!("{} {} {}", w(i - 3), w(i - 2), w(i - 1));
    let three_two = format!("{} {}", w(i - 3), w(i - 2));
    let behind = [
      format!("{} {}", w(i - 1), w(i)),
      format!("{} {} {}", w(i - 2), w(i - 1), w(i)),
      two_one.clone(),
      three_two_one.clone(),
      three_two.clone(),
    ];

    let mut valence = behind.iter().find_map(|phrase| idiom_valence(phrase)).unwrap_or(valence);
    if i + 1 < lowered.len() {
      if let Some(idiom) = idiom_valence(&format!("{} {}", w(i), w(i + 1))) {
        valence = idiom;
      }
    }
    if i + 2 < lowered.len() {
      if let Some(idiom) = idiom_valence(&format!("{} {} {}", w(i), w(i + 1), w(i + 2))) {
        valence = idiom;
      }
    }

    for phrase in [three_two_one, three_two, two_one] {
      if let Some(scalar) = self.lexicon.booster(&phrase) {
        valence += scalar;
      }
    }
    valence
  }

  fn least_check(&self, valence: f64, lowered: &[String], i: usize) -> f64 {
    if i > 1 && lowered[i - 1] == "least" && !self.lexicon.contains(&lowered[i - 1]) {
      if lowered[i - 2] != "at" && lowered[i - 2] != "very" {
        return valence * NEGATION_SCALAR;
      }
    } else if i > 0 && lowered[i - 1] == "least" && !self.lexicon.contains(&lowered[i - 1]) {
      return valence * NEGATION_SCALAR;
    }
    valence
  }
}

/// Split on whitespace and strip surrounding punctuation from word tokens;
/// short tokens such as emoticons keep their punctuation.
fn tokenize(text: &str) -> Vec<&str> {
  text
    .split_whitespace()
    .map(|token| {
      let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
      if stripped.chars().count() <= 2 {
        token
      } else {
        stripped
      }
    })
    .collect()
}

/// True when the token has cased letters and all of them are uppercase
fn is_upper(token: &str) -> bool {
  let mut cased = false;
  for c in token.chars() {
    if c.is_lowercase() {
      return false;
    }
    if c.is_uppercase() {
      cased = true;
    }
  }
  cased
}

/// Emphasis counts only when some, but not all, tokens are shouted
fn caps_differential(tokens: &[&str]) -> bool {
  let shouted = tokens.iter().filter(|t| is_upper(t)).count();
  shouted > 0 && shouted < tokens.len()
}

fn apply_but_shift(lowered: &[String], valences: &mut [f64]) {
  let Some(pivot) = lowered.iter().position(|w| w == "but") else {
    return;
  };
  for (index, valence) in valences.iter_mut().enumerate() {
    if index < pivot {
      *valence *= 0.5;
    } else if index > pivot {
      *valence *= 1.5;
    }
  }
}

fn punctuation_emphasis(text: &str) -> f64 {
  let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
  let questions = text.matches('?').count();

  let question_emphasis = match questions {
    0 | 1 => 0.0,
    2..=3 => questions as f64 * QUESTION_BOOST,
    _ => QUESTION_CAP,
  };

  exclamations as f64 * EXCLAMATION_BOOST + question_emphasis
}

fn normalize(score: f64) -> f64 {
  let normalized = score / (score * score + NORMALIZATION_ALPHA).sqrt();
  normalized.clamp(-1.0, 1.0)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}
