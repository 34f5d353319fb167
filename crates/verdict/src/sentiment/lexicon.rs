//! Valence lexicon plus the booster and negation vocabularies used by the
//! rule-based scorer.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::{Result, VerdictError};

/// Increment applied by intensifiers ("very", "extremely", ...)
pub const BOOST_INCREMENT: f64 = 0.293;
/// Decrement applied by dampeners ("barely", "somewhat", ...)
pub const BOOST_DECREMENT: f64 = -0.293;

const BUILTIN_LEXICON: &str = include_str!("../../data/lexicon.tsv");

const INTENSIFIERS: &[&str] = &[
  "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
  "decidedly", "deeply", "effing", "enormous", "enormously", "entirely", "especially",
  "exceptional", "exceptionally", "extreme", "extremely", "fabulously", "flipping", "flippin",
  "fricking", "frickin", "frigging", "friggin", "fully", "greatly", "hella", "highly", "hugely",
  "incredibly", "intensely", "major", "majorly", "more", "most", "particularly", "purely",
  "quite", "really", "remarkably", "so", "substantially", "thoroughly", "total", "totally",
  "tremendous", "tremendously", "uber", "unbelievably", "unusually", "utter", "utterly", "very",
];

const DAMPENERS: &[&str] = &[
  "almost", "barely", "hardly", "kinda", "kind of", "kindof", "kind-of", "less", "little",
  "marginal", "marginally", "occasional", "occasionally", "partly", "scarce", "scarcely",
  "slight", "slightly", "somewhat", "sorta", "sort of", "sortof", "sort-of",
];

const NEGATIONS: &[&str] = &[
  "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
  "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
  "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
  "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
  "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
  "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
  "rarely", "seldom", "despite",
];

static BUILTIN: Lazy<Lexicon> =
  Lazy::new(|| Lexicon::from_tsv(BUILTIN_LEXICON).expect("embedded lexicon is well-formed"));

/// Immutable word tables consulted by the sentiment scorer
#[derive(Debug, Clone)]
pub struct Lexicon {
  valences: HashMap<String, f64>,
  boosters: HashMap<String, f64>,
  negations: HashSet<String>,
}

impl Lexicon {
  /// Shared lexicon compiled into the binary, parsed on first use
  pub fn builtin() -> &'static Lexicon {
    &BUILTIN
  }

  /// Parse `word<TAB>valence` lines; blank lines and `#` comments are skipped.
  /// Boosters and negations use the built-in vocabularies.
  pub fn from_tsv(data: &str) -> Result<Self> {
    let mut valences = HashMap::new();

    for (index, raw) in data.lines().enumerate() {
      let line = raw.trim();
      if line.is_empty() || line.starts_with("# ") || line == "#" {
        continue;
      }

      let mut fields = line.split('\t');
      let word = fields.next().unwrap_or_default().trim();
      let value = fields
        .next()
        .ok_or_else(|| VerdictError::lexicon(index + 1, "expected word and valence separated by a tab"))?
        .trim();

      if word.is_empty() {
        return Err(VerdictError::lexicon(index + 1, "empty word"));
      }

      let valence: f64 = value
        .parse()
        .map_err(|_| VerdictError::lexicon(index + 1, format!("'{value}' is not a number")))?;

      valences.insert(word.to_lowercase(), valence);
    }

    Ok(Self::with_valences(valences))
  }

  /// Read a lexicon file in the same format. Columns after the valence are
  /// ignored, so VADER's `vader_lexicon.txt` loads unchanged.
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
    let data = std::fs::read_to_string(path.as_ref())?;
    let lexicon = Self::from_tsv(&data)?;
    debug!("Loaded lexicon {} - entries={}", path.as_ref().display(), lexicon.len());
    Ok(lexicon)
  }

  /// Build a lexicon around explicit valences with the default boosters/negations
  pub fn with_valences(valences: HashMap<String, f64>) -> Self {
    let mut boosters: HashMap<String, f64> =
      INTENSIFIERS.iter().map(|w| (w.to_string(), BOOST_INCREMENT)).collect();
    boosters.extend(DAMPENERS.iter().map(|w| (w.to_string(), BOOST_DECREMENT)));

    Self {
      valences,
      boosters,
      negations: NEGATIONS.iter().map(|w| w.to_string()).collect(),
    }
  }

  /// Valence of a lowercase word
  pub fn valence(&self, word: &str) -> Option<f64> {
    self.valences.get(word).copied()
  }

  pub fn contains(&self, word: &str) -> bool {
    self.valences.contains_key(word)
  }

  /// Booster scalar of a lowercase word
  pub fn booster(&self, word: &str) -> Option<f64> {
    self.boosters.get(word).copied()
  }

  /// Whether a lowercase word negates what follows (including "n't" forms)
  pub fn is_negation(&self, word: &str) -> bool {
    self.negations.contains(word) || word.contains("n't")
  }

  pub fn len(&self) -> usize {
    self.valences.len()
  }

  pub fn is_empty(&self) -> bool {
    self.valences.is_empty()
  }
}
