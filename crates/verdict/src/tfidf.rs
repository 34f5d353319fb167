//! Sparse TF-IDF features over unigrams and bigrams
//!
//! Term weights are raw counts scaled by a smoothed inverse document
//! frequency, `ln((1 + n) / (1 + df)) + 1`, with every row scaled to unit
//! length. The vocabulary keeps the terms with the highest corpus-wide count
//! and is indexed alphabetically.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::text;
use crate::{Result, VerdictError};

/// Default vocabulary cap
pub const MAX_FEATURES: usize = 4000;

/// One document as sorted `(term index, weight)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
  pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
  pub fn squared_norm(&self) -> f64 {
    self.entries.iter().map(|(_, w)| w * w).sum()
  }

  pub fn dot_dense(&self, dense: &[f64]) -> f64 {
    self.entries.iter().map(|(i, w)| w * dense[*i]).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct TfidfMatrix {
  pub vocabulary: Vec<String>,
  pub rows: Vec<SparseVector>,
}

impl TfidfMatrix {
  pub fn n_terms(&self) -> usize {
    self.vocabulary.len()
  }

  pub fn n_documents(&self) -> usize {
    self.rows.len()
  }

  /// Mean weight of each term over the given rows
  pub fn mean_weights(&self, members: &[usize]) -> Vec<f64> {
    let mut sums = vec![0.0; self.n_terms()];
    if members.is_empty() {
      return sums;
    }
    for &row in members {
      for &(term, weight) in &self.rows[row].entries {
        sums[term] += weight;
      }
    }
    let size = members.len() as f64;
    sums.iter_mut().for_each(|s| *s /= size);
    sums
  }
}

#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
  max_features: usize,
}

impl Default for TfidfVectorizer {
  fn default() -> Self {
    Self { max_features: MAX_FEATURES }
  }
}

impl TfidfVectorizer {
  pub fn with_max_features(max_features: usize) -> Self {
    Self { max_features }
  }

  pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<TfidfMatrix> {
    let analyzed: Vec<Vec<String>> = documents.iter().map(|d| text::terms(d.as_ref())).collect();

    // BTreeMaps keep term iteration order independent of hashing
    let mut corpus_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    let mut per_document: Vec<BTreeMap<&str, usize>> = Vec::with_capacity(analyzed.len());

    for terms in &analyzed {
      let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
      for term in terms {
        *counts.entry(term.as_str()).or_default() += 1;
      }
      for (&term, &count) in &counts {
        *corpus_counts.entry(term).or_default() += count;
        *document_frequency.entry(term).or_default() += 1;
      }
      per_document.push(counts);
    }

    if corpus_counts.is_empty() {
      return Err(VerdictError::EmptyVocabulary);
    }

    let mut ranked: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(self.max_features);

    let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term.to_string()).collect();
    vocabulary.sort();
    let index: HashMap<&str, usize> = vocabulary.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

    let n = documents.len() as f64;
    let idf: Vec<f64> = vocabulary
      .iter()
      .map(|term| {
        let df = document_frequency.get(term.as_str()).copied().unwrap_or(0) as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
      })
      .collect();

    let rows: Vec<SparseVector> = per_document
      .iter()
      .map(|counts| {
        let mut entries: Vec<(usize, f64)> = counts
          .iter()
          .filter_map(|(term, &count)| index.get(term).map(|&i| (i, count as f64 * idf[i])))
          .collect();
        entries.sort_by_key(|(i, _)| *i);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
          entries.iter_mut().for_each(|(_, w)| *w /= norm);
        }
        SparseVector { entries }
      })
      .collect();

    debug!("TF-IDF built - documents={}, vocabulary={}", rows.len(), vocabulary.len());

    Ok(TfidfMatrix { vocabulary, rows })
  }
}
