//! Review records and the derived rows produced by each pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Result, VerdictError};

/// How a review entered its workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
  Upload,
  Paste,
  Import,
}

/// A review waiting to be stored; the store assigns its id and workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
  pub text: String,
  pub rating: Option<f64>,
  pub date: Option<String>,
  pub source: ReviewSource,
}

impl NewReview {
  pub fn new(text: impl Into<String>, source: ReviewSource) -> Result<Self> {
    let text = text.into();
    if text.trim().is_empty() {
      return Err(VerdictError::invalid_input("review text must not be blank"));
    }
    Ok(Self { text, rating: None, date: None, source })
  }

  pub fn with_rating(mut self, rating: Option<f64>) -> Self {
    self.rating = rating;
    self
  }

  pub fn with_date(mut self, date: Option<String>) -> Self {
    self.date = date;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id: u64,
  pub workspace: String,
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<String>,
  pub source: ReviewSource,
  pub ingested_at: DateTime<Utc>,
}

impl Review {
  pub fn from_new(id: u64, workspace: &str, new: NewReview) -> Self {
    Self {
      id,
      workspace: workspace.to_string(),
      text: new.text,
      rating: new.rating,
      date: new.date,
      source: new.source,
      ingested_at: Utc::now(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
  Negative,
  Neutral,
  Positive,
}

impl fmt::Display for SentimentLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SentimentLabel::Negative => "negative",
      SentimentLabel::Neutral => "neutral",
      SentimentLabel::Positive => "positive",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReview {
  #[serde(flatten)]
  pub review: Review,
  pub sentiment_compound: f64,
  pub sentiment_label: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredReview {
  #[serde(flatten)]
  pub scored: ScoredReview,
  pub cluster_id: usize,
}

impl ClusteredReview {
  pub fn text(&self) -> &str {
    &self.scored.review.text
  }

  pub fn compound(&self) -> f64 {
    self.scored.sentiment_compound
  }

  pub fn label(&self) -> SentimentLabel {
    self.scored.sentiment_label
  }
}

/// Representative terms per cluster, most salient first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterKeywords(BTreeMap<usize, Vec<String>>);

impl ClusterKeywords {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, cluster_id: usize, keywords: Vec<String>) {
    self.0.insert(cluster_id, keywords);
  }

  /// Keywords for a cluster; unknown clusters have none
  pub fn get(&self, cluster_id: usize) -> &[String] {
    self.0.get(&cluster_id).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
    self.0.iter().map(|(id, kws)| (*id, kws.as_slice()))
  }
}

impl FromIterator<(usize, Vec<String>)> for ClusterKeywords {
  fn from_iter<I: IntoIterator<Item = (usize, Vec<String>)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
