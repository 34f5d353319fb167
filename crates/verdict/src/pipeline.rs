//! End-to-end analysis of one workspace: sentiment, clustering, priority.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::cluster::{IssueClusterer, DEFAULT_CLUSTERS};
use crate::priority::{IssueTable, PriorityScorer, RuleBook};
use crate::review::{ClusterKeywords, ClusteredReview, Review, SentimentLabel};
use crate::sentiment::{round_to, Lexicon, SentimentScorer};
use crate::{Result, VerdictError};

/// Evidence rows shown per cluster unless a limit is given
pub const DEFAULT_EVIDENCE_LIMIT: usize = 8;

/// Headline numbers for a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub reviews: usize,
  /// Share of negative reviews, percent, one decimal
  pub negative_pct: f64,
  /// Mean compound score, three decimals
  pub avg_sentiment: f64,
}

/// Everything one analysis pass produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
  pub workspace: String,
  pub summary: Summary,
  pub keywords: ClusterKeywords,
  pub issues: IssueTable,
  pub reviews: Vec<ClusteredReview>,
}

impl Analysis {
  /// Members of a cluster, most negative first; equal scores keep input order
  pub fn evidence(&self, cluster_id: usize, limit: usize) -> Vec<&ClusteredReview> {
    let mut members: Vec<&ClusteredReview> = self.reviews.iter().filter(|r| r.cluster_id == cluster_id).collect();
    members.sort_by(|a, b| a.compound().total_cmp(&b.compound()));
    members.truncate(limit);
    members
  }

  /// Up to `limit` most negative review texts per cluster
  pub fn top_quotes(&self, limit: usize) -> BTreeMap<usize, Vec<&str>> {
    self
      .keywords
      .iter()
      .map(|(cluster_id, _)| {
        let quotes = self.evidence(cluster_id, limit).into_iter().map(ClusteredReview::text).collect();
        (cluster_id, quotes)
      })
      .collect()
  }
}

/// Runs the three analysis stages over one workspace's reviews
#[derive(Debug, Clone)]
pub struct Analyzer<'a> {
  lexicon: &'a Lexicon,
  rules: RuleBook,
  clusterer: IssueClusterer,
  clusters: usize,
}

impl Default for Analyzer<'static> {
  fn default() -> Self {
    Self::new(Lexicon::builtin())
  }
}

impl<'a> Analyzer<'a> {
  pub fn new(lexicon: &'a Lexicon) -> Self {
    Self {
      lexicon,
      rules: RuleBook::default(),
      clusterer: IssueClusterer::default(),
      clusters: DEFAULT_CLUSTERS,
    }
  }

  pub fn with_rules(mut self, rules: RuleBook) -> Self {
    self.rules = rules;
    self
  }

  pub fn with_clusterer(mut self, clusterer: IssueClusterer) -> Self {
    self.clusterer = clusterer;
    self
  }

  /// Requested cluster count; the clusterer may use fewer
  pub fn with_clusters(mut self, clusters: usize) -> Self {
    self.clusters = clusters;
    self
  }

  pub fn analyze(&self, workspace: &str, reviews: &[Review]) -> Result<Analysis> {
    if reviews.is_empty() {
      return Err(VerdictError::invalid_input(format!(
        "workspace '{workspace}' has no reviews to analyze"
      )));
    }
    if let Some(stray) = reviews.iter().find(|r| r.workspace != workspace) {
      return Err(VerdictError::invalid_input(format!(
        "review {} belongs to workspace '{}', not '{}'",
        stray.id, stray.workspace, workspace
      )));
    }

    let scored = SentimentScorer::new(self.lexicon).score_reviews(reviews);
    let (clustered, keywords) = self.clusterer.cluster(&scored, self.clusters)?;
    let issues = PriorityScorer::new(&self.rules).score(&clustered, &keywords);
    let summary = summarize(&clustered);

    info!(
      "Analyzed workspace '{}' - reviews={}, issues={}, negative={:.1}%",
      workspace,
      summary.reviews,
      issues.len(),
      summary.negative_pct
    );

    Ok(Analysis {
      workspace: workspace.to_string(),
      summary,
      keywords,
      issues,
      reviews: clustered,
    })
  }
}

fn summarize(reviews: &[ClusteredReview]) -> Summary {
  let count = reviews.len();
  if count == 0 {
    return Summary { reviews: 0, negative_pct: 0.0, avg_sentiment: 0.0 };
  }

  let negative = reviews.iter().filter(|r| r.label() == SentimentLabel::Negative).count();
  let mean = reviews.iter().map(ClusteredReview::compound).sum::<f64>() / count as f64;

  Summary {
    reviews: count,
    negative_pct: round_to(negative as f64 / count as f64 * 100.0, 1),
    avg_sentiment: round_to(mean, 3),
  }
}
