//! Priority scoring
//!
//! Folds each cluster's size, average sentiment and an ease-to-fix estimate
//! into one priority score, then maps the cluster's keywords to a recommended
//! action through an ordered rule book.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::review::{ClusterKeywords, ClusteredReview};
use crate::sentiment::round_to;

/// Ease-to-fix for an arbitrary theme
pub const EASE_BASE: f64 = 0.65;
/// Ease-to-fix for themes fixable by changing day-to-day operations
pub const EASE_OPERATIONAL: f64 = 0.75;
/// Keyword fragments marking an operational theme
pub const OPERATIONAL_KEYWORDS: &[&str] = &["clean", "bathroom", "staff", "wait", "line", "schedule"];

/// Action recommended when no rule matches
pub const FALLBACK_ACTION: &str = "Review top quotes and implement a simple SOP change; measure results weekly.";

const GENERAL_LABEL: &str = "General";
const LABEL_KEYWORDS: usize = 3;

/// One ranked issue theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
  pub cluster_id: usize,
  pub issue_label: String,
  pub frequency: usize,
  pub frequency_pct: f64,
  pub avg_sentiment: f64,
  pub severity_score: f64,
  pub ease_score: f64,
  pub priority_score: f64,
  pub recommended_action: String,
}

/// Issue rows ordered by priority, highest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueTable {
  rows: Vec<IssueRow>,
}

impl IssueTable {
  pub fn rows(&self) -> &[IssueRow] {
    &self.rows
  }

  pub fn iter(&self) -> std::slice::Iter<'_, IssueRow> {
    self.rows.iter()
  }

  /// The `n` highest-priority rows
  pub fn top(&self, n: usize) -> &[IssueRow] {
    &self.rows[..n.min(self.rows.len())]
  }

  pub fn get(&self, cluster_id: usize) -> Option<&IssueRow> {
    self.rows.iter().find(|row| row.cluster_id == cluster_id)
  }

  pub fn total_frequency(&self) -> usize {
    self.rows.iter().map(|row| row.frequency).sum()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

impl<'a> IntoIterator for &'a IssueTable {
  type Item = &'a IssueRow;
  type IntoIter = std::slice::Iter<'a, IssueRow>;

  fn into_iter(self) -> Self::IntoIter {
    self.rows.iter()
  }
}

/// Keyword triggers mapped to an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
  pub triggers: Vec<String>,
  pub action: String,
}

impl ActionRule {
  pub fn new(triggers: &[&str], action: impl Into<String>) -> Self {
    Self {
      triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
      action: action.into(),
    }
  }

  /// Whether any trigger occurs inside the lowercased, space-joined keywords
  pub fn matches(&self, joined_keywords: &str) -> bool {
    self.triggers.iter().any(|trigger| joined_keywords.contains(trigger.as_str()))
  }
}

/// Ordered action rules; the first match wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
  rules: Vec<ActionRule>,
  fallback: String,
}

impl Default for RuleBook {
  fn default() -> Self {
    Self::new(
      vec![
        ActionRule::new(
          &["wait", "line", "slow", "minutes"],
          "Reduce wait times: add staff at peak hours, simplify workflow, prep high-demand items.",
        ),
        ActionRule::new(
          &["rude", "attitude", "unfriendly"],
          "Improve service: quick staff coaching, greeting script, and manager follow-up on complaints.",
        ),
        ActionRule::new(
          &["dirty", "clean", "bathroom", "mess"],
          "Improve cleanliness: add cleaning checklist and assign ownership per shift.",
        ),
        ActionRule::new(
          &["price", "expensive", "cost"],
          "Address pricing: highlight value, add bundles, or adjust portion/quality messaging.",
        ),
        ActionRule::new(
          &["cold", "hot", "temperature"],
          "Fix temperature/quality: check holding times, packaging, and handoff process.",
        ),
        ActionRule::new(
          &["schedule", "appointment", "booking"],
          "Fix scheduling: tighten booking rules, add buffer time, and confirm appointments.",
        ),
      ],
      FALLBACK_ACTION,
    )
  }
}

impl RuleBook {
  pub fn new(rules: Vec<ActionRule>, fallback: impl Into<String>) -> Self {
    Self { rules, fallback: fallback.into() }
  }

  pub fn rules(&self) -> &[ActionRule] {
    &self.rules
  }

  pub fn action_for(&self, keywords: &[String]) -> &str {
    let joined = join_lowercase(keywords);
    self
      .rules
      .iter()
      .find(|rule| rule.matches(&joined))
      .map(|rule| rule.action.as_str())
      .unwrap_or(&self.fallback)
  }
}

fn join_lowercase(keywords: &[String]) -> String {
  keywords.join(" ").to_lowercase()
}

/// `(1 - avg) / 2`, floored at zero: -1 maps to 1, +1 maps to 0
pub fn severity(avg_sentiment: f64) -> f64 {
  ((1.0 - avg_sentiment) / 2.0).max(0.0)
}

pub fn ease_to_fix(keywords: &[String]) -> f64 {
  let joined = join_lowercase(keywords);
  if OPERATIONAL_KEYWORDS.iter().any(|k| joined.contains(k)) {
    EASE_OPERATIONAL
  } else {
    EASE_BASE
  }
}

/// First three keywords joined by ", ", or "General"
pub fn issue_label(keywords: &[String]) -> String {
  if keywords.is_empty() {
    return GENERAL_LABEL.to_string();
  }
  keywords.iter().take(LABEL_KEYWORDS).map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub struct PriorityScorer<'a> {
  rules: &'a RuleBook,
}

impl<'a> PriorityScorer<'a> {
  pub fn new(rules: &'a RuleBook) -> Self {
    Self { rules }
  }

  /// One row per non-empty cluster, sorted by priority descending; ties keep
  /// cluster-id order
  pub fn score(&self, reviews: &[ClusteredReview], keywords: &ClusterKeywords) -> IssueTable {
    let total = reviews.len();

    let mut members: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for review in reviews {
      members.entry(review.cluster_id).or_default().push(review.compound());
    }

    let mut rows: Vec<IssueRow> = members
      .into_iter()
      .map(|(cluster_id, compounds)| self.row(cluster_id, &compounds, total, keywords.get(cluster_id)))
      .collect();

    rows.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    debug!("Scored {} issue rows from {} reviews", rows.len(), total);

    IssueTable { rows }
  }

  fn row(&self, cluster_id: usize, compounds: &[f64], total: usize, keywords: &[String]) -> IssueRow {
    let frequency = compounds.len();
    let share = if total == 0 { 0.0 } else { frequency as f64 / total as f64 };
    let avg = compounds.iter().sum::<f64>() / frequency as f64;
    let severity = severity(avg);
    let ease = ease_to_fix(keywords);
    let priority = (share * 100.0) * (severity * 100.0) * (ease * 100.0) / 10_000.0;

    IssueRow {
      cluster_id,
      issue_label: issue_label(keywords),
      frequency,
      frequency_pct: round_to(share * 100.0, 1),
      avg_sentiment: round_to(avg, 3),
      severity_score: round_to(severity, 3),
      ease_score: ease,
      priority_score: round_to(priority, 2),
      recommended_action: self.rules.action_for(keywords).to_string(),
    }
  }
}
