//! Issue clustering
//!
//! Reviews are vectorised with TF-IDF over unigrams and bigrams, partitioned
//! with seeded k-means and labelled by the terms carrying the highest mean
//! weight inside each cluster. Small batches skip clustering altogether and
//! land in one "mixed" group.

use tracing::{debug, info};

use crate::kmeans::{self, KMeansParams};
use crate::review::{ClusterKeywords, ClusteredReview, ScoredReview};
use crate::tfidf::{TfidfMatrix, TfidfVectorizer};
use crate::Result;

/// Batches smaller than this are not clustered
pub const MIN_REVIEWS_FOR_CLUSTERING: usize = 5;
/// Keywords kept per cluster
pub const MAX_KEYWORDS: usize = 8;
/// Default requested cluster count
pub const DEFAULT_CLUSTERS: usize = 6;

const MIXED_KEYWORD: &str = "mixed";
const EMPTY_KEYWORD: &str = "(empty)";

/// Cluster count actually used for `n` reviews: at least two, and never more
/// than one cluster per three reviews unless that would drop below two
pub fn effective_cluster_count(n: usize, requested: usize) -> usize {
  requested.min((n / 3).max(2)).max(2)
}

#[derive(Debug, Clone, Default)]
pub struct IssueClusterer {
  vectorizer: TfidfVectorizer,
  params: KMeansParams,
}

impl IssueClusterer {
  pub fn new(vectorizer: TfidfVectorizer, params: KMeansParams) -> Self {
    Self { vectorizer, params }
  }

  /// Assign every review to a cluster and describe each cluster by its keywords
  pub fn cluster(
    &self,
    reviews: &[ScoredReview],
    requested: usize,
  ) -> Result<(Vec<ClusteredReview>, ClusterKeywords)> {
    if reviews.len() < MIN_REVIEWS_FOR_CLUSTERING {
      debug!("{} reviews - below clustering threshold, using one mixed group", reviews.len());
      let clustered = reviews.iter().cloned().map(|scored| ClusteredReview { scored, cluster_id: 0 }).collect();
      let keywords = std::iter::once((0, vec![MIXED_KEYWORD.to_string()])).collect();
      return Ok((clustered, keywords));
    }

    let k = effective_cluster_count(reviews.len(), requested);

    // cluster in text order so the partition does not depend on input order
    let mut order: Vec<usize> = (0..reviews.len()).collect();
    order.sort_by(|&a, &b| reviews[a].review.text.cmp(&reviews[b].review.text));

    let texts: Vec<&str> = order.iter().map(|&i| reviews[i].review.text.as_str()).collect();
    let matrix = self.vectorizer.fit_transform(&texts)?;
    let fit = kmeans::fit(&matrix.rows, matrix.n_terms(), k, &self.params)?;
    let renumbered = renumber_by_first_member(&fit.labels, k);

    let keywords = (0..k)
      .map(|cluster| {
        let members: Vec<usize> = (0..fit.labels.len()).filter(|&i| fit.labels[i] == cluster).collect();
        (renumbered[cluster], top_keywords(&matrix, &members))
      })
      .collect::<ClusterKeywords>();

    info!(
      "Clustered {} reviews into {} groups (requested {}, inertia {:.4})",
      reviews.len(),
      k,
      requested,
      fit.inertia
    );

    let mut cluster_ids = vec![0; reviews.len()];
    for (position, &original) in order.iter().enumerate() {
      cluster_ids[original] = renumbered[fit.labels[position]];
    }

    let clustered = reviews
      .iter()
      .cloned()
      .zip(cluster_ids)
      .map(|(scored, cluster_id)| ClusteredReview { scored, cluster_id })
      .collect();

    Ok((clustered, keywords))
  }
}

/// New id for every k-means label: clusters are numbered by their first
/// member, and clusters without members come last
fn renumber_by_first_member(labels: &[usize], k: usize) -> Vec<usize> {
  let mut renumbered = vec![usize::MAX; k];
  let mut next = 0;
  for label in labels.iter().copied().chain(0..k) {
    if renumbered[label] == usize::MAX {
      renumbered[label] = next;
      next += 1;
    }
  }
  renumbered
}

/// Up to [`MAX_KEYWORDS`] terms with the highest mean weight over `members`.
/// Terms no member uses have zero weight and are left out, so a cluster with
/// a small vocabulary gets fewer keywords.
fn top_keywords(matrix: &TfidfMatrix, members: &[usize]) -> Vec<String> {
  if members.is_empty() {
    return vec![EMPTY_KEYWORD.to_string()];
  }

  let means = matrix.mean_weights(members);
  let mut ranked: Vec<(usize, f64)> = means.into_iter().enumerate().filter(|(_, w)| *w > 0.0).collect();
  // vocabulary is alphabetical, so the index breaks ties alphabetically
  ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

  ranked.into_iter().take(MAX_KEYWORDS).map(|(term, _)| matrix.vocabulary[term].clone()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::review::{NewReview, Review, ReviewSource, SentimentLabel};

  fn scored(texts: &[&str]) -> Vec<ScoredReview> {
    texts
      .iter()
      .enumerate()
      .map(|(i, text)| ScoredReview {
        review: Review::from_new(i as u64 + 1, "test", NewReview::new(*text, ReviewSource::Paste).unwrap()),
        sentiment_compound: 0.0,
        sentiment_label: SentimentLabel::Neutral,
      })
      .collect()
  }

  #[test]
  fn test_effective_cluster_count() {
    assert_eq!(effective_cluster_count(6, 6), 2);
    assert_eq!(effective_cluster_count(5, 6), 2);
    assert_eq!(effective_cluster_count(30, 6), 6);
    assert_eq!(effective_cluster_count(30, 1), 2);
    assert_eq!(effective_cluster_count(12, 10), 4);
  }

  #[test]
  fn test_small_batches_form_one_mixed_group() {
    let reviews = scored(&["Slow service", "Rude staff", "Cold fries"]);
    let (clustered, keywords) = IssueClusterer::default().cluster(&reviews, 6).unwrap();

    assert!(clustered.iter().all(|r| r.cluster_id == 0));
    assert_eq!(keywords.get(0), ["mixed".to_string()]);
    assert_eq!(keywords.len(), 1);
  }

  #[test]
  fn test_themes_are_separated() {
    let reviews = scored(&[
      "slow service long wait",
      "long wait slow service",
      "wait was long and service slow",
      "rude cashier attitude",
      "cashier rude attitude",
      "attitude of the cashier was rude",
    ]);
    let (clustered, keywords) = IssueClusterer::default().cluster(&reviews, 6).unwrap();

    assert_eq!(clustered[0].cluster_id, clustered[1].cluster_id);
    assert_eq!(clustered[1].cluster_id, clustered[2].cluster_id);
    assert_eq!(clustered[3].cluster_id, clustered[4].cluster_id);
    assert_eq!(clustered[4].cluster_id, clustered[5].cluster_id);
    assert_ne!(clustered[0].cluster_id, clustered[3].cluster_id);

    let rude_keywords = keywords.get(clustered[3].cluster_id);
    assert!(rude_keywords.len() <= MAX_KEYWORDS);
    assert!(rude_keywords.iter().any(|k| k == "rude"));
    assert!(rude_keywords.iter().all(|k| !k.contains("slow")));
  }

  #[test]
  fn test_assignment_follows_text_not_position() {
    let mut texts = [
      "slow service long wait",
      "rude cashier attitude",
      "long wait slow service",
      "cashier rude attitude",
      "wait was long and service slow",
      "attitude of the cashier was rude",
    ];
    let (forward, forward_keywords) = IssueClusterer::default().cluster(&scored(&texts), 6).unwrap();
    texts.reverse();
    let (backward, backward_keywords) = IssueClusterer::default().cluster(&scored(&texts), 6).unwrap();

    assert_eq!(forward_keywords, backward_keywords);
    for review in &forward {
      let other = backward.iter().find(|r| r.text() == review.text()).unwrap();
      assert_eq!(review.cluster_id, other.cluster_id);
    }
  }

  #[test]
  fn test_renumber_by_first_member() {
    assert_eq!(renumber_by_first_member(&[2, 2, 0, 2], 3), vec![1, 2, 0]);
    assert_eq!(renumber_by_first_member(&[0, 1, 0], 2), vec![0, 1]);
  }

  #[test]
  fn test_cluster_ids_are_dense() {
    let reviews = scored(&[
      "great coffee",
      "great coffee",
      "great coffee",
      "great coffee",
      "great coffee",
      "great coffee",
      "dirty bathroom",
    ]);
    let (clustered, keywords) = IssueClusterer::default().cluster(&reviews, 6).unwrap();

    for cluster in 0..keywords.len() {
      assert!(clustered.iter().any(|r| r.cluster_id == cluster));
    }
  }

  #[test]
  fn test_stop_word_only_corpus_fails() {
    let reviews = scored(&["the a", "and or", "it is", "I was", "to be"]);
    let result = IssueClusterer::default().cluster(&reviews, 6);
    assert!(matches!(result, Err(crate::VerdictError::EmptyVocabulary)));
  }

  #[test]
  fn test_top_keywords_skip_zero_weights_and_handle_empty() {
    let matrix = TfidfVectorizer::default().fit_transform(&["wait", "staff"]).unwrap();
    assert_eq!(top_keywords(&matrix, &[0]), vec!["wait".to_string()]);
    assert_eq!(top_keywords(&matrix, &[]), vec!["(empty)".to_string()]);
  }
}
