//! Seeded k-means over sparse rows
//!
//! k-means++ seeding, Lloyd iterations and several restarts drawn from one
//! fixed-seed generator; the restart with the lowest inertia wins. A cluster
//! left empty by an assignment step takes the point farthest from its own
//! centroid out of a cluster that has more than one member.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::tfidf::SparseVector;
use crate::{Result, VerdictError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
  pub restarts: usize,
  pub max_iterations: usize,
  pub tolerance: f64,
  pub seed: u64,
}

impl Default for KMeansParams {
  fn default() -> Self {
    Self { restarts: 10, max_iterations: 300, tolerance: 1e-8, seed: 42 }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
  pub labels: Vec<usize>,
  pub inertia: f64,
  pub iterations: usize,
}

pub fn fit(rows: &[SparseVector], dimensions: usize, k: usize, params: &KMeansParams) -> Result<KMeansFit> {
  if k == 0 || rows.len() < k {
    return Err(VerdictError::clustering_failed(format!(
      "cannot split {} rows into {} clusters",
      rows.len(),
      k
    )));
  }

  if rows.iter().flat_map(|r| &r.entries).any(|(_, w)| !w.is_finite()) {
    return Err(VerdictError::clustering_failed("feature matrix contains non-finite weights"));
  }

  let norms: Vec<f64> = rows.iter().map(SparseVector::squared_norm).collect();
  let mut rng = StdRng::seed_from_u64(params.seed);
  let mut best: Option<KMeansFit> = None;

  for restart in 0..params.restarts.max(1) {
    let seeds = seed_centroids(rows, &norms, dimensions, k, &mut rng);
    let run = lloyd(rows, &norms, seeds, params)?;
    debug!("k-means restart {} - inertia={:.6}, iterations={}", restart, run.inertia, run.iterations);

    if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
      best = Some(run);
    }
  }

  best.ok_or_else(|| VerdictError::clustering_failed("no restart produced a partition"))
}

fn squared_distance(row: &SparseVector, row_norm: f64, centroid: &[f64], centroid_norm: f64) -> f64 {
  (row_norm - 2.0 * row.dot_dense(centroid) + centroid_norm).max(0.0)
}

fn densify(row: &SparseVector, dimensions: usize) -> Vec<f64> {
  let mut dense = vec![0.0; dimensions];
  for &(i, w) in &row.entries {
    dense[i] = w;
  }
  dense
}

/// k-means++: first centre uniform, later centres drawn proportionally to
/// squared distance from the nearest chosen centre
fn seed_centroids(
  rows: &[SparseVector],
  norms: &[f64],
  dimensions: usize,
  k: usize,
  rng: &mut StdRng,
) -> Vec<Vec<f64>> {
  let first = rng.random_range(0..rows.len());
  let mut centroids = vec![densify(&rows[first], dimensions)];
  let mut nearest: Vec<f64> = rows
    .iter()
    .zip(norms)
    .map(|(row, &norm)| squared_distance(row, norm, &centroids[0], norms[first]))
    .collect();

  while centroids.len() < k {
    let total: f64 = nearest.iter().sum();
    let chosen = if total > 0.0 {
      let target = rng.random::<f64>() * total;
      let mut cumulative = 0.0;
      let mut pick = rows.len() - 1;
      for (i, d) in nearest.iter().enumerate() {
        cumulative += d;
        if cumulative >= target && *d > 0.0 {
          pick = i;
          break;
        }
      }
      pick
    } else {
      rng.random_range(0..rows.len())
    };

    let centroid = densify(&rows[chosen], dimensions);
    for (i, row) in rows.iter().enumerate() {
      let d = squared_distance(row, norms[i], &centroid, norms[chosen]);
      if d < nearest[i] {
        nearest[i] = d;
      }
    }
    centroids.push(centroid);
  }

  centroids
}

fn centroid_norms(centroids: &[Vec<f64>]) -> Vec<f64> {
  centroids.iter().map(|c| c.iter().map(|v| v * v).sum()).collect()
}

/// Nearest centroid per row; ties go to the lower cluster id
fn assign(rows: &[SparseVector], norms: &[f64], centroids: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
  let c_norms = centroid_norms(centroids);
  let mut labels = Vec::with_capacity(rows.len());
  let mut distances = Vec::with_capacity(rows.len());

  for (row, &norm) in rows.iter().zip(norms) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
      let d = squared_distance(row, norm, centroid, c_norms[c]);
      if d < best.1 {
        best = (c, d);
      }
    }
    labels.push(best.0);
    distances.push(best.1);
  }

  (labels, distances)
}

fn relocate_empty(labels: &mut [usize], distances: &mut [f64], k: usize) {
  let mut sizes = vec![0usize; k];
  for &label in labels.iter() {
    sizes[label] += 1;
  }

  for cluster in 0..k {
    if sizes[cluster] > 0 {
      continue;
    }
    let donor = (0..labels.len())
      .filter(|&i| sizes[labels[i]] > 1)
      .max_by(|&a, &b| distances[a].total_cmp(&distances[b]).then_with(|| b.cmp(&a)));

    if let Some(point) = donor {
      sizes[labels[point]] -= 1;
      labels[point] = cluster;
      distances[point] = 0.0;
      sizes[cluster] = 1;
    }
  }
}

fn update(rows: &[SparseVector], labels: &[usize], k: usize, dimensions: usize) -> Vec<Vec<f64>> {
  let mut sums = vec![vec![0.0; dimensions]; k];
  let mut sizes = vec![0usize; k];

  for (row, &label) in rows.iter().zip(labels) {
    sizes[label] += 1;
    for &(i, w) in &row.entries {
      sums[label][i] += w;
    }
  }

  for (sum, &size) in sums.iter_mut().zip(&sizes) {
    if size > 0 {
      sum.iter_mut().for_each(|v| *v /= size as f64);
    }
  }
  sums
}

fn lloyd(
  rows: &[SparseVector],
  norms: &[f64],
  seeds: Vec<Vec<f64>>,
  params: &KMeansParams,
) -> Result<KMeansFit> {
  let k = seeds.len();
  let dimensions = seeds.first().map_or(0, Vec::len);
  let mut centroids = seeds;

  let (mut labels, mut distances) = assign(rows, norms, &centroids);
  relocate_empty(&mut labels, &mut distances, k);

  let mut iterations = 0;
  while iterations < params.max_iterations {
    iterations += 1;

    let updated = update(rows, &labels, k, dimensions);
    let shift: f64 = updated
      .iter()
      .zip(&centroids)
      .map(|(new, old)| new.iter().zip(old).map(|(a, b)| (a - b) * (a - b)).sum::<f64>())
      .sum();
    centroids = updated;

    let (mut next, mut next_distances) = assign(rows, norms, &centroids);
    relocate_empty(&mut next, &mut next_distances, k);

    let unchanged = next == labels;
    labels = next;
    distances = next_distances;
    if unchanged || shift <= params.tolerance {
      break;
    }
  }

  let centroids = update(rows, &labels, k, dimensions);
  let c_norms = centroid_norms(&centroids);
  let inertia: f64 = rows
    .iter()
    .zip(norms)
    .zip(&labels)
    .map(|((row, &norm), &label)| squared_distance(row, norm, &centroids[label], c_norms[label]))
    .sum();

  if !inertia.is_finite() || distances.iter().any(|d| !d.is_finite()) {
    return Err(VerdictError::clustering_failed("non-finite distance while partitioning"));
  }

  Ok(KMeansFit { labels, inertia, iterations })
}
