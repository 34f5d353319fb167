//! Workspace-scoped review storage
//!
//! Every call names its workspace explicitly. The file store keeps one JSON
//! document per workspace under a root directory; the memory store backs
//! tests and one-shot runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::review::{NewReview, Review};
use crate::{Result, VerdictError};

const MAX_WORKSPACE_LEN: usize = 64;

pub trait ReviewStore {
  /// Store reviews in a workspace, assigning ids in input order
  fn insert(&mut self, workspace: &str, reviews: Vec<NewReview>) -> Result<Vec<Review>>;

  /// Reviews of a workspace, newest first, optionally capped at `limit`
  fn fetch(&self, workspace: &str, limit: Option<usize>) -> Result<Vec<Review>>;

  /// Remove every review of a workspace, returning how many were removed
  fn clear(&mut self, workspace: &str) -> Result<usize>;
}

/// Workspace names become file names, so only `[A-Za-z0-9_-]` is allowed
pub fn validate_workspace(workspace: &str) -> Result<()> {
  if workspace.is_empty() || workspace.len() > MAX_WORKSPACE_LEN {
    return Err(VerdictError::invalid_input(format!(
      "workspace name must be 1-{MAX_WORKSPACE_LEN} characters"
    )));
  }
  if !workspace.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    return Err(VerdictError::invalid_input(format!(
      "workspace name '{workspace}' may only contain letters, digits, '-' and '_'"
    )));
  }
  Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceData {
  next_id: u64,
  reviews: Vec<Review>,
}

impl WorkspaceData {
  fn append(&mut self, workspace: &str, reviews: Vec<NewReview>) -> Vec<Review> {
    let stored: Vec<Review> = reviews
      .into_iter()
      .map(|new| {
        self.next_id += 1;
        Review::from_new(self.next_id, workspace, new)
      })
      .collect();
    self.reviews.extend(stored.iter().cloned());
    stored
  }

  fn newest_first(&self, limit: Option<usize>) -> Vec<Review> {
    let mut reviews = self.reviews.clone();
    reviews.sort_by(|a, b| b.id.cmp(&a.id));
    if let Some(limit) = limit {
      reviews.truncate(limit);
    }
    reviews
  }
}

/// One `<workspace>.json` file per workspace under `root`
#[derive(Debug, Clone)]
pub struct FileStore {
  root: PathBuf,
}

impl FileStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn file_path(&self, workspace: &str) -> Result<PathBuf> {
    validate_workspace(workspace)?;
    Ok(self.root.join(format!("{workspace}.json")))
  }

  fn read(&self, workspace: &str) -> Result<WorkspaceData> {
    let path = self.file_path(workspace)?;
    if !path.exists() {
      return Ok(WorkspaceData::default());
    }

    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| {
      VerdictError::store(format!("workspace file {} is corrupt: {}", path.display(), e))
    })
  }

  fn write(&self, workspace: &str, data: &WorkspaceData) -> Result<()> {
    let path = self.file_path(workspace)?;
    fs::create_dir_all(&self.root)?;

    // staged write, then rename over the target
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_string_pretty(data)?)?;
    fs::rename(&staging, &path)?;
    Ok(())
  }
}

impl ReviewStore for FileStore {
  fn insert(&mut self, workspace: &str, reviews: Vec<NewReview>) -> Result<Vec<Review>> {
    let mut data = self.read(workspace)?;
    let stored = data.append(workspace, reviews);
    self.write(workspace, &data)?;

    debug!("Stored {} reviews in workspace '{}'", stored.len(), workspace);
    Ok(stored)
  }

  fn fetch(&self, workspace: &str, limit: Option<usize>) -> Result<Vec<Review>> {
    Ok(self.read(workspace)?.newest_first(limit))
  }

  fn clear(&mut self, workspace: &str) -> Result<usize> {
    let path = self.file_path(workspace)?;
    if !path.exists() {
      return Ok(0);
    }

    let removed = self.read(workspace)?.reviews.len();
    fs::remove_file(&path)?;

    debug!("Cleared {} reviews from workspace '{}'", removed, workspace);
    Ok(removed)
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  workspaces: HashMap<String, WorkspaceData>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ReviewStore for MemoryStore {
  fn insert(&mut self, workspace: &str, reviews: Vec<NewReview>) -> Result<Vec<Review>> {
    validate_workspace(workspace)?;
    Ok(self.workspaces.entry(workspace.to_string()).or_default().append(workspace, reviews))
  }

  fn fetch(&self, workspace: &str, limit: Option<usize>) -> Result<Vec<Review>> {
    validate_workspace(workspace)?;
    Ok(self.workspaces.get(workspace).map(|data| data.newest_first(limit)).unwrap_or_default())
  }

  fn clear(&mut self, workspace: &str) -> Result<usize> {
    validate_workspace(workspace)?;
    Ok(self.workspaces.remove(workspace).map_or(0, |data| data.reviews.len()))
  }
}
