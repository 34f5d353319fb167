//! Configuration management for Verdict
//!
//! Settings come from a JSON file in the working directory (or an explicit
//! path). Missing fields fall back to defaults.

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cluster::DEFAULT_CLUSTERS;
use crate::sentiment::Lexicon;
use crate::{Result, VerdictError};

/// Environment variable overriding where workspaces are stored
pub const STORE_ROOT_ENV: &str = "VERDICT_STORE_ROOT";

const CONFIG_PATHS: [&str; 3] = [".verdict.json", "verdict.json", ".verdict/config.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Requested number of issue clusters
  #[serde(default = "default_clusters")]
  pub clusters: usize,
  /// Directory holding one JSON file per workspace
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub store_root: Option<PathBuf>,
  /// Name printed in report headers
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub business_name: Option<String>,
  /// Valence table used instead of the built-in lexicon
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lexicon: Option<PathBuf>,
}

fn default_clusters() -> usize {
  DEFAULT_CLUSTERS
}

impl Default for Config {
  fn default() -> Self {
    Self { clusters: default_clusters(), store_root: None, business_name: None, lexicon: None }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
  }

  /// Load the first config file found in `dir`, or defaults
  pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
    for path in CONFIG_PATHS {
      let candidate = dir.as_ref().join(path);
      if candidate.exists() {
        return Self::load_from_file(candidate);
      }
    }

    Ok(Config::default())
  }

  /// Load configuration from the current directory or defaults
  pub fn load() -> Result<Self> {
    Self::load_from_dir(".")
  }

  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;
    Ok(())
  }

  fn validate(&self) -> Result<()> {
    if self.clusters == 0 {
      return Err(VerdictError::invalid_input("clusters must be at least 1"));
    }
    Ok(())
  }

  /// Store root: `VERDICT_STORE_ROOT`, then `store_root`, then `~/.verdict/workspaces`
  pub fn resolve_store_root(&self) -> Result<PathBuf> {
    if let Ok(custom_root) = std::env::var(STORE_ROOT_ENV) {
      if !custom_root.trim().is_empty() {
        return Ok(PathBuf::from(custom_root));
      }
    }

    if let Some(root) = &self.store_root {
      return Ok(root.clone());
    }

    let home = home_dir().ok_or_else(|| VerdictError::store("could not find home directory"))?;
    Ok(home.join(".verdict").join("workspaces"))
  }

  /// The configured lexicon, or `None` to use the built-in one
  pub fn load_lexicon(&self) -> Result<Option<Lexicon>> {
    self.lexicon.as_ref().map(Lexicon::from_path).transpose()
  }

  pub fn business_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
    self.business_name.as_deref().unwrap_or(fallback)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.clusters, 6);
    assert!(config.store_root.is_none());
    assert_eq!(config.business_name_or("cafe"), "cafe");
  }

  #[test]
  fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("verdict.json");
    fs::write(&path, r#"{"business_name": "Corner Cafe"}"#).unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.clusters, 6);
    assert_eq!(config.business_name_or("cafe"), "Corner Cafe");
  }

  #[test]
  fn test_load_from_dir_prefers_dotfile() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".verdict.json"), r#"{"clusters": 3}"#).unwrap();
    fs::write(temp_dir.path().join("verdict.json"), r#"{"clusters": 9}"#).unwrap();

    assert_eq!(Config::load_from_dir(temp_dir.path()).unwrap().clusters, 3);
  }

  #[test]
  fn test_load_from_empty_dir_is_default() {
    let temp_dir = TempDir::new().unwrap();
    assert_eq!(Config::load_from_dir(temp_dir.path()).unwrap(), Config::default());
  }

  #[test]
  fn test_zero_clusters_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("verdict.json");
    fs::write(&path, r#"{"clusters": 0}"#).unwrap();

    assert!(matches!(Config::load_from_file(&path), Err(VerdictError::InvalidInput { .. })));
  }

  #[test]
  fn test_malformed_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("verdict.json");
    fs::write(&path, "{ clusters: ").unwrap();

    assert!(matches!(Config::load_from_file(&path), Err(VerdictError::Json(_))));
  }

  #[test]
  fn test_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("verdict.json");
    let config = Config {
      clusters: 4,
      store_root: Some(temp_dir.path().join("db")),
      business_name: None,
      lexicon: Some(temp_dir.path().join("lexicon.txt")),
    };

    config.save_to_file(&path).unwrap();
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
  }

  #[test]
  fn test_configured_lexicon() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lexicon.txt");
    fs::write(&path, "soggy\t-1.3\t0.9\t[-1, -2, -1]\n").unwrap();

    assert!(Config::default().load_lexicon().unwrap().is_none());

    let config = Config { lexicon: Some(path), ..Config::default() };
    let lexicon = config.load_lexicon().unwrap().unwrap();
    assert_eq!(lexicon.valence("soggy"), Some(-1.3));

    let missing = Config { lexicon: Some(temp_dir.path().join("missing.txt")), ..Config::default() };
    assert!(matches!(missing.load_lexicon(), Err(VerdictError::Io(_))));
  }

  #[test]
  #[serial]
  fn test_store_root_resolution_order() {
    let temp_dir = TempDir::new().unwrap();
    let configured = Config { store_root: Some(temp_dir.path().join("configured")), ..Config::default() };

    std::env::set_var(STORE_ROOT_ENV, temp_dir.path().join("env"));
    assert_eq!(configured.resolve_store_root().unwrap(), temp_dir.path().join("env"));

    std::env::remove_var(STORE_ROOT_ENV);
    assert_eq!(configured.resolve_store_root().unwrap(), temp_dir.path().join("configured"));
  }
}
