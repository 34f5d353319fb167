use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerdictError {
  #[error("Invalid input: {message}")]
  InvalidInput { message: String },

  #[error("No usable terms in review text (only stop words or single characters)")]
  EmptyVocabulary,

  #[error("Clustering failed: {message}")]
  ClusteringFailed { message: String },

  #[error("Malformed lexicon entry on line {line}: {message}")]
  Lexicon { line: usize, message: String },

  #[error("Review store error: {message}")]
  Store { message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Csv(#[from] csv::Error),
}

impl VerdictError {
  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::InvalidInput { message: message.into() }
  }

  pub fn clustering_failed(message: impl Into<String>) -> Self {
    Self::ClusteringFailed { message: message.into() }
  }

  pub fn lexicon(line: usize, message: impl Into<String>) -> Self {
    Self::Lexicon { line, message: message.into() }
  }

  pub fn store(message: impl Into<String>) -> Self {
    Self::Store { message: message.into() }
  }
}

pub type Result<T> = std::result::Result<T, VerdictError>;
