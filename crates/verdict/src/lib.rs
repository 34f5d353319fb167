//! Verdict - Review-to-Action Analysis Engine
//!
//! Scores customer reviews for sentiment, groups them into recurring issue
//! themes and ranks those themes into a prioritised action list.

pub mod cluster;
pub mod config;
pub mod error;
pub mod ingest;
pub mod kmeans;
pub mod pipeline;
pub mod priority;
pub mod report;
pub mod review;
pub mod sentiment;
pub mod store;
pub mod text;
pub mod tfidf;

pub use cluster::IssueClusterer;
pub use config::Config;
pub use error::{Result, VerdictError};
pub use pipeline::{Analysis, Analyzer, Summary};
pub use priority::{ActionRule, IssueRow, IssueTable, PriorityScorer, RuleBook};
pub use review::{ClusterKeywords, ClusteredReview, NewReview, Review, ReviewSource, ScoredReview, SentimentLabel};
pub use sentiment::{Lexicon, SentimentScore, SentimentScorer};
pub use store::{FileStore, MemoryStore, ReviewStore};
