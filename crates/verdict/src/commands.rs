use anyhow::{anyhow, Context as _, Result};
use colored::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use verdict::ingest::{load_csv, parse_pasted};
use verdict::report::{self, ExportFormat};
use verdict::{
  Analysis, Analyzer, Config, FileStore, IssueRow, Lexicon, ReviewSource, ReviewStore, SentimentLabel,
};

/// Config, store and lexicon shared by every command
pub struct Context {
  pub config: Config,
  pub store: FileStore,
  pub lexicon: Option<Lexicon>,
}

impl Context {
  pub fn load(config_path: Option<&Path>) -> Result<Self> {
    let config = match config_path {
      Some(path) => {
        Config::load_from_file(path).with_context(|| format!("failed to load config from {}", path.display()))?
      }
      None => Config::load()?,
    };
    let store = FileStore::new(config.resolve_store_root()?);
    let lexicon = config.load_lexicon().context("failed to load lexicon")?;
    Ok(Self { config, store, lexicon })
  }

  fn run_analysis(&self, workspace: &str, clusters: Option<usize>) -> Result<Option<Analysis>> {
    let reviews = self.store.fetch(workspace, None)?;
    if reviews.is_empty() {
      println!("No reviews in workspace {}", workspace.cyan());
      return Ok(None);
    }

    let clusters = clusters.unwrap_or(self.config.clusters);
    if clusters == 0 {
      return Err(anyhow!("--clusters must be at least 1"));
    }

    let lexicon = self.lexicon.as_ref().unwrap_or_else(|| Lexicon::builtin());
    let analysis = Analyzer::new(lexicon).with_clusters(clusters).analyze(workspace, &reviews)?;
    Ok(Some(analysis))
  }
}

fn label_colored(label: SentimentLabel) -> ColoredString {
  match label {
    SentimentLabel::Negative => label.to_string().red(),
    SentimentLabel::Neutral => label.to_string().yellow(),
    SentimentLabel::Positive => label.to_string().green(),
  }
}

/// Add reviews from a CSV file, a text file, or stdin
pub fn ingest(context: &mut Context, workspace: &str, csv: Option<&Path>, paste: Option<&Path>) -> Result<()> {
  let reviews = match (csv, paste) {
    (Some(path), _) => {
      let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
      load_csv(file, ReviewSource::Upload)?
    }
    (None, Some(path)) => {
      let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
      parse_pasted(&text)
    }
    (None, None) => {
      let mut text = String::new();
      io::stdin().read_to_string(&mut text).context("failed to read reviews from stdin")?;
      parse_pasted(&text)
    }
  };

  if reviews.is_empty() {
    println!("{} No reviews found in input", "!".yellow());
    return Ok(());
  }

  let stored = context.store.insert(workspace, reviews)?;
  println!("{} Saved {} reviews to workspace {}", "✓".green(), stored.len(), workspace.cyan());
  Ok(())
}

pub fn list_reviews(context: &Context, workspace: &str, limit: usize) -> Result<()> {
  let total = context.store.fetch(workspace, None)?.len();
  if total == 0 {
    println!("No reviews in workspace {}", workspace.cyan());
    return Ok(());
  }

  println!("Total reviews in workspace {}: {}", workspace.cyan(), total.to_string().bold());
  for review in context.store.fetch(workspace, Some(limit))? {
    let rating = review.rating.map(|r| format!(" ({r})")).unwrap_or_default();
    println!("{}{} {}", format!("#{}", review.id).dimmed(), rating.yellow(), review.text);
  }
  Ok(())
}

pub fn clear_workspace(context: &mut Context, workspace: &str, force: bool) -> Result<()> {
  if !force {
    println!("Are you sure you want to delete ALL reviews in {}? [y/N]", workspace.cyan());

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if !input.trim().to_lowercase().starts_with('y') {
      println!("Deletion cancelled");
      return Ok(());
    }
  }

  let removed = context.store.clear(workspace)?;
  println!("{} Deleted {} reviews from workspace {}", "✓".green(), removed, workspace.cyan());
  Ok(())
}

fn print_issue(rank: usize, row: &IssueRow) {
  println!(
    "{:>2}. {} {}",
    rank,
    row.issue_label.bold(),
    format!("[cluster {}]", row.cluster_id).dimmed()
  );
  println!(
    "    priority={}  freq={} ({}%)  avg={}  severity={}  ease={}",
    row.priority_score.to_string().magenta(),
    row.frequency,
    row.frequency_pct,
    row.avg_sentiment,
    row.severity_score,
    row.ease_score
  );
  println!("    {}", row.recommended_action);
}

/// Dashboard: summary metrics plus the full issue table
pub fn analyze(context: &Context, workspace: &str, clusters: Option<usize>) -> Result<()> {
  let Some(analysis) = context.run_analysis(workspace, clusters)? else {
    return Ok(());
  };

  let summary = &analysis.summary;
  println!("{} {}", "Workspace".bold(), workspace.cyan());
  println!("  Reviews:        {}", summary.reviews);
  println!("  Negative %:     {:.1}%", summary.negative_pct);
  println!("  Avg sentiment:  {:.3}", summary.avg_sentiment);
  println!();
  println!("{}", "Top issues (by priority)".bold());

  for (i, row) in analysis.issues.iter().enumerate() {
    print_issue(i + 1, row);
  }
  Ok(())
}

pub fn show_evidence(
  context: &Context,
  workspace: &str,
  clusters: Option<usize>,
  cluster: usize,
  limit: usize,
) -> Result<()> {
  let Some(analysis) = context.run_analysis(workspace, clusters)? else {
    return Ok(());
  };

  let Some(row) = analysis.issues.get(cluster) else {
    let known: Vec<String> = analysis.issues.iter().map(|r| r.cluster_id.to_string()).collect();
    return Err(anyhow!("no issue cluster {} (available: {})", cluster, known.join(", ")));
  };

  println!("{} {}: {}", "Cluster".bold(), cluster, row.issue_label.cyan());
  println!("Top keywords: {}", analysis.keywords.get(cluster).join(", "));
  println!();
  println!("{}", "Most negative examples".bold());

  for review in analysis.evidence(cluster, limit) {
    let rating = review.scored.review.rating.map(|r| format!("({r}) ")).unwrap_or_default();
    println!(
      "- {}{} ({:.3}) {}",
      rating,
      label_colored(review.label()),
      review.compound(),
      review.text()
    );
  }
  Ok(())
}

/// The three highest-priority issues with why / do / priority
pub fn show_actions(context: &Context, workspace: &str, clusters: Option<usize>) -> Result<()> {
  let Some(analysis) = context.run_analysis(workspace, clusters)? else {
    return Ok(());
  };

  println!("{}", "Top 3 actions to do this week".bold());
  for (i, row) in analysis.issues.top(3).iter().enumerate() {
    println!();
    println!("{}) {}", i + 1, row.issue_label.bold());
    println!(
      "  - {} {} reviews ({}%) and avg sentiment {}",
      "Why:".bold(),
      row.frequency,
      row.frequency_pct,
      row.avg_sentiment
    );
    println!("  - {} {}", "Do:".bold(), row.recommended_action);
    println!("  - {} {}", "Priority score:".bold(), row.priority_score);
  }
  Ok(())
}

pub fn export(
  context: &Context,
  workspace: &str,
  clusters: Option<usize>,
  format: ExportFormat,
  output: Option<&Path>,
) -> Result<()> {
  let Some(analysis) = context.run_analysis(workspace, clusters)? else {
    return Ok(());
  };
  let business_name = context.config.business_name_or(workspace);

  match output {
    Some(path) => {
      let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
      let mut writer = BufWriter::new(file);
      report::export(&analysis, format, business_name, &mut writer)?;
      writer.flush()?;
      eprintln!("{} Wrote {} export to {}", "✓".green(), format.extension(), path.display());
    }
    None => {
      let stdout = io::stdout();
      let mut handle = stdout.lock();
      report::export(&analysis, format, business_name, &mut handle)?;
      handle.flush()?;
    }
  }
  Ok(())
}
