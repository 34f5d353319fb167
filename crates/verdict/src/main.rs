use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use verdict::report::ExportFormat;

mod commands;

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Verdict - Review-to-Action Engine\nTurn customer reviews into ranked issues and concrete fixes")]
#[command(version)]
struct Cli {
  /// Config file (defaults to .verdict.json, verdict.json or .verdict/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Options shared by every command that runs an analysis
#[derive(Args)]
struct AnalysisArgs {
  /// Workspace holding the reviews
  workspace: String,
  /// Requested number of issue clusters (overrides config)
  #[arg(short = 'k', long)]
  clusters: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
  /// Add reviews to a workspace from a CSV file or pasted text
  Ingest {
    /// Workspace to add reviews to
    workspace: String,
    /// CSV file with a review_text (or text/review/comment/content) column
    #[arg(long, conflicts_with = "paste")]
    csv: Option<PathBuf>,
    /// Text file with one review per line; reads stdin when omitted
    #[arg(long)]
    paste: Option<PathBuf>,
  },
  /// Show stored reviews, newest first
  List {
    workspace: String,
    /// Maximum number of reviews to show
    #[arg(short, long, default_value_t = 50)]
    limit: usize,
  },
  /// Delete every review in a workspace
  Clear {
    workspace: String,
    /// Skip confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
  /// Score, cluster and rank a workspace's reviews
  Analyze {
    #[command(flatten)]
    analysis: AnalysisArgs,
  },
  /// Show the most negative reviews of one issue cluster
  Evidence {
    #[command(flatten)]
    analysis: AnalysisArgs,
    /// Cluster id from the issue table
    #[arg(short = 'c', long)]
    cluster: usize,
    /// Maximum number of reviews to show
    #[arg(short, long, default_value_t = verdict::pipeline::DEFAULT_EVIDENCE_LIMIT)]
    limit: usize,
  },
  /// Show the top three actions to take
  Actions {
    #[command(flatten)]
    analysis: AnalysisArgs,
  },
  /// Export the issue table, the full analysis or a report
  Export {
    #[command(flatten)]
    analysis: AnalysisArgs,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,
    /// Output file; writes to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn init_logging(verbose: bool) {
  let default_filter = if verbose { "verdict=debug,info" } else { "verdict=info,warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let mut context = commands::Context::load(cli.config.as_deref())?;

  match cli.command {
    Commands::Ingest { workspace, csv, paste } => {
      commands::ingest(&mut context, &workspace, csv.as_deref(), paste.as_deref())?;
    }
    Commands::List { workspace, limit } => {
      commands::list_reviews(&context, &workspace, limit)?;
    }
    Commands::Clear { workspace, force } => {
      commands::clear_workspace(&mut context, &workspace, force)?;
    }
    Commands::Analyze { analysis } => {
      commands::analyze(&context, &analysis.workspace, analysis.clusters)?;
    }
    Commands::Evidence { analysis, cluster, limit } => {
      commands::show_evidence(&context, &analysis.workspace, analysis.clusters, cluster, limit)?;
    }
    Commands::Actions { analysis } => {
      commands::show_actions(&context, &analysis.workspace, analysis.clusters)?;
    }
    Commands::Export { analysis, format, output } => {
      commands::export(&context, &analysis.workspace, analysis.clusters, format, output.as_deref())?;
    }
  }

  Ok(())
}
