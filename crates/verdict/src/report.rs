//! Exports of a finished analysis: issue table as CSV, the whole analysis as
//! JSON, and a plain Markdown action report.

use std::io::Write;

use crate::pipeline::Analysis;
use crate::priority::IssueTable;
use crate::Result;

/// Issues listed in the Markdown report
pub const REPORT_TOP_ISSUES: usize = 5;
/// Quotes printed under each reported issue
pub const REPORT_QUOTES_PER_ISSUE: usize = 2;

const MAX_QUOTE_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
  Csv,
  Json,
  Markdown,
}

impl ExportFormat {
  pub fn extension(&self) -> &'static str {
    match self {
      ExportFormat::Csv => "csv",
      ExportFormat::Json => "json",
      ExportFormat::Markdown => "md",
    }
  }
}

pub fn export<W: Write>(analysis: &Analysis, format: ExportFormat, business_name: &str, writer: W) -> Result<()> {
  match format {
    ExportFormat::Csv => write_issue_csv(&analysis.issues, writer),
    ExportFormat::Json => write_json(analysis, writer),
    ExportFormat::Markdown => write_markdown(analysis, business_name, writer),
  }
}

/// One header row, then one row per issue in priority order
pub fn write_issue_csv<W: Write>(issues: &IssueTable, writer: W) -> Result<()> {
  let mut csv_writer = csv::Writer::from_writer(writer);
  for row in issues {
    csv_writer.serialize(row)?;
  }
  csv_writer.flush()?;
  Ok(())
}

pub fn write_json<W: Write>(analysis: &Analysis, writer: W) -> Result<()> {
  serde_json::to_writer_pretty(writer, analysis)?;
  Ok(())
}

fn truncate_quote(quote: &str) -> String {
  let flat = quote.split_whitespace().collect::<Vec<_>>().join(" ");
  if flat.chars().count() <= MAX_QUOTE_CHARS {
    return flat;
  }
  let cut: String = flat.chars().take(MAX_QUOTE_CHARS - 3).collect();
  format!("{}...", cut.trim_end())
}

pub fn render_markdown(analysis: &Analysis, business_name: &str) -> Result<String> {
  let mut buffer = Vec::new();
  write_markdown(analysis, business_name, &mut buffer)?;
  Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_markdown<W: Write>(analysis: &Analysis, business_name: &str, mut out: W) -> Result<()> {
  let summary = &analysis.summary;
  let quotes = analysis.top_quotes(REPORT_QUOTES_PER_ISSUE);

  writeln!(out, "# Review-to-Action Report: {business_name}\n")?;
  writeln!(out, "- Total reviews analyzed: {}", summary.reviews)?;
  writeln!(out, "- Negative %: {:.1}", summary.negative_pct)?;
  writeln!(out, "- Average sentiment: {:.3}\n", summary.avg_sentiment)?;

  writeln!(out, "## Top priorities (do these first)\n")?;
  for (rank, row) in analysis.issues.top(REPORT_TOP_ISSUES).iter().enumerate() {
    writeln!(
      out,
      "{}. **{}** | priority={} | freq={} ({}%)",
      rank + 1,
      row.issue_label,
      row.priority_score,
      row.frequency,
      row.frequency_pct
    )?;
    writeln!(out, "   - Action: {}", row.recommended_action)?;
    for quote in quotes.get(&row.cluster_id).into_iter().flatten() {
      writeln!(out, "   - Quote: \"{}\"", truncate_quote(quote))?;
    }
  }

  writeln!(out, "\n## Notes\n")?;
  writeln!(out, "- This report groups similar review themes using text clustering.")?;
  writeln!(out, "- Priority score combines frequency, negativity severity, and ease-to-fix.")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pipeline::Analyzer;
  use crate::review::{NewReview, Review, ReviewSource};

  fn analysis() -> Analysis {
    let reviews: Vec<Review> = ["Staff was rude to me", "good", "Waited 40 minutes, so slow"]
      .iter()
      .enumerate()
      .map(|(i, text)| Review::from_new(i as u64 + 1, "cafe", NewReview::new(*text, ReviewSource::Paste).unwrap()))
      .collect();
    Analyzer::default().analyze("cafe", &reviews).unwrap()
  }

  #[test]
  fn test_issue_csv_has_header_and_rows() {
    let mut buffer = Vec::new();
    write_issue_csv(&analysis().issues, &mut buffer).unwrap();
    let csv = String::from_utf8(buffer).unwrap();

    let mut lines = csv.lines();
    assert_eq!(
      lines.next(),
      Some(
        "cluster_id,issue_label,frequency,frequency_pct,avg_sentiment,severity_score,ease_score,priority_score,recommended_action"
      )
    );
    assert!(lines.next().unwrap().starts_with("0,mixed,3,100.0,"));
  }

  #[test]
  fn test_json_includes_summary_and_keywords() {
    let mut buffer = Vec::new();
    write_json(&analysis(), &mut buffer).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

    assert_eq!(value["workspace"], "cafe");
    assert_eq!(value["summary"]["reviews"], 3);
    assert_eq!(value["keywords"]["0"][0], "mixed");
  }

  #[test]
  fn test_markdown_report() {
    let report = render_markdown(&analysis(), "Corner Cafe").unwrap();

    assert!(report.starts_with("# Review-to-Action Report: Corner Cafe"));
    assert!(report.contains("- Total reviews analyzed: 3"));
    assert!(report.contains("1. **mixed**"));
    assert_eq!(report.matches("   - Quote:").count(), REPORT_QUOTES_PER_ISSUE);
    assert!(report.contains("Quote: \"Staff was rude to me\""));
    assert!(report.contains("## Notes"));
  }

  struct FullDisk;

  impl Write for FullDisk {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
      Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn test_markdown_write_errors_propagate() {
    let result = export(&analysis(), ExportFormat::Markdown, "Corner Cafe", FullDisk);
    assert!(matches!(result, Err(crate::VerdictError::Io(_))));
  }

  #[test]
  fn test_markdown_export_matches_render() {
    let mut buffer = Vec::new();
    export(&analysis(), ExportFormat::Markdown, "Corner Cafe", &mut buffer).unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), render_markdown(&analysis(), "Corner Cafe").unwrap());
  }

  #[test]
  fn test_long_quotes_are_shortened() {
    let quote = "word ".repeat(60);
    let short = truncate_quote(&quote);
    assert!(short.ends_with("..."));
    assert!(short.chars().count() <= MAX_QUOTE_CHARS);
  }
}
