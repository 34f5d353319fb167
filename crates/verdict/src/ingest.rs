//! Turning uploaded CSV files and pasted text into new reviews.

use std::io::Read;
use tracing::{debug, warn};

use crate::review::{NewReview, ReviewSource};
use crate::{Result, VerdictError};

const TEXT_COLUMN: &str = "review_text";
const TEXT_COLUMN_ALTERNATIVES: [&str; 4] = ["text", "review", "comment", "content"];
const RATING_COLUMN: &str = "rating";
const DATE_COLUMN: &str = "date";

fn find_column(headers: &[String], name: &str) -> Option<usize> {
  headers.iter().position(|h| h == name)
}

/// Reviews from a CSV with a header row. The text column is `review_text`,
/// or failing that the first of `text`, `review`, `comment`, `content`;
/// `rating` and `date` are optional. Rows with blank text are skipped.
pub fn load_csv<R: Read>(reader: R, source: ReviewSource) -> Result<Vec<NewReview>> {
  let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
  let headers: Vec<String> = csv_reader.headers()?.iter().map(|h| h.trim().to_lowercase()).collect();

  let text_index = find_column(&headers, TEXT_COLUMN)
    .or_else(|| TEXT_COLUMN_ALTERNATIVES.iter().find_map(|alt| find_column(&headers, alt)))
    .ok_or_else(|| {
      VerdictError::invalid_input("CSV must contain a 'review_text' column (or text/review/comment/content)")
    })?;
  let rating_index = find_column(&headers, RATING_COLUMN);
  let date_index = find_column(&headers, DATE_COLUMN);

  let mut reviews = Vec::new();
  for (row, record) in csv_reader.records().enumerate() {
    let record = record?;
    // header is line 1
    let line = row + 2;

    let text = record.get(text_index).unwrap_or_default().trim();
    if text.is_empty() {
      warn!("Skipping CSV line {} - review text is blank", line);
      continue;
    }

    let rating = match rating_index.and_then(|i| record.get(i)).map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
        VerdictError::invalid_input(format!("line {line}: rating '{raw}' is not a number"))
      })?),
    };
    let date = date_index
      .and_then(|i| record.get(i))
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .map(str::to_string);

    reviews.push(NewReview::new(text, source)?.with_rating(rating).with_date(date));
  }

  debug!("Parsed {} reviews from CSV", reviews.len());
  Ok(reviews)
}

/// One review per non-blank line
pub fn parse_pasted(text: &str) -> Vec<NewReview> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter_map(|line| NewReview::new(line, ReviewSource::Paste).ok())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_review_text_column_with_optional_fields() {
    let data = "review_text,rating,date\nWaited 40 minutes,2,2024-05-01\nGreat coffee,,\n";
    let reviews = load_csv(data.as_bytes(), ReviewSource::Upload).unwrap();

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].text, "Waited 40 minutes");
    assert_eq!(reviews[0].rating, Some(2.0));
    assert_eq!(reviews[0].date.as_deref(), Some("2024-05-01"));
    assert_eq!(reviews[1].rating, None);
    assert_eq!(reviews[1].date, None);
    assert_eq!(reviews[1].source, ReviewSource::Upload);
  }

  #[test]
  fn test_alternative_text_column_is_case_insensitive() {
    let data = "id, Comment \n1,Rude staff\n2,\"Cold fries, soggy bun\"\n";
    let reviews = load_csv(data.as_bytes(), ReviewSource::Import).unwrap();

    let texts: Vec<&str> = reviews.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Rude staff", "Cold fries, soggy bun"]);
  }

  #[test]
  fn test_review_text_wins_over_alternatives() {
    let data = "text,review_text\nignored,used\n";
    let reviews = load_csv(data.as_bytes(), ReviewSource::Upload).unwrap();
    assert_eq!(reviews[0].text, "used");
  }

  #[test]
  fn test_missing_text_column() {
    let result = load_csv("rating,date\n5,2024-01-01\n".as_bytes(), ReviewSource::Upload);
    assert!(matches!(result, Err(VerdictError::InvalidInput { .. })));
  }

  #[test]
  fn test_blank_rows_are_skipped() {
    let data = "text\nfirst\n\"   \"\nsecond\n";
    let reviews = load_csv(data.as_bytes(), ReviewSource::Upload).unwrap();
    assert_eq!(reviews.len(), 2);
  }

  #[test]
  fn test_bad_rating() {
    let result = load_csv("text,rating\nfine,five\n".as_bytes(), ReviewSource::Upload);
    assert!(matches!(result, Err(VerdictError::InvalidInput { .. })));
  }

  #[test]
  fn test_parse_pasted() {
    let reviews = parse_pasted("  Slow service \n\n   \nGreat staff\n");
    let texts: Vec<&str> = reviews.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Slow service", "Great staff"]);
    assert!(reviews.iter().all(|r| r.source == ReviewSource::Paste));
  }
}
