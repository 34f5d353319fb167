use serial_test::serial;
use tempfile::TempDir;

use verdict::config::STORE_ROOT_ENV;
use verdict::ingest::{load_csv, parse_pasted};
use verdict::review::ReviewSource;
use verdict::{Analyzer, Config, FileStore, ReviewStore, VerdictError};

#[test]
#[serial]
fn test_env_root_scopes_workspaces_on_disk() {
  let temp_dir = TempDir::new().unwrap();
  std::env::set_var(STORE_ROOT_ENV, temp_dir.path());

  let root = Config::default().resolve_store_root().unwrap();
  let mut store = FileStore::new(&root);
  store.insert("north", parse_pasted("Cold fries\nSlow drive-thru")).unwrap();
  store.insert("south", parse_pasted("Friendly staff")).unwrap();

  assert!(temp_dir.path().join("north.json").exists());
  assert!(temp_dir.path().join("south.json").exists());
  assert_eq!(store.fetch("north", None).unwrap().len(), 2);
  assert_eq!(store.fetch("south", None).unwrap().len(), 1);

  std::env::remove_var(STORE_ROOT_ENV);
}

#[test]
fn test_csv_upload_to_analysis() {
  let temp_dir = TempDir::new().unwrap();
  let csv = "Review_Text,Rating,Date\n\
             \"Waited 40 minutes, bad cold food\",1,2024-03-01\n\
             Friendly staff and clean tables,5,2024-03-02\n\
             ,3,2024-03-03\n";

  let mut store = FileStore::new(temp_dir.path());
  let stored = store.insert("diner", load_csv(csv.as_bytes(), ReviewSource::Upload).unwrap()).unwrap();
  assert_eq!(stored.len(), 2);
  assert_eq!(stored[0].rating, Some(1.0));

  let reviews = store.fetch("diner", None).unwrap();
  assert_eq!(reviews[0].text, "Friendly staff and clean tables");

  let analysis = Analyzer::default().analyze("diner", &reviews).unwrap();
  assert_eq!(analysis.summary.reviews, 2);
  assert_eq!(analysis.summary.negative_pct, 50.0);
}

#[test]
fn test_rejects_unsafe_workspace_names() {
  let temp_dir = TempDir::new().unwrap();
  let mut store = FileStore::new(temp_dir.path());

  let result = store.insert("../outside", parse_pasted("hello"));
  assert!(matches!(result, Err(VerdictError::InvalidInput { .. })));
  assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
}

#[test]
fn test_ids_continue_after_reopen() {
  let temp_dir = TempDir::new().unwrap();
  FileStore::new(temp_dir.path()).insert("cafe", parse_pasted("one\ntwo")).unwrap();

  let mut reopened = FileStore::new(temp_dir.path());
  let stored = reopened.insert("cafe", parse_pasted("three")).unwrap();
  assert_eq!(stored[0].id, 3);
}
