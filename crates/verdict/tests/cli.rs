use assert_cmd::Command;
use assert_fs::prelude::*;

use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;

/// `verdict` binary with its store and working directory inside `temp`
fn verdict_cmd(temp: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("verdict").expect("binary exists");
  cmd.current_dir(temp.path());
  cmd.env("VERDICT_STORE_ROOT", temp.path().join("store"));
  cmd.env("NO_COLOR", "1");
  cmd.env_remove("RUST_LOG");
  cmd
}

const DINER_REVIEWS: &str = "Waited 40 minutes for a table\n\
                             Service was slow again\n\
                             Staff was rude to me\n\
                             Great food, very clean\n\
                             Loved the vibe\n\
                             Too expensive for what you get\n";

#[test]
#[serial]
fn test_ingest_list_clear() {
  let temp = assert_fs::TempDir::new().unwrap();

  verdict_cmd(&temp)
    .args(["ingest", "diner"])
    .write_stdin(DINER_REVIEWS)
    .assert()
    .success()
    .stdout(contains("Saved 6 reviews"));

  verdict_cmd(&temp)
    .args(["list", "diner", "--limit", "2"])
    .assert()
    .success()
    .stdout(contains("Too expensive for what you get").and(contains("Waited 40 minutes").not()));

  verdict_cmd(&temp)
    .args(["clear", "diner", "--force"])
    .assert()
    .success()
    .stdout(contains("Deleted 6 reviews"));

  verdict_cmd(&temp).args(["list", "diner"]).assert().success().stdout(contains("No reviews"));

  temp.close().unwrap();
}

#[test]
#[serial]
fn test_clear_can_be_cancelled() {
  let temp = assert_fs::TempDir::new().unwrap();
  verdict_cmd(&temp).args(["ingest", "diner"]).write_stdin("Slow service\n").assert().success();

  verdict_cmd(&temp)
    .args(["clear", "diner"])
    .write_stdin("n\n")
    .assert()
    .success()
    .stdout(contains("Deletion cancelled"));

  verdict_cmd(&temp).args(["list", "diner"]).assert().success().stdout(contains("Slow service"));
}

#[test]
#[serial]
fn test_csv_ingest_and_analysis_commands() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("reviews.csv");
  csv
    .write_str(
      "comment,rating\n\
       Waited 40 minutes for a table,2\n\
       Service was slow again,2\n\
       Staff was rude to me,1\n\
       \"Great food, very clean\",5\n\
       Loved the vibe,5\n\
       Too expensive for what you get,3\n",
    )
    .unwrap();

  verdict_cmd(&temp)
    .args(["ingest", "diner", "--csv", "reviews.csv"])
    .assert()
    .success()
    .stdout(contains("Saved 6 reviews"));

  verdict_cmd(&temp)
    .args(["analyze", "diner", "--clusters", "3"])
    .assert()
    .success()
    .stdout(contains("Reviews:        6").and(contains("Reduce wait times")));

  verdict_cmd(&temp)
    .args(["actions", "diner"])
    .assert()
    .success()
    .stdout(contains("Top 3 actions").and(contains("Why:")));

  verdict_cmd(&temp)
    .args(["evidence", "diner", "--cluster", "0"])
    .assert()
    .success()
    .stdout(contains("Most negative examples"));

  verdict_cmd(&temp)
    .args(["evidence", "diner", "--cluster", "9"])
    .assert()
    .failure()
    .stderr(contains("no issue cluster 9"));
}

#[test]
#[serial]
fn test_exports() {
  let temp = assert_fs::TempDir::new().unwrap();
  verdict_cmd(&temp).args(["ingest", "diner"]).write_stdin(DINER_REVIEWS).assert().success();

  verdict_cmd(&temp)
    .args(["export", "diner"])
    .assert()
    .success()
    .stdout(contains("cluster_id,issue_label,frequency"));

  verdict_cmd(&temp)
    .args(["export", "diner", "--format", "json"])
    .assert()
    .success()
    .stdout(contains("\"workspace\": \"diner\""));

  verdict_cmd(&temp)
    .args(["export", "diner", "--format", "markdown", "--output", "report.md"])
    .assert()
    .success();
  let report = std::fs::read_to_string(temp.child("report.md").path()).unwrap();
  assert!(report.starts_with("# Review-to-Action Report: diner"));
}

#[test]
#[serial]
fn test_business_name_from_config() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child(".verdict.json").write_str(r#"{"business_name": "Corner Diner", "clusters": 2}"#).unwrap();
  verdict_cmd(&temp).args(["ingest", "diner"]).write_stdin(DINER_REVIEWS).assert().success();

  verdict_cmd(&temp)
    .args(["export", "diner", "--format", "markdown"])
    .assert()
    .success()
    .stdout(contains("# Review-to-Action Report: Corner Diner"));
}

#[test]
#[serial]
fn test_bad_workspace_name() {
  let temp = assert_fs::TempDir::new().unwrap();

  verdict_cmd(&temp)
    .args(["ingest", "../escape"])
    .write_stdin("Slow service\n")
    .assert()
    .failure()
    .stderr(contains("workspace name"));
}

#[test]
#[serial]
fn test_empty_workspace_analysis() {
  let temp = assert_fs::TempDir::new().unwrap();
  verdict_cmd(&temp).args(["analyze", "nobody"]).assert().success().stdout(contains("No reviews"));
}

#[test]
#[serial]
fn test_configured_lexicon_changes_scores() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("words.txt").write_str("soggy\t-2.0\t0.5\t[-2, -2]\n").unwrap();
  temp.child(".verdict.json").write_str(r#"{"lexicon": "words.txt"}"#).unwrap();
  verdict_cmd(&temp).args(["ingest", "diner"]).write_stdin("Soggy fries\n").assert().success();

  verdict_cmd(&temp).args(["analyze", "diner"]).assert().success().stdout(contains("Avg sentiment:  -0.459"));
}
