//! Worker Supervisor Tests
//!
//! Drive the supervision protocol against small shell stubs standing in for
//! the transcode worker binary.

#![cfg(unix)]

use media_pipeline::supervisor::{JobOutcome, WorkerSupervisor};
use reelvault_types::{Job, JobState};
use statestore_client::{MemoryStateStore, StateStore};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const GOOD_WORKER: &str = r#"#!/bin/sh
while read cmd; do
  case "$cmd" in
    "preset") echo "preset:done" ;;
    "parse") echo "parse:done" ;;
    "done") exit 0 ;;
  esac
done
exit 1
"#;

const NOISY_WORKER: &str = r#"#!/bin/sh
while read cmd; do
  case "$cmd" in
    "preset") echo "preset:done" ;;
    "parse")
      echo "converting:1080p"
      echo "converted:1080p"
      echo "parse:done"
      ;;
    "done") exit 0 ;;
  esac
done
exit 1
"#;

const FAILING_WORKER: &str = r#"#!/bin/sh
read cmd
exit 1
"#;

const HANGING_WORKER: &str = r#"#!/bin/sh
while read cmd; do :; done
exit 0
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    intake_dir: PathBuf,
    media_dir: PathBuf,
    store: Arc<MemoryStateStore>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let intake_dir = root.join("intake");
    let media_dir = root.join("media");
    std::fs::create_dir_all(&intake_dir).unwrap();
    std::fs::create_dir_all(&media_dir).unwrap();
    std::fs::write(intake_dir.join("7.mp4"), b"video").unwrap();

    Fixture {
        _dir: dir,
        root,
        intake_dir,
        media_dir,
        store: Arc::new(MemoryStateStore::new()),
    }
}

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn supervisor(fx: &Fixture, worker_bin: PathBuf, timeout: Duration) -> WorkerSupervisor {
    let store: Arc<dyn StateStore> = fx.store.clone();
    WorkerSupervisor::new(
        worker_bin,
        fx.intake_dir.clone(),
        fx.media_dir.clone(),
        timeout,
        store,
    )
}

fn job() -> Job {
    Job::from_intake_name("7.mp4").unwrap()
}

#[tokio::test]
async fn test_success_path_deletes_source_and_records_done() {
    let fx = fixture();
    let worker = write_stub(&fx.root, "worker-ok.sh", GOOD_WORKER);
    let supervisor = supervisor(&fx, worker, Duration::from_secs(10));

    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Succeeded);
    assert!(!fx.intake_dir.join("7.mp4").exists());
    assert!(!fx.intake_dir.join("_7.mp4").exists());
    assert_eq!(
        fx.store.history(7),
        vec![JobState::Converting, JobState::Done]
    );
}

#[tokio::test]
async fn test_progress_noise_on_stdout_is_tolerated() {
    let fx = fixture();
    let worker = write_stub(&fx.root, "worker-noisy.sh", NOISY_WORKER);
    let supervisor = supervisor(&fx, worker, Duration::from_secs(10));

    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Succeeded);
    assert_eq!(fx.store.current_state(7), Some(JobState::Done));
}

#[tokio::test]
async fn test_failure_path_quarantines_source_and_records_parse_error() {
    let fx = fixture();
    let worker = write_stub(&fx.root, "worker-fail.sh", FAILING_WORKER);
    let supervisor = supervisor(&fx, worker, Duration::from_secs(10));

    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert!(!fx.intake_dir.join("7.mp4").exists());
    assert!(fx.intake_dir.join("_7.mp4").exists());
    assert_eq!(fx.store.history(7), vec![JobState::ParseError]);
}

#[tokio::test]
async fn test_watchdog_kills_hung_worker_and_fails_the_job() {
    let fx = fixture();
    let worker = write_stub(&fx.root, "worker-hang.sh", HANGING_WORKER);
    let supervisor = supervisor(&fx, worker, Duration::from_secs(1));

    let started = std::time::Instant::now();
    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(fx.intake_dir.join("_7.mp4").exists());
    assert_eq!(fx.store.current_state(7), Some(JobState::ParseError));
}

#[tokio::test]
async fn test_spawn_failure_is_a_terminal_failure() {
    let fx = fixture();
    let supervisor = supervisor(
        &fx,
        fx.root.join("no-such-worker"),
        Duration::from_secs(10),
    );

    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert!(fx.intake_dir.join("_7.mp4").exists());
    assert_eq!(fx.store.current_state(7), Some(JobState::ParseError));
}

#[tokio::test]
async fn test_quarantine_is_idempotent_when_source_is_absent() {
    let fx = fixture();
    std::fs::remove_file(fx.intake_dir.join("7.mp4")).unwrap();
    let worker = write_stub(&fx.root, "worker-fail.sh", FAILING_WORKER);
    let supervisor = supervisor(&fx, worker, Duration::from_secs(10));

    let outcome = supervisor.submit(&job()).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert!(!fx.intake_dir.join("_7.mp4").exists());
    assert_eq!(fx.store.current_state(7), Some(JobState::ParseError));
}
