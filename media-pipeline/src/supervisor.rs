//! Worker Supervisor - process lifecycle and supervision protocol
// Copyright 2025 Reelvault Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use async_trait::async_trait;
use reelvault_types::{Job, JobState, WorkerAck, WorkerCommand};
use statestore_client::StateStore;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::queue::JobDispatch;

/// Terminal result of one supervised job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

/// Every signal the supervised process can produce, folded into one type so
/// a single transition function decides what happens next. The worker is
/// always released through exactly one `Finish` step.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The child process started.
    Spawned,
    /// An acknowledgement arrived on the child's stdout.
    Message(WorkerAck),
    /// Spawn, channel, or watchdog failure.
    Errored(String),
    /// The child exited with the given code (None when killed by a signal).
    Exited(Option<i32>),
    /// The child's stdout reached end of file. Transport signal only; the
    /// result is still decided by the exit status.
    Disconnected,
}

/// Supervisor-side protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Presetting,
    Parsing,
    Finishing,
}

/// Action the supervision loop takes after consuming an event.
#[derive(Debug, PartialEq)]
enum Step {
    Send(WorkerCommand),
    RecordAndSend(JobState, WorkerCommand),
    Finish(JobOutcome),
    Ignore,
}

/// The single state-transition function of the supervision protocol.
fn transition(phase: Phase, event: &WorkerEvent) -> (Phase, Step) {
    match (phase, event) {
        (Phase::Idle, WorkerEvent::Spawned) => {
            (Phase::Presetting, Step::Send(WorkerCommand::Preset))
        }
        (Phase::Presetting, WorkerEvent::Message(WorkerAck::PresetDone)) => (
            Phase::Parsing,
            Step::RecordAndSend(JobState::Converting, WorkerCommand::Parse),
        ),
        (Phase::Parsing, WorkerEvent::Message(WorkerAck::ParseDone)) => (
            Phase::Finishing,
            Step::RecordAndSend(JobState::Done, WorkerCommand::Done),
        ),
        (_, WorkerEvent::Exited(code)) => {
            let outcome = if *code == Some(0) {
                JobOutcome::Succeeded
            } else {
                JobOutcome::Failed
            };
            (Phase::Finishing, Step::Finish(outcome))
        }
        (_, WorkerEvent::Errored(_)) => (Phase::Finishing, Step::Finish(JobOutcome::Failed)),
        (phase, WorkerEvent::Disconnected) => (phase, Step::Ignore),
        // Out-of-order acknowledgement or duplicate spawn signal.
        (phase, _) => (phase, Step::Ignore),
    }
}

enum Signal {
    Line(std::io::Result<Option<String>>),
    Exit(std::io::Result<std::process::ExitStatus>),
}

/// Spawns one transcode worker per job and drives it through the
/// preset/parse/done protocol, interpreting exit status into cleanup and
/// state updates.
pub struct WorkerSupervisor {
    worker_bin: PathBuf,
    intake_dir: PathBuf,
    media_dir: PathBuf,
    /// Watchdog bound for every wait on the worker (each acknowledgement and
    /// the final exit). A hung worker is killed and handled as a failure so
    /// the queue never stalls.
    phase_timeout: Duration,
    state_store: Arc<dyn StateStore>,
}

impl WorkerSupervisor {
    pub fn new(
        worker_bin: PathBuf,
        intake_dir: PathBuf,
        media_dir: PathBuf,
        phase_timeout: Duration,
        state_store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            worker_bin,
            intake_dir,
            media_dir,
            phase_timeout,
            state_store,
        }
    }

    /// Run one job to its terminal state.
    ///
    /// On success the source file is deleted; on any failure the job is
    /// recorded as `parse_error` and the source is kept under the quarantine
    /// name. Either way the job leaves the queue permanently.
    pub async fn submit(&self, job: &Job) -> JobOutcome {
        let source = job.source_path(&self.intake_dir);
        let bucket = job.bucket_path(&self.media_dir);

        info!(
            job_id = job.id,
            source = %source.display(),
            bucket = %bucket.display(),
            "Starting transcode worker"
        );

        let outcome = self.supervise(job, &source, &bucket).await;

        match outcome {
            JobOutcome::Succeeded => {
                info!(job_id = job.id, "Parsing done for media");

                // Remove resolved source file
                if let Err(e) = tokio::fs::remove_file(&source).await {
                    error!(job_id = job.id, error = %e, "Failed to remove resolved source file");
                }
            }
            JobOutcome::Failed => {
                error!(job_id = job.id, "Failed to parse media");
                self.record_state(job.id, JobState::ParseError).await;
                self.quarantine(job, &source).await;
            }
        }

        outcome
    }

    /// Drive the worker process until a terminal event. Returns exactly once,
    /// whichever of exit, error, or watchdog arrives first.
    async fn supervise(&self, job: &Job, source: &Path, bucket: &Path) -> JobOutcome {
        let mut child = match Command::new(&self.worker_bin)
            .arg(source)
            .arg(bucket)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!(
                    job_id = job.id,
                    worker = %self.worker_bin.display(),
                    error = %e,
                    "Failed to spawn transcode worker"
                );
                return JobOutcome::Failed;
            }
        };

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                error!(job_id = job.id, "Worker channel unavailable");
                let _ = child.kill().await;
                return JobOutcome::Failed;
            }
        };

        let mut stdin = stdin;
        let mut lines = BufReader::new(stdout).lines();
        let mut reader_open = true;
        let mut phase = Phase::Idle;
        let mut queued = Some(WorkerEvent::Spawned);

        loop {
            let event = match queued.take() {
                Some(event) => event,
                None => {
                    self.next_event(job, &mut child, &mut lines, &mut reader_open)
                        .await
                }
            };

            debug!(job_id = job.id, phase = ?phase, event = ?event, "Worker event");

            let (next_phase, step) = transition(phase, &event);
            phase = next_phase;

            match step {
                Step::Send(cmd) => {
                    if let Err(e) = send_command(&mut stdin, cmd).await {
                        queued = Some(WorkerEvent::Errored(format!("failed to send {cmd}: {e}")));
                    }
                }
                Step::RecordAndSend(state, cmd) => {
                    self.record_state(job.id, state).await;
                    if let Err(e) = send_command(&mut stdin, cmd).await {
                        queued = Some(WorkerEvent::Errored(format!("failed to send {cmd}: {e}")));
                    }
                }
                Step::Finish(outcome) => {
                    if outcome == JobOutcome::Failed {
                        // The process may still be alive after an error event.
                        let _ = child.start_kill();
                    }
                    return outcome;
                }
                Step::Ignore => {}
            }
        }
    }

    /// Wait for the next meaningful event from the worker, bounded by the
    /// watchdog timeout. Unknown stdout lines are logged and skipped.
    async fn next_event(
        &self,
        job: &Job,
        child: &mut Child,
        lines: &mut Lines<BufReader<ChildStdout>>,
        reader_open: &mut bool,
    ) -> WorkerEvent {
        loop {
            if !*reader_open {
                return match timeout(self.phase_timeout, child.wait()).await {
                    Ok(Ok(status)) => WorkerEvent::Exited(status.code()),
                    Ok(Err(e)) => WorkerEvent::Errored(format!("wait failed: {e}")),
                    Err(_) => self.watchdog_fired(job, child).await,
                };
            }

            let signal = timeout(self.phase_timeout, async {
                tokio::select! {
                    line = lines.next_line() => Signal::Line(line),
                    status = child.wait() => Signal::Exit(status),
                }
            })
            .await;

            match signal {
                Ok(Signal::Exit(Ok(status))) => return WorkerEvent::Exited(status.code()),
                Ok(Signal::Exit(Err(e))) => {
                    return WorkerEvent::Errored(format!("wait failed: {e}"))
                }
                Ok(Signal::Line(Ok(Some(line)))) => match line.trim().parse::<WorkerAck>() {
                    Ok(ack) => return WorkerEvent::Message(ack),
                    Err(_) => {
                        debug!(
                            job_id = job.id,
                            line = line.as_str(),
                            "Ignoring unexpected worker output"
                        );
                        continue;
                    }
                },
                Ok(Signal::Line(Ok(None))) => {
                    *reader_open = false;
                    return WorkerEvent::Disconnected;
                }
                Ok(Signal::Line(Err(e))) => {
                    return WorkerEvent::Errored(format!("channel read failed: {e}"))
                }
                Err(_) => return self.watchdog_fired(job, child).await,
            }
        }
    }

    async fn watchdog_fired(&self, job: &Job, child: &mut Child) -> WorkerEvent {
        warn!(
            job_id = job.id,
            timeout_secs = self.phase_timeout.as_secs(),
            "Watchdog timeout, killing worker"
        );

        let _ = child.kill().await;
        WorkerEvent::Errored(format!(
            "watchdog timeout after {}s",
            self.phase_timeout.as_secs()
        ))
    }

    /// Record a state transition; a state-store failure is logged and never
    /// interrupts supervision.
    async fn record_state(&self, job_id: u64, state: JobState) {
        if let Err(e) = self.state_store.set_state(job_id, state).await {
            error!(job_id = job_id, state = %state, error = %e, "Failed to record job state");
        }
    }

    /// Keep an unresolved source file under the quarantine name so later
    /// scans skip it. A no-op when the source never existed.
    async fn quarantine(&self, job: &Job, source: &Path) {
        let target = self.intake_dir.join(job.quarantined_filename());

        match tokio::fs::rename(source, &target).await {
            Ok(()) => info!(
                job_id = job.id,
                quarantined = %target.display(),
                "Source file quarantined"
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(job_id = job.id, "Source file absent, nothing to quarantine");
            }
            Err(e) => error!(job_id = job.id, error = %e, "Failed to quarantine source file"),
        }
    }
}

async fn send_command(stdin: &mut ChildStdin, cmd: WorkerCommand) -> std::io::Result<()> {
    stdin.write_all(cmd.as_str().as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

#[async_trait]
impl JobDispatch for WorkerSupervisor {
    async fn run(&self, job: Job) -> JobOutcome {
        self.submit(&job).await
    }
}
