//! Verifier invocation.
//!
//! The verifier runs as a subprocess against a workspace directory. A reader
//! task scans its stdout line by line and reports the first marker it sees
//! through a oneshot channel, while the invoking flow races that signal
//! against the attempt deadline.

use crate::config::VerifierConfig;
use crate::{MinifyError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration, Instant};

/// Any output line containing this marks the run as failed.
pub const ERROR_MARKER: &str = "ERROR";

/// Success summary printed by the verifier.
pub const SUCCESS_MARKER: &str = "0 error(s)";

/// Outcome of one verifier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Timeout,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Timeout => "timeout",
        };
        f.write_str(label)
    }
}

/// Something that can judge a materialized workspace.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Verify `target`. `None` means no deadline.
    async fn verify(&self, target: &Path, deadline: Option<Duration>) -> Result<Verdict>;
}

/// Paths needed to launch the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecInfo {
    /// Interpreter that runs the verifier artifact (usually `java`)
    pub interpreter: String,
    /// Verifier artifact passed to `-jar`
    pub verifier_jar: PathBuf,
    /// Include path (project root)
    pub root: PathBuf,
}

/// Classify a single output line. Failure is checked first.
pub fn classify_line(line: &str) -> Option<Verdict> {
    if line.contains(ERROR_MARKER) {
        return Some(Verdict::Fail);
    }
    if reports_zero_errors(line) {
        return Some(Verdict::Pass);
    }
    None
}

// "10 error(s)" also contains the success marker; require it to start a number.
fn reports_zero_errors(line: &str) -> bool {
    line.match_indices(SUCCESS_MARKER).any(|(at, _)| {
        !line[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Read `reader` to the end, sending the first classified line through `tx`.
///
/// Output after the first marker is still drained so the verifier never
/// blocks on a full pipe. Dropping `tx` unsent means no marker was seen.
pub async fn stream_verdict<R>(reader: R, tx: oneshot::Sender<Verdict>)
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader;
    let mut tx = Some(tx);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                log::debug!("> {line}");
                if let Some(verdict) = classify_line(line) {
                    if let Some(tx) = tx.take() {
                        let _ = tx.send(verdict);
                    }
                }
            }
            Err(err) => {
                log::debug!("verifier output read failed: {err}");
                break;
            }
        }
    }
}

/// Runs the verifier as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    exec: ExecInfo,
    verifier: VerifierConfig,
}

impl ProcessOracle {
    pub fn new(exec: ExecInfo, verifier: VerifierConfig) -> Self {
        Self { exec, verifier }
    }

    pub fn exec(&self) -> &ExecInfo {
        &self.exec
    }

    /// Full argument list passed to the interpreter for `target`.
    pub fn arguments(&self, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.verifier.jvm_args.iter().map(OsString::from).collect();
        args.push("-jar".into());
        args.push(self.exec.verifier_jar.clone().into());
        args.extend(
            [
                "--backend",
                self.verifier.backend.as_str(),
                "--chop",
                "1",
                "--cacheFile",
            ]
            .map(OsString::from),
        );
        args.push(self.verifier.cache_file.clone().into());
        args.extend(
            [
                "--onlyFilesWithHeader",
                "--assumeInjectivityOnInhale",
                "--checkConsistency",
                "--mceMode=on",
                "--moreJoins",
                "off",
                "-g",
            ]
            .map(OsString::from),
        );
        args.push(self.verifier.scratch_dir.clone().into());
        args.push("-I".into());
        args.push(self.exec.root.clone().into());
        args.push("-p".into());
        args.push(target.into());
        args
    }

    fn spawn(&self, target: &Path) -> Result<Child> {
        Command::new(&self.exec.interpreter)
            .args(self.arguments(target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MinifyError::SpawnFailed {
                program: self.exec.interpreter.clone(),
                source,
            })
    }
}

#[async_trait]
impl Oracle for ProcessOracle {
    async fn verify(&self, target: &Path, deadline: Option<Duration>) -> Result<Verdict> {
        let started = Instant::now();
        let mut child = self.spawn(target)?;
        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child).await;
            return Err(MinifyError::IoError(std::io::Error::other(
                "verifier stdout was not captured",
            )));
        };

        let (tx, rx) = oneshot::channel();
        let reader = tokio::spawn(stream_verdict(BufReader::new(stdout), tx));

        let signal = match deadline {
            Some(limit) => timeout(limit, rx).await.ok(),
            None => Some(rx.await),
        };

        let verdict = match signal {
            None => Verdict::Timeout,
            Some(Ok(verdict)) => verdict,
            // reader hit end of output without a marker
            Some(Err(_)) => Verdict::Fail,
        };

        if verdict == Verdict::Timeout {
            terminate(&mut child).await;
        } else {
            let grace = deadline.map(|limit| limit.saturating_sub(started.elapsed()));
            settle(&mut child, grace).await;
        }
        reader.abort();
        let _ = reader.await;

        Ok(verdict)
    }
}

/// Wait for a classified run to exit on its own, killing it once `grace` runs out.
async fn settle(child: &mut Child, grace: Option<Duration>) {
    let waited = match grace {
        Some(grace) => timeout(grace, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };
    match waited {
        Some(Ok(status)) => log::debug!("verifier exited with {status}"),
        Some(Err(err)) => log::warn!("failed to wait for verifier: {err}"),
        None => terminate(child).await,
    }
}

/// Kill and reap.
async fn terminate(child: &mut Child) {
    if let Err(err) = child.kill().await {
        log::warn!("failed to kill verifier: {err}");
    }
}
