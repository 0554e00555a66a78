// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{Context, Result};
use polywit_metadata::exit_codes::*;
use polywit_metadata::{ReplayTrace, TRACE_ENV_VAR};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::debug;

use crate::session::{PolywitSession, resolve_executable};

/// Name of the trace file written to the session directory.
const TRACE_FILE_NAME: &str = "trace.json";

/// What the replay says about the witness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Verdict {
    /// The replay reached the violation.
    #[strum(serialize = "Witness correct")]
    Correct,
    /// The replay ran to completion, or left the path of the witness, without a violation.
    #[strum(serialize = "Witness spurious")]
    Spurious,
    /// The replay did not tell either way.
    #[strum(serialize = "Witness could not be validated")]
    Unknown,
}

impl Verdict {
    /// The verdict styled for the terminal.
    pub fn styled(&self) -> console::StyledObject<String> {
        let style = console::style(self.to_string()).bold();
        match self {
            Verdict::Correct => style.green(),
            Verdict::Spurious => style.red(),
            Verdict::Unknown => style.yellow(),
        }
    }
}

/// Classify the exit code of a replay process (`None` when it was killed by a signal), with the
/// reason for the verdict.
pub fn classify(code: Option<i32>) -> (Verdict, String) {
    match code {
        Some(PANIC) => (Verdict::Correct, "the replay reached a failing assertion".into()),
        Some(SUCCESS) => (Verdict::Spurious, "the replay completed without a violation".into()),
        Some(ASSUMPTION_VIOLATED) => {
            (Verdict::Spurious, "the replay violated an assumption".into())
        }
        Some(EXHAUSTED_TRACE) => {
            (Verdict::Unknown, "the program requested more values than the trace holds".into())
        }
        Some(MALFORMED_TOKEN) => {
            (Verdict::Unknown, "a trace value does not parse as the requested type".into())
        }
        Some(TRACE_UNAVAILABLE) => (Verdict::Unknown, "the replay could not load the trace".into()),
        Some(code) => (Verdict::Unknown, format!("the replay exited with unexpected code {code}")),
        None => (Verdict::Unknown, "the replay was terminated by a signal".into()),
    }
}

/// The outcome of one replay.
#[derive(Debug)]
pub struct HarnessResult {
    pub verdict: Verdict,
    pub reason: String,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a replay executable against traces. The executable is built from the benchmark with the
/// `polywit` library, which loads the trace named by `POLYWIT_TRACE`.
pub struct HarnessRunner<'sess> {
    /// The underlying session
    pub sess: &'sess PolywitSession,
    /// The replay executable
    pub harness: PathBuf,
    /// Extra arguments of the replay executable
    pub args: &'sess [String],
}

impl<'sess> HarnessRunner<'sess> {
    pub fn new(sess: &'sess PolywitSession, harness: &Path, args: &'sess [String]) -> Result<Self> {
        let harness = resolve_executable(harness)?;
        debug!(?harness, "harness_runner");
        Ok(HarnessRunner { sess, harness, args })
    }

    /// Write `trace` to the session directory and replay it.
    pub fn run(&self, trace: &ReplayTrace) -> Result<HarnessResult> {
        let path = self.sess.work_dir()?.join(TRACE_FILE_NAME);
        let json = serde_json::to_string_pretty(trace)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write trace `{}`", path.display()))?;
        self.run_trace_file(&path)
    }

    /// Replay an existing trace file.
    pub fn run_trace_file(&self, trace: &Path) -> Result<HarnessResult> {
        let mut cmd = Command::new(&self.harness);
        cmd.args(self.args).env(TRACE_ENV_VAR, trace);
        let output = self.sess.run_captured(cmd)?;
        let (verdict, reason) = classify(output.status.code());
        let reason = match signal(&output.status) {
            Some(signal) => format!("{reason} ({signal})"),
            None => reason,
        };
        debug!(%verdict, %reason, "replay_result");
        Ok(HarnessResult {
            verdict,
            reason,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(unix)]
fn signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| format!("signal {signal}"))
}

#[cfg(not(unix))]
fn signal(_status: &ExitStatus) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::common::CommonArgs;

    #[test]
    fn check_classify() {
        assert_eq!(classify(Some(101)).0, Verdict::Correct);
        assert_eq!(classify(Some(0)).0, Verdict::Spurious);
        assert_eq!(classify(Some(3)).0, Verdict::Spurious);
        assert_eq!(classify(Some(4)).0, Verdict::Unknown);
        assert_eq!(classify(Some(5)).0, Verdict::Unknown);
        assert_eq!(classify(Some(6)).0, Verdict::Unknown);
        assert_eq!(classify(Some(1)).0, Verdict::Unknown);
        assert!(classify(Some(42)).1.contains("42"));
        assert_eq!(classify(None).0, Verdict::Unknown);
    }

    #[test]
    fn check_verdict_names() {
        assert_eq!(Verdict::Correct.to_string(), "Witness correct");
        assert_eq!(Verdict::Spurious.to_string(), "Witness spurious");
        assert_eq!(Verdict::Unknown.to_string(), "Witness could not be validated");
    }

    #[cfg(unix)]
    #[test]
    fn check_run_sets_trace() {
        let session = PolywitSession::new(CommonArgs { quiet: true, ..CommonArgs::default() });
        let args = vec![
            "-c".to_string(),
            r#"grep -q '"7"' "$POLYWIT_TRACE" && exit 101; exit 3"#.to_string(),
        ];
        let runner = HarnessRunner::new(&session, Path::new("sh"), &args).unwrap();

        let result = runner.run(&ReplayTrace::new(None, vec!["7".into()])).unwrap();
        assert_eq!(result.verdict, Verdict::Correct);

        let result = runner.run(&ReplayTrace::new(None, vec!["8".into()])).unwrap();
        assert_eq!(result.verdict, Verdict::Spurious);
        assert_eq!(result.status.code(), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn check_signal_is_unknown() {
        let session = PolywitSession::new(CommonArgs { quiet: true, ..CommonArgs::default() });
        let args = vec!["-c".to_string(), "kill -9 $$".to_string()];
        let runner = HarnessRunner::new(&session, Path::new("sh"), &args).unwrap();
        let result = runner.run(&ReplayTrace::default()).unwrap();
        assert_eq!(result.verdict, Verdict::Unknown);
        assert!(result.reason.contains("signal 9"));
    }
}
