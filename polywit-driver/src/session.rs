// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module used to configure a driver session.

use crate::args::common::{CommonArgs, LogFormat};
use crate::util;
use anyhow::{Context, Result, bail};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Environment variable used to control this session log tracing.
const LOG_ENV_VAR: &str = "POLYWIT_LOG";

/// Contains information about the execution environment and arguments that affect operations
pub struct PolywitSession {
    /// The common command-line arguments
    pub args: CommonArgs,

    /// Keep the files listed in `temporaries` when the session ends
    pub keep_temps: bool,

    /// Files and directories to delete when the session ends
    pub temporaries: RefCell<Vec<PathBuf>>,

    /// Lazily created directory holding this session's temporary files
    work_dir: RefCell<Option<PathBuf>>,
}

impl PolywitSession {
    pub fn new(args: CommonArgs) -> Self {
        let keep_temps = args.keep_temps;
        PolywitSession {
            args,
            keep_temps,
            temporaries: RefCell::new(vec![]),
            work_dir: RefCell::new(None),
        }
    }

    /// The directory where this session writes its temporary files.
    pub fn work_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = self.work_dir.borrow().as_ref() {
            return Ok(dir.clone());
        }
        let dir = tempfile::Builder::new()
            .prefix("polywit-")
            .tempdir()
            .context("Failed to create a temporary directory")?
            .keep();
        debug!(?dir, "work_dir");
        self.temporaries.borrow_mut().push(dir.clone());
        *self.work_dir.borrow_mut() = Some(dir.clone());
        Ok(dir)
    }

    /// Run a command and capture its output, whatever its exit status.
    pub fn run_captured(&self, mut cmd: Command) -> Result<Output> {
        if self.args.verbose() {
            println!("[polywit] Running: `{}`", util::render_command(&cmd).to_string_lossy());
        }
        let program = cmd.get_program().to_string_lossy().into_owned();
        let output = cmd.output().with_context(|| format!("Failed to invoke `{program}`"))?;
        debug!(status = ?output.status, "run_captured");
        Ok(output)
    }
}

impl Drop for PolywitSession {
    fn drop(&mut self) {
        let temporaries = self.temporaries.get_mut();
        if self.keep_temps {
            if !self.args.quiet && !temporaries.is_empty() {
                for path in temporaries.iter() {
                    util::info_operation("Kept", &path.display().to_string());
                }
            }
            return;
        }
        for path in temporaries.drain(..) {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            // Ignore the error, as we don't want to fail the whole session over a leftover file.
            if let Err(error) = result {
                debug!(?path, %error, "remove_temporary");
            }
        }
    }
}

/// Resolve the replay executable to run: paths are used as given, bare names are looked up in
/// `PATH`.
pub fn resolve_executable(harness: &Path) -> Result<PathBuf> {
    if harness.components().count() > 1 || harness.is_absolute() {
        if !harness.is_file() {
            bail!("Replay harness `{}` does not exist", harness.display());
        }
        return Ok(harness.to_path_buf());
    }
    which::which(harness)
        .with_context(|| format!("Replay harness `{}` was not found in PATH", harness.display()))
}

/// Initialize the logger using the POLYWIT_LOG environment variable and the `--debug` flag.
pub fn init_logger(args: &CommonArgs) {
    let default_level = if args.debug { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = match args.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Human => builder.with_target(true).try_init(),
    };
    if let Err(error) = result {
        util::warning(&format!("Failed to initialize logging: {error}"));
    }
}
