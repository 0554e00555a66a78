// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use polywit_metadata::ReplayTrace;
use tracing::debug;

use crate::args::{PolywitArgs, PolywitSubcommand, check_is_valid};
use crate::config::{PolywitConfig, flag};
use crate::harness_runner::{HarnessResult, HarnessRunner};
use crate::session::PolywitSession;
use crate::validator::Validator;

mod args;
mod assumptions;
mod benchmark;
mod config;
mod harness_runner;
mod session;
mod util;
mod validator;
mod witness;

/// The main function for the `polywit` driver.
/// The driver exits successfully whenever a verdict was reached, whatever the verdict.
fn main() -> ExitCode {
    let args = PolywitArgs::parse();
    check_is_valid(&args);
    session::init_logger(&args.common_opts);

    if let Err(error) = run(args) {
        debug!(?error, "main_failure");
        util::error(&format!("{error:#}"));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(args: PolywitArgs) -> Result<()> {
    let mut session = PolywitSession::new(args.common_opts);
    match args.command {
        PolywitSubcommand::Extract(extract) => {
            let config =
                PolywitConfig::load(extract.input.config.as_deref(), &extract.input.benchmark)?;
            session.keep_temps = flag(session.keep_temps, config.keep_temps);
            let mut validator = Validator::new(&session, &extract.input, config);
            if extract.output.is_none() {
                validator = validator.reserve_stdout();
            }
            let extraction = validator.extract()?;
            Validator::write_trace(&extraction.trace, extract.output.as_deref())
        }
        PolywitSubcommand::Validate(validate) => {
            let config =
                PolywitConfig::load(validate.input.config.as_deref(), &validate.input.benchmark)?;
            session.keep_temps = flag(session.keep_temps, config.keep_temps);
            let result = Validator::new(&session, &validate.input, config)
                .validate(validate.harness.as_deref(), &validate.harness_args)?;
            print_result(&session, &result);
            Ok(())
        }
        PolywitSubcommand::Replay(replay) => {
            let content = std::fs::read_to_string(&replay.trace)
                .with_context(|| format!("Failed to read trace `{}`", replay.trace.display()))?;
            let trace: ReplayTrace = serde_json::from_str(&content)
                .with_context(|| format!("`{}` is not a valid trace", replay.trace.display()))?;
            debug!(n = trace.tokens.len(), producer = ?trace.producer, "replay");
            let runner = HarnessRunner::new(&session, &replay.harness, &replay.harness_args)?;
            let result = runner.run_trace_file(&replay.trace)?;
            print_result(&session, &result);
            Ok(())
        }
    }
}

/// Print the verdict, with the replay output and the reason when asked for more details.
fn print_result(session: &PolywitSession, result: &HarnessResult) {
    if session.args.verbose() {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
    }
    println!("polywit: {}", result.verdict.styled());
    let unknown = result.verdict == harness_runner::Verdict::Unknown;
    if (session.args.verbose() || unknown) && !session.args.quiet {
        println!("  reason: {}", result.reason);
    }
}
