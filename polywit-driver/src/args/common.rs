// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Define arguments that should be common to all subcommands.
use clap::ValueEnum;

/// Common arguments that we expect to be included in every subcommand.
#[derive(Debug, Default, clap::Args)]
pub struct CommonArgs {
    /// Produce full debug information
    #[arg(long, global = true)]
    pub debug: bool,
    /// Produces no output, just an exit code and requested artifacts; overrides --verbose
    #[arg(long, short, global = true)]
    pub quiet: bool,
    /// Output processing stages and commands, along with minor debug information
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Keep the temporary files generated for the replay
    #[arg(long, global = true)]
    pub keep_temps: bool,
    /// Format of the log messages enabled with `--debug` or `POLYWIT_LOG`
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl CommonArgs {
    /// `--debug` implies `--verbose`, and `--quiet` silences both.
    pub fn verbose(&self) -> bool {
        (self.verbose || self.debug) && !self.quiet
    }
}
