// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Module that define polywit's command line interface. This includes all subcommands.

pub mod common;

use self::common::*;
use clap::error::{Error, ErrorKind};
use polywit_metadata::SourceLanguage;
use std::path::{Path, PathBuf};

/// Trait used to perform extra validation after parsing.
pub trait ValidateArgs {
    /// Perform post-parsing validation but do not abort.
    fn validate(&self) -> Result<(), Error>;
}

/// Validate a set of arguments and ensure they are in a valid state.
/// This method will abort execution with a user friendly error message if the state is invalid.
pub fn check_is_valid<T>(command: &T)
where
    T: clap::Parser + ValidateArgs,
{
    if let Err(e) = command.validate() {
        e.format(&mut T::command()).exit()
    }
}

#[derive(Debug, clap::Parser)]
#[command(
    version,
    name = "polywit",
    about = "Validate a violation witness by replaying its counterexample. The witness must conform to the SV-COMP exchange format.",
    args_override_self = true
)]
pub struct PolywitArgs {
    #[command(flatten)]
    pub common_opts: CommonArgs,

    #[command(subcommand)]
    pub command: PolywitSubcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum PolywitSubcommand {
    /// Extract the replay trace of a witness without running anything.
    Extract(Box<ExtractArgs>),
    /// Extract the replay trace of a witness and run a replay harness against it.
    Validate(Box<ValidateWitnessArgs>),
    /// Run a replay harness against an existing trace file.
    Replay(Box<ReplayArgs>),
}

/// The inputs needed to turn a witness into a replay trace.
#[derive(Debug, clap::Args)]
pub struct WitnessInput {
    /// Path to the benchmark directory
    pub benchmark: PathBuf,

    /// Path to the witness file. Must conform to the exchange format
    #[arg(long)]
    pub witness: PathBuf,

    /// Path to the packages used by the benchmark
    #[arg(long = "packages", num_args(1..))]
    pub package_paths: Vec<PathBuf>,

    /// Language of the benchmark. Defaults to the `sourcecodelang` of the witness.
    #[arg(long, value_enum, ignore_case = true)]
    pub language: Option<SourceLanguage>,

    /// Configuration file. Defaults to `polywit.toml` in the benchmark directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print a table of the assumptions used for the replay
    #[arg(long)]
    pub show_assumptions: bool,
}

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: WitnessInput,

    /// Write the trace to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ValidateWitnessArgs {
    #[command(flatten)]
    pub input: WitnessInput,

    /// Replay executable built from the benchmark. Defaults to `harness` in the configuration file.
    #[arg(long)]
    pub harness: Option<PathBuf>,

    /// Arguments passed to the replay executable
    #[arg(last = true)]
    pub harness_args: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct ReplayArgs {
    /// Trace file produced by `polywit extract`
    #[arg(long)]
    pub trace: PathBuf,

    /// Replay executable to run
    #[arg(long)]
    pub harness: PathBuf,

    /// Arguments passed to the replay executable
    #[arg(last = true)]
    pub harness_args: Vec<String>,
}

fn value_error(msg: String) -> Error {
    Error::raw(ErrorKind::ValueValidation, msg)
}

fn check_dir(path: &Path, what: &str) -> Result<(), Error> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(value_error(format!("{what} `{}` is not a valid directory.", path.display())))
    }
}

fn check_file(path: &Path, what: &str) -> Result<(), Error> {
    if path.is_file() {
        Ok(())
    } else {
        Err(value_error(format!("{what} `{}` is not a readable file.", path.display())))
    }
}

impl ValidateArgs for WitnessInput {
    fn validate(&self) -> Result<(), Error> {
        check_dir(&self.benchmark, "Benchmark")?;
        for package in &self.package_paths {
            check_dir(package, "Package")?;
        }
        check_file(&self.witness, "Witness")?;
        if let Some(config) = &self.config {
            check_file(config, "Configuration")?;
        }
        Ok(())
    }
}

impl ValidateArgs for ExtractArgs {
    fn validate(&self) -> Result<(), Error> {
        self.input.validate()
    }
}

impl ValidateArgs for ValidateWitnessArgs {
    fn validate(&self) -> Result<(), Error> {
        self.input.validate()
    }
}

impl ValidateArgs for ReplayArgs {
    fn validate(&self) -> Result<(), Error> {
        check_file(&self.trace, "Trace")
    }
}

impl ValidateArgs for PolywitArgs {
    fn validate(&self) -> Result<(), Error> {
        if self.common_opts.quiet && self.show_assumptions() {
            return Err(Error::raw(
                ErrorKind::ArgumentConflict,
                "The `--show-assumptions` option cannot be used with `--quiet`.",
            ));
        }
        match &self.command {
            PolywitSubcommand::Extract(args) => args.validate(),
            PolywitSubcommand::Validate(args) => args.validate(),
            PolywitSubcommand::Replay(args) => args.validate(),
        }
    }
}

impl PolywitArgs {
    fn show_assumptions(&self) -> bool {
        match &self.command {
            PolywitSubcommand::Extract(args) => args.input.show_assumptions,
            PolywitSubcommand::Validate(args) => args.input.show_assumptions,
            PolywitSubcommand::Replay(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<PolywitArgs, Error> {
        PolywitArgs::try_parse_from(std::iter::once("polywit").chain(args.iter().copied()))
    }

    #[test]
    fn check_validate_parsing() {
        let args = parse(&[
            "validate",
            "bench",
            "--witness",
            "witness.graphml",
            "--packages",
            "lib1",
            "lib2",
            "--language",
            "kotlin",
            "--harness",
            "target/replay",
            "--",
            "--flag",
        ])
        .unwrap();
        let PolywitSubcommand::Validate(validate) = args.command else {
            panic!("expected the validate subcommand")
        };
        assert_eq!(validate.input.benchmark, PathBuf::from("bench"));
        assert_eq!(validate.input.package_paths, vec![PathBuf::from("lib1"), PathBuf::from("lib2")]);
        assert_eq!(validate.input.language, Some(SourceLanguage::Kotlin));
        assert_eq!(validate.harness, Some(PathBuf::from("target/replay")));
        assert_eq!(validate.harness_args, vec!["--flag".to_string()]);
    }

    #[test]
    fn check_common_flags_after_subcommand() {
        let args = parse(&["replay", "--trace", "t.json", "--harness", "h", "--debug"]).unwrap();
        assert!(args.common_opts.debug);
        assert!(args.common_opts.verbose());
        assert_eq!(args.common_opts.log_format, LogFormat::Human);
    }

    #[test]
    fn check_witness_is_required() {
        assert!(parse(&["extract", "bench"]).is_err());
    }

    #[test]
    fn check_invalid_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let witness = dir.path().join("witness.graphml");
        std::fs::write(&witness, "").unwrap();
        let bench = dir.path().to_str().unwrap();
        let witness = witness.to_str().unwrap();

        let args = parse(&["extract", bench, "--witness", witness]).unwrap();
        assert!(args.validate().is_ok());

        let args = parse(&["extract", bench, "--witness", bench]).unwrap();
        assert!(args.validate().is_err());

        let args = parse(&["extract", witness, "--witness", witness]).unwrap();
        assert!(args.validate().is_err());

        let args = parse(&["extract", bench, "--witness", witness, "--show-assumptions", "-q"]).unwrap();
        assert_eq!(args.validate().unwrap_err().kind(), ErrorKind::ArgumentConflict);
    }
}
