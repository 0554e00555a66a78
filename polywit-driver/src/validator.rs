// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The validation pipeline: witness in, replay trace out, verdict from the replay.

use anyhow::{Context, Result};
use polywit_metadata::{Assumption, ReplayTrace, SourceLanguage};
use tracing::debug;

use crate::args::WitnessInput;
use crate::assumptions::{assumptions_table, filter_assumptions, tokens};
use crate::benchmark::{PositionTypeMap, extract_position_type_map};
use crate::config::{PolywitConfig, flag};
use crate::harness_runner::{HarnessResult, HarnessRunner};
use crate::session::PolywitSession;
use crate::util;
use crate::witness::Witness;

/// The stages of a validation, named in the errors they raise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ValidationPhase {
    #[strum(serialize = "witness preprocessing")]
    WitnessPreprocessing,
    #[strum(serialize = "assumption extraction")]
    AssumptionExtraction,
    #[strum(serialize = "benchmark scanning")]
    BenchmarkScanning,
    #[strum(serialize = "trace construction")]
    TraceConstruction,
    #[strum(serialize = "harness execution")]
    HarnessExecution,
}

impl ValidationPhase {
    fn context(self) -> String {
        format!("polywit has encountered an issue during {self}")
    }
}

/// The trace of a witness, with what it was built from.
#[derive(Debug)]
pub struct Extraction {
    pub language: SourceLanguage,
    pub map: PositionTypeMap,
    /// The assumptions recorded at nondeterministic calls, in witness order.
    pub assumptions: Vec<Assumption>,
    pub trace: ReplayTrace,
}

pub struct Validator<'sess> {
    sess: &'sess PolywitSession,
    input: &'sess WitnessInput,
    config: PolywitConfig,
    /// Stdout carries the trace, so nothing else may be printed there.
    stdout_reserved: bool,
}

/// Where the assumptions table goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TableOutput {
    Stdout,
    Stderr,
}

impl<'sess> Validator<'sess> {
    pub fn new(sess: &'sess PolywitSession, input: &'sess WitnessInput, config: PolywitConfig) -> Self {
        Validator { sess, input, config, stdout_reserved: false }
    }

    /// Keep stdout free for a trace written there: stage messages are dropped and the
    /// assumptions table goes to stderr.
    pub fn reserve_stdout(mut self) -> Self {
        self.stdout_reserved = true;
        self
    }

    fn stage(&self, op: &str, msg: &str) {
        if !self.sess.args.quiet && !self.stdout_reserved {
            util::info_operation(op, msg);
        }
    }

    /// `--quiet` wins over `show-assumptions` in the configuration. The command line cannot
    /// combine both.
    fn table_output(&self) -> Option<TableOutput> {
        if self.sess.args.quiet
            || !flag(self.input.show_assumptions, self.config.show_assumptions)
        {
            None
        } else if self.stdout_reserved {
            Some(TableOutput::Stderr)
        } else {
            Some(TableOutput::Stdout)
        }
    }

    /// The command line wins over the configuration, which wins over the witness.
    fn language(&self, witness: &Witness) -> Result<SourceLanguage> {
        if let Some(language) = self.input.language.or(self.config.language) {
            return Ok(language);
        }
        Ok(witness.language()?.unwrap_or_default())
    }

    /// Build the replay trace of the witness.
    pub fn extract(&self) -> Result<Extraction> {
        self.stage("Processing", &format!("witness `{}`", self.input.witness.display()));
        let witness = Witness::read(&self.input.witness)
            .and_then(|witness| witness.check().map(|_| witness))
            .with_context(|| ValidationPhase::WitnessPreprocessing.context())?;

        let language = self.language(&witness)?;
        debug!(%language, producer = ?witness.producer(), "extract");
        let assumptions = witness
            .extract_assumptions(language)
            .with_context(|| ValidationPhase::AssumptionExtraction.context())?;

        self.stage("Scanning", &format!("benchmark `{}`", self.input.benchmark.display()));
        let map =
            extract_position_type_map(&self.input.benchmark, &self.input.package_paths, language)
                .with_context(|| ValidationPhase::BenchmarkScanning.context())?;

        let assumptions = filter_assumptions(&map, assumptions);
        let trace = ReplayTrace::new(witness.producer().map(str::to_string), tokens(&assumptions));
        self.stage("Extracted", &format!("{} nondeterministic value(s)", trace.tokens.len()));
        match self.table_output() {
            Some(TableOutput::Stdout) => println!("{}", assumptions_table(&map, &assumptions)),
            Some(TableOutput::Stderr) => eprintln!("{}", assumptions_table(&map, &assumptions)),
            None => {}
        }
        Ok(Extraction { language, map, assumptions, trace })
    }

    /// Write the trace where it was asked for, or to stdout.
    pub fn write_trace(trace: &ReplayTrace, output: Option<&std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(trace)
            .with_context(|| ValidationPhase::TraceConstruction.context())?;
        match output {
            Some(path) => std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write trace `{}`", path.display()))
                .with_context(|| ValidationPhase::TraceConstruction.context()),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }

    /// Extract the trace and replay it with the harness given on the command line or in the
    /// configuration.
    pub fn validate(
        &self,
        harness: Option<&std::path::Path>,
        harness_args: &[String],
    ) -> Result<HarnessResult> {
        let extraction = self.extract()?;
        let Some(harness) = harness.or(self.config.harness.as_deref()) else {
            anyhow::bail!(
                "No replay harness given. Use `--harness` or set `harness` in the configuration."
            );
        };
        let args: &[String] = if harness_args.is_empty() {
            self.config.harness_args.as_deref().unwrap_or_default()
        } else {
            harness_args
        };
        self.stage("Running", &format!("replay harness `{}`", harness.display()));
        HarnessRunner::new(self.sess, harness, args)
            .and_then(|runner| runner.run(&extraction.trace))
            .with_context(|| ValidationPhase::HarnessExecution.context())
    }
}
