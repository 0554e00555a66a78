// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data shared between the replay library and the `polywit` driver.

extern crate clap;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub use nondet_type::{ACCESSOR_PREFIX, NondetType};

pub mod exit_codes;
mod nondet_type;

/// Environment variable naming the trace file a replay process should load.
pub const TRACE_ENV_VAR: &str = "POLYWIT_TRACE";

/// The structure of trace files: the concrete values chosen along one counterexample, in the
/// order the program requested them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayTrace {
    /// The verification tool that produced the witness this trace was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// One literal per nondeterministic call, in call order.
    pub tokens: Vec<String>,
}

impl ReplayTrace {
    pub fn new(producer: Option<String>, tokens: Vec<String>) -> Self {
        ReplayTrace { producer, tokens }
    }
}

/// A source location, identified the way witnesses identify them: the file stem
/// (`Main` for `src/Main.java`) and a 1-based line.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, PartialOrd, Ord)]
pub struct Position {
    pub file: String,
    pub line: u64,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u64) -> Self {
        Position { file: file.into(), line }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A value recorded by the verifier at some position of the program.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Assumption {
    pub position: Position,
    pub value: String,
}

/// The languages whose witnesses and benchmarks the driver understands.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "PascalCase", ascii_case_insensitive)]
pub enum SourceLanguage {
    #[default]
    Java,
    Kotlin,
}

impl SourceLanguage {
    /// Extension of the source files written in this language.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceLanguage::Java => "java",
            SourceLanguage::Kotlin => "kt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn check_trace_format() {
        let trace: ReplayTrace =
            serde_json::from_str(r#"{"producer":"JBMC","tokens":["true","5"]}"#).unwrap();
        assert_eq!(trace.producer.as_deref(), Some("JBMC"));
        assert_eq!(trace.tokens, vec!["true", "5"]);

        let trace: ReplayTrace = serde_json::from_str(r#"{"tokens":[]}"#).unwrap();
        assert_eq!(trace, ReplayTrace::default());
        assert_eq!(serde_json::to_string(&trace).unwrap(), r#"{"tokens":[]}"#);
    }

    #[test]
    fn check_source_language() {
        assert_eq!(SourceLanguage::from_str("Java").unwrap(), SourceLanguage::Java);
        assert_eq!(SourceLanguage::from_str("kotlin").unwrap(), SourceLanguage::Kotlin);
        assert!(SourceLanguage::from_str("C").is_err());
        assert_eq!(SourceLanguage::Kotlin.extension(), "kt");
        assert_eq!(Position::new("Main", 12).to_string(), "Main:12");
    }
}
