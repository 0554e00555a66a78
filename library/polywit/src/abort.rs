// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ways a replay can be cut short.

use polywit_metadata::{NondetType, exit_codes};
use tracing::debug;

/// Signal that a replay cannot continue.
///
/// None of these are recoverable: continuing past any of them would produce an execution that no
/// longer corresponds to the recorded trace. Accessors return them so that the caller can pass
/// them up to the replay boundary, which ends the process with [`ReplayAbort::exit_code`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayAbort {
    /// The program requested more values than the trace holds.
    #[error(
        "replay trace exhausted: value #{requested} was requested but the trace only holds {available}"
    )]
    ExhaustedTrace { requested: usize, available: usize },
    /// A token does not parse as the requested type.
    #[error("malformed token: value #{position} `{token}` is not a valid {expected}")]
    MalformedToken { position: usize, token: String, expected: NondetType },
    /// `assume` received `false`; the path being replayed is infeasible.
    #[error("assumption violated")]
    AssumptionViolated,
}

impl ReplayAbort {
    /// The status the replay process exits with.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplayAbort::ExhaustedTrace { .. } => exit_codes::EXHAUSTED_TRACE,
            ReplayAbort::MalformedToken { .. } => exit_codes::MALFORMED_TOKEN,
            ReplayAbort::AssumptionViolated => exit_codes::ASSUMPTION_VIOLATED,
        }
    }

    /// End the process immediately.
    ///
    /// The process exits without unwinding, so no destructor or panic hook of the program under
    /// test observes the abort. Trace mismatches are reported on stderr; a violated assumption
    /// is an ordinary outcome and exits silently.
    pub fn terminate(self) -> ! {
        debug!(abort = %self, "replay_abort");
        if self != ReplayAbort::AssumptionViolated {
            eprintln!("polywit: {self}");
        }
        std::process::exit(self.exit_code())
    }
}
