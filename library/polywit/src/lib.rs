// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replay of counterexamples found by verification tools.
//!
//! A verifier that explores a program by treating some inputs as free choices reports a
//! counterexample as the list of values it chose, in the order the program asked for them.
//! This crate feeds that list back to the program: every `nondet_*` call consumes the next
//! recorded value, and [`assume`] cuts the execution short when the program reaches a path the
//! verifier would have discarded.
//!
//! # Example:
//!
//! ```rust
//! use polywit::{ChoiceQueue, ReplayAbort, assume};
//!
//! let mut queue = ChoiceQueue::new(["true", "5", "10", "false"]);
//! assert!(queue.nondet_boolean().unwrap());
//! let x = queue.nondet_int().unwrap();
//! assume(x < 10).unwrap();
//! assert_eq!(queue.nondet_int(), Ok(10));
//! assert_eq!(assume(false), Err(ReplayAbort::AssumptionViolated));
//! ```

pub mod abort;
pub mod choice_queue;
pub mod nondet;
pub mod trace;
pub mod verifier;

pub use abort::ReplayAbort;
pub use choice_queue::ChoiceQueue;
pub use nondet::Nondet;
pub use polywit_metadata::{NondetType, ReplayTrace, exit_codes};

use tracing::debug;

/// Creates an assumption that must hold for the rest of the replay. If it does not, the replay
/// was following a path the verifier considers infeasible and has to stop.
///
/// ```rust
/// let mut queue = polywit::ChoiceQueue::new(["12"]);
/// let i = queue.nondet_int().unwrap();
/// polywit::assume(i > 10).unwrap();
/// ```
pub fn assume(condition: bool) -> Result<(), ReplayAbort> {
    if condition { Ok(()) } else { Err(ReplayAbort::AssumptionViolated) }
}

/// Run `harness` against the recorded `tokens`.
///
/// Returns the queue with the tokens the harness left unconsumed, or the signal that cut the
/// replay short. Nothing is terminated here, see [`ReplayAbort::terminate`].
pub fn replay<I, S, F>(tokens: I, harness: F) -> Result<ChoiceQueue, ReplayAbort>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce(&mut ChoiceQueue) -> Result<(), ReplayAbort>,
{
    let mut queue = ChoiceQueue::new(tokens);
    debug!(tokens = queue.len(), "replay");
    harness(&mut queue)?;
    if !queue.is_empty() {
        debug!(remaining = queue.len(), "replay_unconsumed");
    }
    Ok(queue)
}

/// Entry point of replay executables.
///
/// Loads the trace named by `POLYWIT_TRACE` and replays `harness` against it. The process ends
/// with the matching exit status if the trace cannot be loaded or the replay is aborted;
/// otherwise this returns normally.
pub fn replay_from_env<F>(harness: F)
where
    F: FnOnce(&mut ChoiceQueue) -> Result<(), ReplayAbort>,
{
    let trace = match trace::from_env() {
        Ok(trace) => trace,
        Err(err) => {
            eprintln!("polywit: {err}");
            std::process::exit(exit_codes::TRACE_UNAVAILABLE)
        }
    };
    if let Err(abort) = replay(trace.tokens, harness) {
        abort.terminate()
    }
}
