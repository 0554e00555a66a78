// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exit statuses of a replay process.
//!
//! These are the only channel through which a replay reports how it ended, so the replay
//! library and the driver that classifies replays must agree on them.

/// The replay ran to completion without violating any assertion.
pub const SUCCESS: i32 = 0;
/// A call to `assume` received `false`. The replayed path is infeasible.
pub const ASSUMPTION_VIOLATED: i32 = 3;
/// The program requested more nondeterministic values than the trace holds.
pub const EXHAUSTED_TRACE: i32 = 4;
/// A trace token could not be parsed as the type the program requested.
pub const MALFORMED_TOKEN: i32 = 5;
/// The replay could not load its trace file.
pub const TRACE_UNAVAILABLE: i32 = 6;
/// Exit status of a Rust process whose main thread panicked, e.g. on a failed `assert!`.
pub const PANIC: i32 = 101;
