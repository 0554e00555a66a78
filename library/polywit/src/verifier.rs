// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Free-function accessors for instrumented programs.
//!
//! Programs translated from verification benchmarks call `Verifier.nondetInt()` wherever they
//! want a value and cannot thread a queue through every call. This module keeps the queue of
//! the running replay and ends the process as soon as a replay cannot continue.

use crate::abort::ReplayAbort;
use crate::choice_queue::ChoiceQueue;
use crate::nondet::Nondet;
use std::cell::RefCell;
use tracing::debug;

thread_local! {
    /// thread_local! gives every thread its own replay, so replays in parallel unit tests do
    /// not interfere with each other.
    static CHOICES: RefCell<Option<ChoiceQueue>> = const { RefCell::new(None) };
}

/// Install `queue` as the replay of this thread, returning the replay it replaces.
pub fn install(queue: ChoiceQueue) -> Option<ChoiceQueue> {
    CHOICES.with(|choices| choices.borrow_mut().replace(queue))
}

/// Remove the replay of this thread.
pub fn uninstall() -> Option<ChoiceQueue> {
    CHOICES.with(|choices| choices.borrow_mut().take())
}

/// Puts back the replay that `with_trace` displaced, even when the program unwinds.
struct Restore {
    previous: Option<ChoiceQueue>,
}

impl Drop for Restore {
    fn drop(&mut self) {
        let displaced = match self.previous.take() {
            Some(previous) => install(previous),
            None => uninstall(),
        };
        if let Some(queue) = displaced {
            debug!(remaining = queue.len(), "with_trace_unwound");
        }
    }
}

/// Replay `tokens` while running `program`. Returns what the program returns together with the
/// tokens it did not consume.
pub fn with_trace<I, S, F, R>(tokens: I, program: F) -> (R, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce() -> R,
{
    let restore = Restore { previous: install(ChoiceQueue::new(tokens)) };
    let result = program();
    let remaining = uninstall().map(ChoiceQueue::into_remaining).unwrap_or_default();
    drop(restore);
    if !remaining.is_empty() {
        debug!(remaining = remaining.len(), "with_trace");
    }
    (result, remaining)
}

/// Consume the next value of this thread's replay. A thread without a replay behaves like one
/// whose trace is empty.
pub fn nondet<T: Nondet>() -> T {
    let next = CHOICES.with(|choices| match choices.borrow_mut().as_mut() {
        Some(queue) => queue.nondet::<T>(),
        None => Err(ReplayAbort::ExhaustedTrace { requested: 1, available: 0 }),
    });
    next.unwrap_or_else(|abort| abort.terminate())
}

/// Ends the process if `condition` does not hold.
pub fn assume(condition: bool) {
    if let Err(abort) = crate::assume(condition) {
        abort.terminate()
    }
}

pub fn nondet_boolean() -> bool {
    nondet()
}

pub fn nondet_byte() -> i8 {
    nondet()
}

pub fn nondet_char() -> char {
    nondet()
}

pub fn nondet_short() -> i16 {
    nondet()
}

pub fn nondet_int() -> i32 {
    nondet()
}

pub fn nondet_long() -> i64 {
    nondet()
}

pub fn nondet_float() -> f32 {
    nondet()
}

pub fn nondet_double() -> f64 {
    nondet()
}

pub fn nondet_string() -> String {
    nondet()
}
