// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The replay state: the recorded choices that have not been consumed yet.

use crate::abort::ReplayAbort;
use crate::nondet::Nondet;
use std::collections::VecDeque;
use tracing::trace;

/// An ordered queue of the textual values chosen along one counterexample.
///
/// Tokens are consumed strictly from the front, one per accessor call, so the Nth call returns
/// the Nth recorded value whatever types were requested in between. Tokens stay unparsed until
/// they are consumed, and a consumed token can never be read again.
#[derive(Debug, Clone, Default)]
pub struct ChoiceQueue {
    tokens: VecDeque<String>,
    /// Length of the trace this queue was created from.
    total: usize,
}

impl ChoiceQueue {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: VecDeque<String> = tokens.into_iter().map(Into::into).collect();
        let total = tokens.len();
        ChoiceQueue { tokens, total }
    }

    /// Number of tokens left.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.total - self.tokens.len()
    }

    /// Remove and return the front token.
    pub fn dequeue(&mut self) -> Result<String, ReplayAbort> {
        match self.tokens.pop_front() {
            Some(token) => {
                trace!(position = self.consumed(), %token, "dequeue");
                Ok(token)
            }
            None => Err(ReplayAbort::ExhaustedTrace { requested: self.total + 1, available: self.total }),
        }
    }

    /// Consume the next token and parse it as a `T`.
    pub fn nondet<T: Nondet>(&mut self) -> Result<T, ReplayAbort> {
        let token = self.dequeue()?;
        T::parse_token(&token).ok_or_else(|| ReplayAbort::MalformedToken {
            position: self.consumed(),
            token,
            expected: T::KIND,
        })
    }

    pub fn nondet_boolean(&mut self) -> Result<bool, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_byte(&mut self) -> Result<i8, ReplayAbort> {
        self.nondet()
    }

    /// The token is the numeric code point of the character.
    pub fn nondet_char(&mut self) -> Result<char, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_short(&mut self) -> Result<i16, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_int(&mut self) -> Result<i32, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_long(&mut self) -> Result<i64, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_float(&mut self) -> Result<f32, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_double(&mut self) -> Result<f64, ReplayAbort> {
        self.nondet()
    }

    pub fn nondet_string(&mut self) -> Result<String, ReplayAbort> {
        self.nondet()
    }

    /// The tokens that were never consumed, in order.
    pub fn into_remaining(self) -> Vec<String> {
        self.tokens.into()
    }
}
