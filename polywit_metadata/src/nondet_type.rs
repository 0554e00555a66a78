// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prefix shared by every accessor of the `Verifier` class, e.g. `nondetInt`.
pub const ACCESSOR_PREFIX: &str = "nondet";

/// The kinds of value a program under test may request from a replay trace.
///
/// The names follow the accessor that requests them: `Verifier.nondetShort()` requests a
/// [`NondetType::Short`].
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NondetType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl NondetType {
    /// Map an accessor name such as `nondetLong` to the type it requests.
    pub fn from_accessor(name: &str) -> Option<Self> {
        name.strip_prefix(ACCESSOR_PREFIX).and_then(|suffix| NondetType::from_str(suffix).ok())
    }

    /// The name of the accessor that requests this type, e.g. `nondetBoolean`.
    pub fn accessor_name(&self) -> String {
        let name = self.to_string();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{ACCESSOR_PREFIX}{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => ACCESSOR_PREFIX.to_string(),
        }
    }
}
