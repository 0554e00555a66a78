// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This module introduces the Nondet trait as well as its implementation for the value types
//! a program under test can request from a trace.

use polywit_metadata::NondetType;

/// A type whose values can be read back from the textual form recorded in a trace.
///
/// Parsing is strict: a token that does not denote a value of the type, including a number that
/// is out of range for it, yields `None` rather than a truncated or default value.
pub trait Nondet: Sized {
    /// The kind reported when a token fails to parse.
    const KIND: NondetType;

    fn parse_token(token: &str) -> Option<Self>;
}

/// Integers are decimal literals with an optional sign.
macro_rules! integer_nondet {
    ( $type: ty, $kind: expr ) => {
        impl Nondet for $type {
            const KIND: NondetType = $kind;

            fn parse_token(token: &str) -> Option<Self> {
                token.parse::<$type>().ok()
            }
        }
    };
}

integer_nondet!(i8, NondetType::Byte);
integer_nondet!(i16, NondetType::Short);
integer_nondet!(i32, NondetType::Int);
integer_nondet!(i64, NondetType::Long);

/// Floating points accept `NaN` and `Infinity` in any case, and a single trailing `f`/`d` type
/// suffix as written in Java literals. A finite literal beyond the range of the type is rejected
/// rather than rounded to an infinity, and so is Rust's `inf` shorthand.
macro_rules! float_nondet {
    ( $type: ty, $kind: expr ) => {
        impl Nondet for $type {
            const KIND: NondetType = $kind;

            fn parse_token(token: &str) -> Option<Self> {
                let literal = match token.strip_suffix(['f', 'F', 'd', 'D']) {
                    Some(digits) if digits.ends_with(|c: char| c.is_ascii_digit() || c == '.') => {
                        digits
                    }
                    _ => token,
                };
                let value = literal.parse::<$type>().ok()?;
                if value.is_infinite() && !spells_infinity(literal) {
                    return None;
                }
                Some(value)
            }
        }
    };
}

fn spells_infinity(literal: &str) -> bool {
    literal.strip_prefix(['+', '-']).unwrap_or(literal).eq_ignore_ascii_case("infinity")
}

float_nondet!(f32, NondetType::Float);
float_nondet!(f64, NondetType::Double);

impl Nondet for bool {
    const KIND: NondetType = NondetType::Boolean;

    fn parse_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("true") {
            Some(true)
        } else if token.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

/// Characters are recorded as their numeric code point. Only Unicode scalar values are valid.
impl Nondet for char {
    const KIND: NondetType = NondetType::Char;

    fn parse_token(token: &str) -> Option<Self> {
        token.parse::<u32>().ok().and_then(char::from_u32)
    }
}

/// Strings are the token itself.
impl Nondet for String {
    const KIND: NondetType = NondetType::String;

    fn parse_token(token: &str) -> Option<Self> {
        Some(token.to_string())
    }
}
