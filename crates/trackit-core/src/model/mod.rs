//! Entity model: users, tickets, and milestones.
//!
//! All enums follow one convention: `SCREAMING_SNAKE_CASE` on the wire,
//! case-insensitive [`FromStr`](std::str::FromStr), and a `Display` that
//! round-trips through it.

use std::fmt;

pub mod milestone;
pub mod score;
pub mod ticket;
pub mod user;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// Implements `as_str`, `Display`, and `FromStr` for a fieldless enum from a
/// single table of `Variant => "WIRE_NAME"` pairs.
macro_rules! wire_enum {
    ($ty:ident, $expected:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::model::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match $crate::model::normalize(s).as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err($crate::model::ParseEnumError {
                        expected: $expected,
                        got: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use wire_enum;
