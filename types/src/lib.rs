//! Types exchanged with the raspadinha platform API.
//!
//! Every response body is wrapped in an [`api::Envelope`]. Field names on the
//! wire are camelCase; money is carried as [`Amount`] (integer centavos).

pub mod account;
pub mod admin;
pub mod amount;
pub mod api;
pub mod scratch;
pub mod wallet;

pub use amount::{Amount, AmountError};
pub use api::{AuthPayload, Envelope, LoginRequest, RegisterRequest, Role, UserProfile};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier assigned by the backend to users, cards, prizes and payments.
///
/// The backend mixes numeric and string ids across endpoints, so both are
/// accepted and kept as an opaque string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
                Ok(Id(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Id, E> {
                Ok(Id(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Id, E> {
                Ok(Id(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Id, E> {
                Ok(Id(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_accepts_numbers_and_strings() {
        let numeric: Id = serde_json::from_str("42").unwrap();
        let text: Id = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "abc-1");
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"42\"");
    }
}
