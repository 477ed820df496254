//! Opaque statement and plan digests.
//!
//! Digests are compared byte-for-byte and rendered as lowercase hex.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TopSqlError;

macro_rules! digest_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(Vec<u8>);

        impl $name {
            pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            pub fn from_hex(text: &str) -> Result<Self, TopSqlError> {
                hex::decode(text)
                    .map(Self)
                    .map_err(|err| TopSqlError::invalid_digest(format!("{text:?}: {err}")))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl From<&[u8]> for $name {
            fn from(bytes: &[u8]) -> Self {
                Self(bytes.to_vec())
            }
        }

        impl From<$name> for String {
            fn from(digest: $name) -> String {
                digest.to_hex()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TopSqlError;

            fn try_from(text: String) -> Result<Self, Self::Error> {
                Self::from_hex(&text)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

digest_type!(
    /// Digest of a normalized SQL statement.
    SqlDigest
);

digest_type!(
    /// Digest of a normalized execution plan.
    PlanDigest
);
