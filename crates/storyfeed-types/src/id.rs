use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Number of raw bytes in a [`RecordId`].
pub const RECORD_ID_LEN: usize = 12;

/// Number of hex characters in the textual form of a [`RecordId`].
pub const RECORD_ID_HEX_LEN: usize = RECORD_ID_LEN * 2;

/// Opaque, globally unique document identifier.
///
/// Layout follows the usual document-store object id: 4 bytes of big-endian
/// Unix seconds followed by 8 random bytes. Ids generated later sort after
/// ids generated earlier (to one-second resolution), which keeps store dumps
/// readable but is not relied upon for correctness.
///
/// The textual form is always 24 lowercase hex characters. Serde uses the
/// textual form so ids travel through JSON as plain strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; RECORD_ID_LEN]);

impl RecordId {
    /// Generate a fresh identifier from the current time and random bytes.
    pub fn generate() -> Self {
        let secs = chrono::Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let mut bytes = [0u8; RECORD_ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes[4..]);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub fn from_raw(bytes: [u8; RECORD_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 12 bytes.
    pub fn as_bytes(&self) -> &[u8; RECORD_ID_LEN] {
        &self.0
    }

    /// Lowercase hex encoding (24 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from exactly 24 hex characters (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != RECORD_ID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: RECORD_ID_HEX_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; RECORD_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `s` is a syntactically valid identifier.
    pub fn is_valid(s: &str) -> bool {
        Self::from_hex(s).is_ok()
    }

    /// Seconds since the Unix epoch embedded in the first four bytes.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl FromStr for RecordId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.to_hex())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The kinds of record the system stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Story,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Story => write!(f, "story"),
            Self::User => write!(f, "user"),
        }
    }
}
