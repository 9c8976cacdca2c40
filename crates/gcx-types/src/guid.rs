use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Globally unique identifier of a book entity.
///
/// GnuCash writes GUIDs as 32 hex characters without dashes. Parsing accepts
/// either case; display is always lower case, which is the form the writer
/// normalizes to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guid([u8; 16]);

impl Guid {
    /// Parse a 32-character hex GUID (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.len() != 32 {
            return Err(TypeError::InvalidGuid(s.to_string()));
        }
        let bytes = hex::decode(trimmed).map_err(|_| TypeError::InvalidGuid(s.to_string()))?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Generate a fresh random GUID for newly created entities.
    pub fn new_random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lower-case hex form, as written to the file.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters) for log output.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for Guid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Guid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Guid> for String {
    fn from(id: Guid) -> Self {
        id.to_hex()
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.short())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_is_case_insensitive() {
        let lower = Guid::parse("0123456789abcdef0123456789abcdef").unwrap();
        let upper = Guid::parse("0123456789ABCDEF0123456789ABCDEF").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn display_is_lower_case() {
        let id = Guid::parse("DEADBEEFdeadbeefDEADBEEFdeadbeef").unwrap();
        assert_eq!(id.to_string(), "deadbeefdeadbeefdeadbeefdeadbeef");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let id = Guid::parse("  0123456789abcdef0123456789abcdef\n").unwrap();
        assert_eq!(id.short(), "01234567");
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(matches!(Guid::parse("abc"), Err(TypeError::InvalidGuid(_))));
        assert!(Guid::parse("0123456789abcdef0123456789abcdef00").is_err());
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!(Guid::parse("zz23456789abcdef0123456789abcdef").is_err());
    }

    #[test]
    fn random_guids_differ() {
        assert_ne!(Guid::new_random(), Guid::new_random());
    }

    #[test]
    fn serde_roundtrip() {
        let id = Guid::parse("0123456789abcdef0123456789abcdef").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0123456789abcdef0123456789abcdef\"");
        let parsed: Guid = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn hex_parses_back_in_either_case(bytes in prop::array::uniform16(any::<u8>())) {
            let id = Guid::from_bytes(bytes);
            let hex = id.to_hex();
            prop_assert_eq!(hex.len(), 32);
            prop_assert_eq!(Guid::parse(&hex).unwrap(), id);
            prop_assert_eq!(Guid::parse(&hex.to_uppercase()).unwrap(), id);
        }
    }
}
