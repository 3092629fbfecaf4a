//! Nation code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid nation code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid nation code: {reason}")]
pub struct InvalidNationCode {
    reason: &'static str,
}

/// A 2-letter ISO nation code.
///
/// # Examples
///
/// ```
/// use indirect_travel::domain::NationCode;
///
/// let us = NationCode::parse("US").unwrap();
/// assert!(us.is_us_or_canada());
/// assert!(NationCode::parse("usa").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationCode([u8; 2]);

impl NationCode {
    pub const US: NationCode = NationCode(*b"US");
    pub const CA: NationCode = NationCode(*b"CA");

    /// Parse a nation code from a string of exactly 2 uppercase letters.
    pub fn parse(s: &str) -> Result<Self, InvalidNationCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 2 {
            return Err(InvalidNationCode {
                reason: "must be exactly 2 characters",
            });
        }

        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidNationCode {
                reason: "must be uppercase ASCII letters A-Z",
            });
        }

        Ok(NationCode([bytes[0], bytes[1]]))
    }

    /// Returns the nation code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII uppercase letters
        std::str::from_utf8(&self.0).unwrap()
    }

    /// United States and Canada are priced as one domestic market.
    pub fn is_us_or_canada(&self) -> bool {
        *self == Self::US || *self == Self::CA
    }
}

impl fmt::Debug for NationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NationCode({})", self.as_str())
    }
}

impl fmt::Display for NationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NationCode {
    type Error = InvalidNationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NationCode> for String {
    fn from(code: NationCode) -> Self {
        code.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert_eq!(NationCode::parse("US").unwrap(), NationCode::US);
        assert_eq!(NationCode::parse("CA").unwrap(), NationCode::CA);
        assert!(NationCode::parse("GB").is_ok());
    }

    #[test]
    fn reject_invalid_codes() {
        assert!(NationCode::parse("").is_err());
        assert!(NationCode::parse("U").is_err());
        assert!(NationCode::parse("USA").is_err());
        assert!(NationCode::parse("us").is_err());
        assert!(NationCode::parse("U1").is_err());
    }

    #[test]
    fn us_canada_market() {
        assert!(NationCode::US.is_us_or_canada());
        assert!(NationCode::CA.is_us_or_canada());
        assert!(!NationCode::parse("MX").unwrap().is_us_or_canada());
    }

    #[test]
    fn display() {
        assert_eq!(NationCode::US.to_string(), "US");
        assert_eq!(format!("{:?}", NationCode::CA), "NationCode(CA)");
    }
}
