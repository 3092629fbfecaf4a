//! Airport and city code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid airport or city code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid point code: {reason}")]
pub struct InvalidPointCode {
    reason: &'static str,
}

/// A 3-letter IATA location identifier.
///
/// The same code space covers airports (`LHR`) and multi-airport cities
/// (`LON`), so both use this type.
///
/// # Examples
///
/// ```
/// use indirect_travel::domain::PointCode;
///
/// let lon = PointCode::parse("LON").unwrap();
/// assert_eq!(lon.as_str(), "LON");
///
/// assert!(PointCode::parse("lon").is_err());
/// assert!(PointCode::parse("LO").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PointCode([u8; 3]);

impl PointCode {
    /// Parse a point code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidPointCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidPointCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidPointCode {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(PointCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII uppercase letters
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for PointCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointCode({})", self.as_str())
    }
}

impl fmt::Display for PointCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PointCode {
    type Error = InvalidPointCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PointCode> for String {
    fn from(code: PointCode) -> Self {
        code.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(PointCode::parse("LHR").is_ok());
        assert!(PointCode::parse("LON").is_ok());
        assert!(PointCode::parse("DFW").is_ok());
    }

    #[test]
    fn reject_invalid_codes() {
        assert!(PointCode::parse("").is_err());
        assert!(PointCode::parse("LH").is_err());
        assert!(PointCode::parse("LHRX").is_err());
        assert!(PointCode::parse("lhr").is_err());
        assert!(PointCode::parse("L1R").is_err());
        assert!(PointCode::parse("LÖN").is_err());
    }

    #[test]
    fn debug() {
        let code = PointCode::parse("ORD").unwrap();
        assert_eq!(format!("{:?}", code), "PointCode(ORD)");
    }

    #[test]
    fn hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PointCode::parse("LON").unwrap());
        assert!(set.contains(&PointCode::parse("LON").unwrap()));
        assert!(!set.contains(&PointCode::parse("PAR").unwrap()));
    }
}
