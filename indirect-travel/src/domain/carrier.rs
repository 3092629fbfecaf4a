//! Airline carrier code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid carrier code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid carrier code: {reason}")]
pub struct InvalidCarrierCode {
    reason: &'static str,
}

/// A valid 2-character IATA airline designator.
///
/// Designators are uppercase letters or digits (`AA`, `BA`, `9W`). A
/// designator made only of digits is rejected.
///
/// # Examples
///
/// ```
/// use indirect_travel::domain::CarrierCode;
///
/// let aa = CarrierCode::parse("AA").unwrap();
/// assert_eq!(aa.as_str(), "AA");
///
/// assert!(CarrierCode::parse("9W").is_ok());
/// assert!(CarrierCode::parse("aa").is_err());
/// assert!(CarrierCode::parse("99").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CarrierCode([u8; 2]);

impl CarrierCode {
    /// Parse a carrier code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidCarrierCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 2 {
            return Err(InvalidCarrierCode {
                reason: "must be exactly 2 characters",
            });
        }

        for &b in bytes {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(InvalidCarrierCode {
                    reason: "must be uppercase ASCII letters or digits",
                });
            }
        }

        if bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidCarrierCode {
                reason: "must contain at least one letter",
            });
        }

        Ok(CarrierCode([bytes[0], bytes[1]]))
    }

    /// Returns the carrier code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store ASCII uppercase letters and digits
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CarrierCode({})", self.as_str())
    }
}

impl fmt::Display for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CarrierCode {
    type Error = InvalidCarrierCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CarrierCode> for String {
    fn from(code: CarrierCode) -> Self {
        code.as_str().to_string()
    }
}
