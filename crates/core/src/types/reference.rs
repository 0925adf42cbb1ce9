//! Human-readable order reference codes.

use serde::{Deserialize, Serialize};

/// Alphabet for reference codes.
///
/// Uppercase alphanumerics minus the lookalikes (0/O, 1/I/L) so the code
/// survives being read over the phone to the pharmacy team.
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Number of random characters after the prefix.
const CODE_LENGTH: usize = 6;

/// Prefix identifying Fernhill order references.
const PREFIX: &str = "FH-";

/// A human-readable order reference (e.g., `FH-7KQ2MX`).
///
/// References are generated client-side when an order is first created and
/// stored alongside the order on the platform. They are the recovery handle
/// when a session has lost its cached order id but the customer still has a
/// draft in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Generate a fresh reference code.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let mut code = String::with_capacity(PREFIX.len() + CODE_LENGTH);
        code.push_str(PREFIX);
        for _ in 0..CODE_LENGTH {
            let idx = rng.random_range(0..ALPHABET.len());
            code.push(char::from(ALPHABET[idx]));
        }
        Self(code)
    }

    /// Wrap an existing reference string (e.g., read back from the platform).
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Reference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Reference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let reference = Reference::generate();
        let s = reference.as_str();
        assert!(s.starts_with("FH-"));
        assert_eq!(s.len(), PREFIX.len() + CODE_LENGTH);
    }

    #[test]
    fn test_generate_alphabet() {
        for _ in 0..50 {
            let reference = Reference::generate();
            for c in reference.as_str().trim_start_matches(PREFIX).bytes() {
                assert!(ALPHABET.contains(&c), "unexpected character {}", c as char);
            }
        }
    }

    #[test]
    fn test_generate_unique_enough() {
        let a = Reference::generate();
        let b = Reference::generate();
        // 31^6 possibilities; a collision here means the RNG is broken
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_transparent() {
        let reference = Reference::new("FH-ABC234");
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, "\"FH-ABC234\"");
    }
}
