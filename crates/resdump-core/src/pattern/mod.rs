//! Masked byte patterns and the scanner that finds them in a module image.
//!
//! Patterns are written as whitespace-separated tokens: two hex digits for an
//! exact byte, `?` or `??` for a wildcard. `00` is always the byte zero; the
//! wildcard has its own in-memory representation (`None`), so the two can
//! never be confused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ModuleImage;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    bytes: Vec<Option<u8>>,
}

impl Pattern {
    pub fn new(bytes: Vec<Option<u8>>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("Pattern is empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Pattern without wildcards
    pub fn exact(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.iter().copied().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.bytes
    }

    /// Check the pattern against `haystack[offset..]`
    pub fn matches_at(&self, haystack: &[u8], offset: usize) -> bool {
        let Some(end) = offset.checked_add(self.bytes.len()) else {
            return false;
        };
        let Some(window) = haystack.get(offset..end) else {
            return false;
        };
        self.bytes
            .iter()
            .zip(window)
            .all(|(expected, actual)| expected.is_none_or(|value| value == *actual))
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in s.split_whitespace() {
            if token == "??" || token == "?" {
                bytes.push(None);
                continue;
            }

            if token.len() != 2 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidPattern(format!(
                    "Invalid pattern token '{}' (expected two hex digits or '??')",
                    token
                )));
            }
            let value = u8::from_str_radix(token, 16).map_err(|e| {
                Error::InvalidPattern(format!("Invalid pattern token '{}': {}", token, e))
            })?;
            bytes.push(Some(value));
        }

        Self::new(bytes)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match byte {
                Some(value) => write!(f, "{:02X}", value)?,
                None => f.write_str("??")?,
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Pattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.to_string()
    }
}

/// Find the lowest address in `image` where `pattern` matches.
pub fn find_first<I: ModuleImage + ?Sized>(image: &I, pattern: &Pattern) -> Option<u64> {
    let haystack = image.bytes();
    if pattern.len() > haystack.len() {
        return None;
    }

    let last = haystack.len() - pattern.len();
    (0..=last)
        .find(|&offset| pattern.matches_at(haystack, offset))
        .map(|offset| image.base_address() + offset as u64)
}

/// Find every address in `image` where `pattern` matches, in ascending order.
pub fn find_all<I: ModuleImage + ?Sized>(image: &I, pattern: &Pattern) -> Vec<u64> {
    let haystack = image.bytes();
    if pattern.len() > haystack.len() {
        return Vec::new();
    }

    let last = haystack.len() - pattern.len();
    (0..=last)
        .filter(|&offset| pattern.matches_at(haystack, offset))
        .map(|offset| image.base_address() + offset as u64)
        .collect()
}
