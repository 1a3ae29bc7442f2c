//! Octal mode strings.
//!
//! Modes are accepted as 3 or 4 octal digits. A 4-digit mode may only carry
//! the sticky bit in its leading digit (`0` or `1`). The textual width is
//! kept for display; comparisons always go through [`ModeString::bits`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Permission bits a mode string can express (sticky + rwx triplets).
const MODE_MASK: u32 = 0o1777;

/// A validated 3- or 4-digit octal mode.
///
/// # Examples
///
/// ```
/// use dircopy::ModeString;
///
/// let mode: ModeString = "750".parse().unwrap();
/// assert_eq!(mode.bits(), 0o750);
/// assert_eq!(mode.with_traversal().to_string(), "751");
///
/// let sticky: ModeString = "1750".parse().unwrap();
/// assert_eq!(sticky.with_traversal().to_string(), "1751");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModeString {
    digits: String,
}

impl ModeString {
    /// Parses and validates a mode string.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the string is 3 or 4 octal digits
    /// and, for 4 digits, the leading digit is `0` or `1`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !matches!(s.len(), 3 | 4) {
            return Err(Error::validation(
                "mode",
                format!("'{s}' must be 3 or 4 octal digits"),
            ));
        }
        if !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(Error::validation(
                "mode",
                format!("'{s}' contains non-octal characters"),
            ));
        }
        if s.len() == 4 && !s.starts_with(['0', '1']) {
            return Err(Error::validation(
                "mode",
                format!("'{s}': only the sticky bit (leading 0 or 1) is supported"),
            ));
        }
        Ok(Self {
            digits: s.to_string(),
        })
    }

    /// Builds a mode string from permission bits.
    ///
    /// Bits outside sticky + rwx are dropped. The result has 4 digits only
    /// when the sticky bit is set.
    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        let bits = bits & MODE_MASK;
        let digits = if bits > 0o777 {
            format!("{bits:04o}")
        } else {
            format!("{bits:03o}")
        };
        Self { digits }
    }

    /// The numeric permission bits.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.digits
            .bytes()
            .fold(0, |acc, b| (acc << 3) | u32::from(b - b'0'))
    }

    /// The mode as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Derives the directory mode under the directory-traversal grant.
    ///
    /// Each of the three permission digits gets its execute bit: even digits
    /// are incremented, odd digits are kept. A leading sticky digit is
    /// passed through unchanged.
    #[must_use]
    pub fn with_traversal(&self) -> Self {
        let split = self.digits.len() - 3;
        let (sticky, perms) = self.digits.split_at(split);
        let mut digits = String::with_capacity(self.digits.len());
        digits.push_str(sticky);
        for d in perms.bytes() {
            let d = d - b'0';
            let d = if d % 2 == 0 { d + 1 } else { d };
            digits.push(char::from(b'0' + d));
        }
        Self { digits }
    }

    /// The default mode for the invoking process: everything its umask
    /// does not mask out.
    #[must_use]
    pub fn from_umask() -> Self {
        Self::from_bits(0o777 & !process_umask())
    }
}

impl fmt::Display for ModeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl FromStr for ModeString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ModeString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.digits)
    }
}

impl<'de> Deserialize<'de> for ModeString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // An unquoted YAML number has already lost its radix (`0o640` arrives
        // as 416), so only strings are accepted.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Raw::Number(n) => Err(serde::de::Error::custom(format!(
                "mode must be a quoted string such as '0640', not the number {n}"
            ))),
        }
    }
}

/// Renders permission bits the way destination entries are reported
/// (always four digits).
#[must_use]
pub fn format_mode(bits: u32) -> String {
    format!("{:04o}", bits & 0o7777)
}

/// Reads the process umask without leaving it changed.
fn process_umask() -> u32 {
    use nix::sys::stat::{umask, Mode};

    let previous = umask(Mode::from_bits_truncate(0o022));
    umask(previous);
    u32::from(previous.bits())
}

#[cfg(test)]
mod proptests;
