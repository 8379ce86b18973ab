use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an [`Input`](crate::Input) inside its owning snapshot.
///
/// Only meaningful together with the snapshot it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InputIdx(pub u32);

impl InputIdx {
    /// Position `pos`, or `None` past `u32::MAX`.
    pub(crate) fn from_position(pos: usize) -> Option<Self> {
        u32::try_from(pos).ok().map(Self)
    }

    pub(crate) fn get(self) -> usize {
        self.0 as usize
    }
}

/// Session-stable positional identifier of an input, as used by bus selections.
///
/// The engine reports numbers either as integers or as strings; both normalize to the same
/// trimmed string form so `1`, `1.0` and `"1"` address the same input. Anything else decodes
/// to the empty number, which addresses nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct InputNumber(String);

impl InputNumber {
    /// Build a number from its textual form.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_owned())
    }

    /// Borrow the normalized textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` for the empty number a malformed record defaults to.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<u64> for InputNumber {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl From<&str> for InputNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for InputNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire shapes an identifier may arrive in.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Neg(i64),
    Float(f64),
    Str(String),
    Other(serde::de::IgnoredAny),
}

impl Scalar {
    /// Textual form, integral floats written without a fraction. `None` for non-scalars.
    fn into_text(self) -> Option<String> {
        match self {
            Self::Int(v) => Some(v.to_string()),
            Self::Neg(v) => Some(v.to_string()),
            Self::Float(f) if !f.is_finite() => None,
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Some(format!("{f:.0}"))
            }
            Self::Float(f) => Some(f.to_string()),
            Self::Str(s) => Some(s),
            Self::Other(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for InputNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Scalar::deserialize(deserializer)?
            .into_text()
            .map(Self::new)
            .unwrap_or_default())
    }
}

/// Stable identifier used by overlay references. Distinct namespace from [`InputNumber`].
///
/// Numeric keys decode to their textual form; non-scalars decode to the empty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct InputKey(String);

impl<'de> Deserialize<'de> for InputKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(Scalar::deserialize(deserializer)?.into_text().unwrap_or_default()))
    }
}

impl InputKey {
    /// Build a key from its textual form.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for InputKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InputKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
