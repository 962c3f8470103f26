//! Secret store vocabulary: redacting strings, stage labels and version maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// Passwords travel through the rotation engine as `SecretString` so they are
/// never written to logs or error messages by accident. The stored payload is
/// the one place the raw value is serialized, through [`serialize_exposed`].
///
/// Memory is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

/// Serialize the raw secret value. Only for writing payloads back to a store.
pub fn serialize_exposed<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Length in bytes, without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Staging label attached to a secret version.
///
/// Wire names follow the managed secrets service convention (`AWSCURRENT`,
/// `AWSPENDING`, `AWSPREVIOUS`); any other label is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageLabel {
    /// The live version; exactly one per secret
    Current,
    /// The version being rotated in
    Pending,
    /// The version that held CURRENT before the last rotation
    Previous,
    Custom(String),
}

impl StageLabel {
    pub fn as_str(&self) -> &str {
        match self {
            StageLabel::Current => "AWSCURRENT",
            StageLabel::Pending => "AWSPENDING",
            StageLabel::Previous => "AWSPREVIOUS",
            StageLabel::Custom(label) => label,
        }
    }
}

impl FromStr for StageLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "AWSCURRENT" => StageLabel::Current,
            "AWSPENDING" => StageLabel::Pending,
            "AWSPREVIOUS" => StageLabel::Previous,
            other => StageLabel::Custom(other.to_string()),
        })
    }
}

impl From<String> for StageLabel {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(label) => label,
            Err(never) => match never {},
        }
    }
}

impl From<StageLabel> for String {
    fn from(label: StageLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a secret's rotation metadata, as returned by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretDescription {
    pub secret_id: String,
    pub rotation_enabled: bool,
    /// Version token to the labels it carries
    pub versions: BTreeMap<String, BTreeSet<StageLabel>>,
    pub last_rotated: Option<DateTime<Utc>>,
}

impl SecretDescription {
    pub fn new(secret_id: impl Into<String>, rotation_enabled: bool) -> Self {
        Self {
            secret_id: secret_id.into(),
            rotation_enabled,
            versions: BTreeMap::new(),
            last_rotated: None,
        }
    }

    /// Labels carried by `token`, or `None` if the secret has no such version.
    pub fn stages(&self, token: &str) -> Option<&BTreeSet<StageLabel>> {
        self.versions.get(token)
    }

    pub fn has_stage(&self, token: &str, label: &StageLabel) -> bool {
        self.stages(token).is_some_and(|stages| stages.contains(label))
    }

    /// The version currently holding `label`, if any.
    pub fn version_with_stage(&self, label: &StageLabel) -> Option<&str> {
        self.versions
            .iter()
            .find(|(_, stages)| stages.contains(label))
            .map(|(token, _)| token.as_str())
    }

    pub fn count_with_stage(&self, label: &StageLabel) -> usize {
        self.versions.values().filter(|stages| stages.contains(label)).count()
    }
}
