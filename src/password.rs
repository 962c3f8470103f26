//! # Password Generation
//!
//! Draws replacement passwords from the operating system CSPRNG.
//!
//! A [`PasswordPolicy`] fixes the length, the complexity tier (which
//! character classes are used) and a set of excluded characters. Every
//! generated password contains at least one character from each class of
//! its tier, so database password-complexity rules are met on the first try.

use crate::errors::{Result, RotationError};
use crate::secrets::SecretString;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
/// Punctuation that survives shell, URL and SQL literal contexts unescaped
const SAFE_SYMBOLS: &str = "!#$%&()*+,-.:;<=>?[]^_{|}~";
/// Every printable ASCII punctuation character
const ALL_SYMBOLS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Default exclusions: characters that break connection strings or quoting
pub const DEFAULT_EXCLUDE_CHARACTERS: &str = "/@\"'\\";

/// Which character classes a password draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PasswordComplexity {
    /// Letters and digits
    Alphanumeric,
    /// Letters, digits and quoting-safe punctuation
    #[default]
    Standard,
    /// Letters, digits and all printable punctuation
    Extended,
}

impl PasswordComplexity {
    fn classes(&self) -> Vec<&'static str> {
        match self {
            Self::Alphanumeric => vec![LOWERCASE, UPPERCASE, DIGITS],
            Self::Standard => vec![LOWERCASE, UPPERCASE, DIGITS, SAFE_SYMBOLS],
            Self::Extended => vec![LOWERCASE, UPPERCASE, DIGITS, ALL_SYMBOLS],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alphanumeric => "alphanumeric",
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl FromStr for PasswordComplexity {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alphanumeric" => Ok(Self::Alphanumeric),
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            other => Err(RotationError::config(format!("Unknown password complexity: {}", other))),
        }
    }
}

impl fmt::Display for PasswordComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of generated passwords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Password length in characters
    #[validate(range(min = 8, max = 4096, message = "Password length must be between 8 and 4096"))]
    pub length: usize,

    pub complexity: PasswordComplexity,

    /// Characters never emitted
    pub exclude_characters: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 32,
            complexity: PasswordComplexity::Standard,
            exclude_characters: DEFAULT_EXCLUDE_CHARACTERS.to_string(),
        }
    }
}

impl PasswordPolicy {
    /// Character classes of the tier with exclusions removed.
    ///
    /// # Errors
    /// - [`RotationError::Config`] if an exclusion empties a class, or the
    ///   length is too short to include one character of every class
    pub fn effective_classes(&self) -> Result<Vec<Vec<char>>> {
        let classes: Vec<Vec<char>> = self
            .complexity
            .classes()
            .into_iter()
            .map(|class| class.chars().filter(|c| !self.exclude_characters.contains(*c)).collect())
            .collect();

        if classes.iter().any(Vec::is_empty) {
            return Err(RotationError::config(format!(
                "Excluded characters leave a '{}' password character class empty",
                self.complexity
            )));
        }
        if self.length < classes.len() {
            return Err(RotationError::config(format!(
                "Password length {} cannot include all {} character classes",
                self.length,
                classes.len()
            )));
        }
        Ok(classes)
    }

    /// Generate a password satisfying this policy.
    pub fn generate(&self) -> Result<SecretString> {
        let classes = self.effective_classes()?;
        let alphabet: Vec<char> = classes.iter().flatten().copied().collect();
        let mut rng = OsRng;

        let mut chars: Vec<char> = Vec::with_capacity(self.length);
        for class in &classes {
            chars.push(class[rng.gen_range(0..class.len())]);
        }
        while chars.len() < self.length {
            chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
        }
        chars.shuffle(&mut rng);

        Ok(SecretString::new(chars.into_iter().collect::<String>()))
    }
}
