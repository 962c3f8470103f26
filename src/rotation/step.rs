//! The four steps of the rotation protocol.

use crate::errors::{Result, RotationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a rotation, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStep {
    /// Stage a new PENDING version with a fresh password
    CreateSecret,
    /// Apply the PENDING password to the database
    SetSecret,
    /// Log in with the PENDING credentials
    TestSecret,
    /// Promote PENDING to CURRENT
    FinishSecret,
}

impl RotationStep {
    pub const ALL: [RotationStep; 4] =
        [Self::CreateSecret, Self::SetSecret, Self::TestSecret, Self::FinishSecret];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSecret => "createSecret",
            Self::SetSecret => "setSecret",
            Self::TestSecret => "testSecret",
            Self::FinishSecret => "finishSecret",
        }
    }
}

impl FromStr for RotationStep {
    type Err = RotationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| RotationError::payload(format!("unknown rotation step '{}'", s)))
    }
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        for step in RotationStep::ALL {
            assert_eq!(step.as_str().parse::<RotationStep>().unwrap(), step);
        }
        assert!("rotate".parse::<RotationStep>().is_err());
        // Wire names are case-sensitive
        assert!("CreateSecret".parse::<RotationStep>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&RotationStep::FinishSecret).unwrap(), "\"finishSecret\"");
        let step: RotationStep = serde_json::from_str("\"testSecret\"").unwrap();
        assert_eq!(step, RotationStep::TestSecret);
    }
}
