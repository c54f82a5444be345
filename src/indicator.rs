//! Indicator codes and the four inclusion pillars.
//!
//! Indicator codes follow a prefix convention: `ACC_` for access, `USG_` for
//! usage, `INF_` for infrastructure and `ENA_` for enablers. The pillar of any
//! indicator can therefore be derived from its code alone.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The domain an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    /// Account ownership and reach.
    Access,
    /// Transaction activity.
    Usage,
    /// Agents, networks, coverage.
    Infrastructure,
    /// Preconditions such as phones, literacy and power.
    Enabler,
}

impl Pillar {
    /// All pillars in canonical order.
    pub const ALL: [Self; 4] = [Self::Access, Self::Usage, Self::Infrastructure, Self::Enabler];

    /// Code prefix used by indicators of this pillar.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Access => "ACC_",
            Self::Usage => "USG_",
            Self::Infrastructure => "INF_",
            Self::Enabler => "ENA_",
        }
    }

    /// Derives the pillar from an indicator code prefix.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| code.starts_with(p.prefix()))
    }

    /// Short stable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Usage => "usage",
            Self::Infrastructure => "infrastructure",
            Self::Enabler => "enabler",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(Self::Access),
            "usage" => Ok(Self::Usage),
            "infrastructure" => Ok(Self::Infrastructure),
            "enabler" | "enablers" => Ok(Self::Enabler),
            other => Err(ValidationError::UnknownVariant {
                field: "pillar",
                value: other.to_string(),
            }),
        }
    }
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(ACC|USG|INF|ENA)_[A-Z0-9_]+$").expect("indicator code pattern is valid")
    })
}

/// A validated indicator code such as `ACC_OWNERSHIP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndicatorCode(String);

impl IndicatorCode {
    /// Parses and validates an indicator code.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidIndicatorCode` if the code has no
    /// pillar prefix or contains characters other than `A-Z`, `0-9`, `_`.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_string();
        if !code_pattern().is_match(&code) {
            return Err(ValidationError::InvalidIndicatorCode { code });
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The pillar this indicator belongs to.
    #[must_use]
    pub fn pillar(&self) -> Pillar {
        // The constructor guarantees a known prefix.
        Pillar::from_code(&self.0).unwrap_or(Pillar::Access)
    }
}

impl fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndicatorCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IndicatorCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for IndicatorCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IndicatorCode> for String {
    fn from(code: IndicatorCode) -> Self {
        code.0
    }
}

impl FromStr for IndicatorCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillar_from_prefix() {
        assert_eq!(Pillar::from_code("ACC_OWNERSHIP"), Some(Pillar::Access));
        assert_eq!(Pillar::from_code("USG_DIGITAL_PAYMENT"), Some(Pillar::Usage));
        assert_eq!(Pillar::from_code("INF_AGENT_DENSITY"), Some(Pillar::Infrastructure));
        assert_eq!(Pillar::from_code("ENA_SMARTPHONE_PEN"), Some(Pillar::Enabler));
        assert_eq!(Pillar::from_code("GDP_GROWTH"), None);
    }

    #[test]
    fn test_pillar_parse() {
        assert_eq!("Access".parse::<Pillar>().unwrap(), Pillar::Access);
        assert_eq!(" usage ".parse::<Pillar>().unwrap(), Pillar::Usage);
        assert!("savings".parse::<Pillar>().is_err());
    }

    #[test]
    fn test_indicator_code_valid() {
        let code = IndicatorCode::new("ACC_MM_ACCOUNT").unwrap();
        assert_eq!(code.as_str(), "ACC_MM_ACCOUNT");
        assert_eq!(code.pillar(), Pillar::Access);
    }

    #[test]
    fn test_indicator_code_trims() {
        let code = IndicatorCode::new("  INF_4G_COVERAGE ").unwrap();
        assert_eq!(code.as_str(), "INF_4G_COVERAGE");
        assert_eq!(code.pillar(), Pillar::Infrastructure);
    }

    #[test]
    fn test_indicator_code_rejects_unknown_prefix() {
        let err = IndicatorCode::new("GDP_GROWTH").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIndicatorCode { .. }));
        assert!(IndicatorCode::new("acc_ownership").is_err());
        assert!(IndicatorCode::new("ACC_").is_err());
    }

    #[test]
    fn test_indicator_code_serde() {
        let code = IndicatorCode::new("USG_P2P_PAYMENT").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"USG_P2P_PAYMENT\"");
        let back: IndicatorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<IndicatorCode>("\"XYZ\"").is_err());
    }
}
