//! Shared types used across the Sitelens workspace.
//!
//! This module defines the check identifier newtype, the closed verdict
//! enumeration, and the outcome/report shapes consumed by reporting.

use crate::error::CoreError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for check identifiers with validation.
///
/// Check IDs must be lowercase alphanumeric with underscores, 3-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckId(String);

static CHECK_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_]{1,48}[a-z0-9]$").expect("valid regex"));

impl CheckId {
    /// Create a new `CheckId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Identifier used when a failure can no longer be attributed to a check.
    #[must_use]
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        if id.len() < 3 || id.len() > 50 {
            return Err(CoreError::Validation(format!(
                "invalid check ID: must be 3-50 characters, got {} characters",
                id.len()
            )));
        }

        if CHECK_ID_REGEX.is_match(id) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "invalid check ID: must be lowercase alphanumeric with underscores, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of verdicts a check can produce.
///
/// Wire values preserve the original report vocabulary. The severity
/// lattice orders `Rejected > Error > Attention > Approved`; `NotApplicable`
/// is orthogonal and never escalates a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The check passed
    #[serde(rename = "aprovado")]
    Approved,
    /// The check found a content/structural defect
    #[serde(rename = "reprovado")]
    Rejected,
    /// The check passed with warnings worth reviewing
    #[serde(rename = "atencao")]
    Attention,
    /// The check could not assess the target (transient/ambiguous failure)
    #[serde(rename = "erro")]
    Error,
    /// The check does not apply to this target
    #[serde(rename = "nao_se_aplica")]
    NotApplicable,
}

impl Verdict {
    /// Severity rank within the lattice (higher is worse).
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Rejected => 3,
            Self::Error => 2,
            Self::Attention => 1,
            Self::Approved | Self::NotApplicable => 0,
        }
    }

    /// Return the more severe of two verdicts.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Approved => "aprovado",
            Self::Rejected => "reprovado",
            Self::Attention => "atencao",
            Self::Error => "erro",
            Self::NotApplicable => "nao_se_aplica",
        };
        write!(f, "{label}")
    }
}

/// Details attached to a check outcome.
///
/// Either a plain human-readable string or a structured mapping of labeled
/// findings (e.g. the list of broken links). Serialized untagged so the wire
/// shape is a bare string or object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Details {
    /// Plain text summary
    Text(String),
    /// Structured findings keyed by label
    Findings(serde_json::Map<String, serde_json::Value>),
}

impl Details {
    /// Build a structured findings mapping from label/value pairs.
    #[must_use]
    pub fn findings(pairs: Vec<(&str, serde_json::Value)>) -> Self {
        let mut map = serde_json::Map::new();
        for (label, value) in pairs {
            map.insert(label.to_string(), value);
        }
        Self::Findings(map)
    }
}

impl From<String> for Details {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Details {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// The outcome of one check for one audit run.
///
/// Produced exactly once per dispatched check, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Identifier of the check that produced this outcome
    pub module: CheckId,
    /// Verdict from the closed enumeration
    pub result: Verdict,
    /// Supporting details
    pub details: Details,
}

impl CheckOutcome {
    /// Build an outcome with the given verdict and details.
    #[must_use]
    pub fn new(module: CheckId, result: Verdict, details: impl Into<Details>) -> Self {
        Self {
            module,
            result,
            details: details.into(),
        }
    }
}

/// Overall status tag for one audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// All dispatched checks finished
    Completed,
    /// The registry yielded zero checks; nothing ran
    NoChecksLoaded,
}

/// Aggregated result of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Target URL, when one was supplied
    pub url: Option<String>,
    /// One outcome per check that ran (completion order, no positional meaning)
    pub validations: Vec<CheckOutcome>,
    /// Overall run status tag
    pub status: AuditStatus,
}

impl AuditReport {
    /// The most severe verdict present in the report, if any check ran.
    #[must_use]
    pub fn worst_verdict(&self) -> Option<Verdict> {
        self.validations
            .iter()
            .map(|outcome| outcome.result)
            .reduce(Verdict::worst)
    }
}
