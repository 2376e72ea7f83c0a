//! Tolerance-threshold aggregation for multi-page checks.
//!
//! Checks that fan out many sub-probes (breadcrumbs, link coherence) merge
//! their sub-results through the same decision rule: any structural defect
//! rejects the whole check; availability noise is tolerated up to a
//! percentage threshold, beyond which the check reports an ambiguous error
//! rather than a verdict.

use sitelens_core::Verdict;

/// Why a sub-probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubProbeFailure {
    /// The content is wrong (missing markup, broken breadcrumb link, ...)
    Structural(String),
    /// The target could not be reached (network error, timeout, HTTP error)
    Unreachable(String),
}

/// Result of probing one sub-target (a page or link) inside a check.
#[derive(Debug, Clone)]
pub struct SubProbe {
    /// The probed page or link URL
    pub target: String,
    /// `None` means the probe passed
    pub failure: Option<SubProbeFailure>,
}

impl SubProbe {
    /// A passing probe.
    #[must_use]
    pub fn pass(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failure: None,
        }
    }

    /// A probe that found a content/structural defect.
    #[must_use]
    pub fn structural(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failure: Some(SubProbeFailure::Structural(reason.into())),
        }
    }

    /// A probe that could not reach its target.
    #[must_use]
    pub fn unreachable(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            failure: Some(SubProbeFailure::Unreachable(reason.into())),
        }
    }

    /// Whether this probe found a structural defect.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self.failure, Some(SubProbeFailure::Structural(_)))
    }

    /// Whether this probe failed to reach its target.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self.failure, Some(SubProbeFailure::Unreachable(_)))
    }
}

/// Running tally of sub-probe results for the tolerance verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToleranceTally {
    total: usize,
    structural: usize,
    unreachable: usize,
}

impl ToleranceTally {
    /// An empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tally from a slice of sub-probes.
    #[must_use]
    pub fn from_probes(probes: &[SubProbe]) -> Self {
        let mut tally = Self::new();
        for probe in probes {
            tally.record(probe);
        }
        tally
    }

    /// Record one sub-probe.
    pub fn record(&mut self, probe: &SubProbe) {
        self.total += 1;
        if probe.is_structural() {
            self.structural += 1;
        } else if probe.is_unreachable() {
            self.unreachable += 1;
        }
    }

    /// Total sub-targets probed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Sub-targets with a structural defect.
    #[must_use]
    pub fn structural(&self) -> usize {
        self.structural
    }

    /// Sub-targets that could not be reached.
    #[must_use]
    pub fn unreachable(&self) -> usize {
        self.unreachable
    }

    /// Fraction of unreachable sub-targets, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unreachable_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.unreachable as f64 / self.total as f64) * 100.0
        }
    }

    /// Apply the tolerance rule.
    ///
    /// Structural defects dominate: a single one rejects the check even if
    /// every other page loads fine. Otherwise an unreachable fraction above
    /// the threshold yields `Error` (a transient-availability signal, not a
    /// content defect). Anything else is approved.
    #[must_use]
    pub fn verdict(&self, threshold_percent: u8) -> Verdict {
        if self.structural > 0 {
            Verdict::Rejected
        } else if self.total > 0 && self.unreachable_percent() > f64::from(threshold_percent) {
            Verdict::Error
        } else {
            Verdict::Approved
        }
    }
}
