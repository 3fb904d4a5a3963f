//! Minimum coverage gates

use crate::coverage::ratio::format_ratio;
use crate::result::{FlowcovError, FlowcovResult};
use serde::{Deserialize, Serialize};

/// A required minimum coverage ratio in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MinimumCoverage(f64);

impl MinimumCoverage {
    /// Validate a minimum ratio
    pub fn new(ratio: f64) -> FlowcovResult<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(FlowcovError::invalid_configuration(format!(
                "minimum coverage must be within [0.0, 1.0], got {ratio}"
            )));
        }
        Ok(Self(ratio))
    }

    /// The required ratio
    #[must_use]
    pub const fn ratio(self) -> f64 {
        self.0
    }

    /// Whether `actual` satisfies the gate; an undefined ratio never does
    #[must_use]
    pub fn is_met_by(self, actual: f64) -> bool {
        !actual.is_nan() && actual >= self.0
    }

    /// Fail with [`FlowcovError::CoverageBelowMinimum`] unless satisfied
    pub fn check(self, scope: impl Into<String>, actual: f64) -> FlowcovResult<()> {
        if self.is_met_by(actual) {
            return Ok(());
        }
        let scope = scope.into();
        tracing::warn!(
            scope = %scope,
            actual = %format_ratio(actual),
            minimum = %format_ratio(self.0),
            "coverage below minimum"
        );
        Err(FlowcovError::CoverageBelowMinimum {
            scope,
            actual,
            minimum: self.0,
        })
    }
}

impl TryFrom<f64> for MinimumCoverage {
    type Error = FlowcovError;

    fn try_from(ratio: f64) -> FlowcovResult<Self> {
        Self::new(ratio)
    }
}

impl From<MinimumCoverage> for f64 {
    fn from(minimum: MinimumCoverage) -> Self {
        minimum.0
    }
}
