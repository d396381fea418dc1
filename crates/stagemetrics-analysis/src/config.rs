use serde::{Deserialize, Serialize};
use stagemetrics_core::{ConflictPolicy, Error, Result};

/// Largest number of fractional digits kept in a percent annotation.
pub const MAX_PERCENT_PRECISION: u8 = 6;

/// Settings for [`MetricsAggregator`](crate::MetricsAggregator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Resolution of annotation keys that disagree across merged nodes.
    pub annotation_conflict: ConflictPolicy,

    /// Fractional digits kept in the `percentDur` annotation.
    pub percent_precision: u8,

    /// Whether `aggregate` writes `percentDur` annotations at all.
    pub compute_percent: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            annotation_conflict: ConflictPolicy::LastWins,
            percent_precision: 2,
            compute_percent: true,
        }
    }
}

impl AggregatorConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.percent_precision > MAX_PERCENT_PRECISION {
            return Err(Error::InvalidConfig(format!(
                "percent_precision must be at most {MAX_PERCENT_PRECISION}, got {}",
                self.percent_precision
            )));
        }
        Ok(())
    }
}
