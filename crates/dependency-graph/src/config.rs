//! Scheduling tunables.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Thresholds used by critical-path and risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    /// Duration assumed for tasks without an estimate.
    pub default_task_hours: f64,

    /// Floats within this many hours of zero count as critical.
    pub float_tolerance_hours: f64,

    /// Lag at which a dependency is treated as an external constraint.
    pub external_constraint_lag_hours: i32,

    /// Lag at which early procurement is recommended.
    pub procurement_lag_hours: i32,

    /// Lags above this are flagged for review.
    pub long_lag_review_hours: i32,

    /// Blocked tasks above this share of the critical path count as a risk.
    pub blocked_ratio_threshold: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_task_hours: 8.0,
            float_tolerance_hours: 0.01,
            external_constraint_lag_hours: 24,
            procurement_lag_hours: 48,
            long_lag_review_hours: 24,
            blocked_ratio_threshold: 0.3,
        }
    }
}

impl ScheduleConfig {
    /// Check every tunable is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !self.default_task_hours.is_finite() || self.default_task_hours <= 0.0 {
            return Err(Error::invalid_config(format!(
                "defaultTaskHours must be positive, got {}",
                self.default_task_hours
            )));
        }
        if !self.float_tolerance_hours.is_finite() || self.float_tolerance_hours < 0.0 {
            return Err(Error::invalid_config(format!(
                "floatToleranceHours must not be negative, got {}",
                self.float_tolerance_hours
            )));
        }
        for (name, value) in [
            ("externalConstraintLagHours", self.external_constraint_lag_hours),
            ("procurementLagHours", self.procurement_lag_hours),
            ("longLagReviewHours", self.long_lag_review_hours),
        ] {
            if value < 0 {
                return Err(Error::invalid_config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.blocked_ratio_threshold) {
            return Err(Error::invalid_config(format!(
                "blockedRatioThreshold must be between 0 and 1, got {}",
                self.blocked_ratio_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScheduleConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.default_task_hours - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.procurement_lag_hours, 48);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: ScheduleConfig =
            serde_json::from_str(r#"{"defaultTaskHours": 4, "procurementLagHours": 72}"#).unwrap();
        assert!((config.default_task_hours - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.procurement_lag_hours, 72);
        assert_eq!(config.long_lag_review_hours, 24);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = ScheduleConfig {
            default_task_hours: 0.0,
            ..ScheduleConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let config = ScheduleConfig {
            procurement_lag_hours: -1,
            ..ScheduleConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("procurementLagHours"));

        let config = ScheduleConfig {
            blocked_ratio_threshold: 1.5,
            ..ScheduleConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
