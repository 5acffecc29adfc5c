//! Error types for projections and simulations
//!
//! Only structurally invalid configuration is an error. Depletion and legacy
//! shortfalls are reported as data on the phase reports.

use thiserror::Error;

/// Failure raised by the projection engine or the Monte Carlo simulator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// Out-of-range or inconsistent input; safe to show to the end user
    #[error("invalid {context} parameter `{field}`: {reason}")]
    InvalidParameter {
        context: &'static str,
        field: &'static str,
        reason: String,
    },

    /// Return sequence does not cover the plan horizon exactly.
    /// Indicates a defect in the caller that generated the sequence.
    #[error("return sequence covers {actual} years but the plan horizon is {expected} years")]
    SequenceLength { expected: usize, actual: usize },

    /// Zero trials requested, or statistics requested over no trials
    #[error("at least one trial is required")]
    EmptyTrialSet,

    /// Batch stopped between trials by a cancellation token
    #[error("simulation cancelled after {completed} of {requested} trials")]
    Cancelled { completed: u32, requested: u32 },
}

impl PlanError {
    pub(crate) fn invalid(context: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::InvalidParameter {
            context,
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;

/// Reject NaN/infinite amounts and negative money values
pub(crate) fn check_amount(context: &'static str, field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PlanError::invalid(context, field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(PlanError::invalid(context, field, format!("must not be negative (got {value})")));
    }
    Ok(())
}

/// Reject rates outside `[min, max]` (inclusive)
pub(crate) fn check_rate(context: &'static str, field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PlanError::invalid(context, field, "must be a finite number"));
    }
    if value < min || value > max {
        return Err(PlanError::invalid(
            context,
            field,
            format!("{value} is outside the range [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Oldest age any phase may reach; also bounds every phase length
pub const MAX_AGE: u32 = 150;

/// Convert a caller-supplied signed duration into years, rejecting negatives
/// and anything longer than [`MAX_AGE`] years
pub(crate) fn check_duration(context: &'static str, field: &'static str, years: i32) -> Result<u32> {
    let years = u32::try_from(years)
        .map_err(|_| PlanError::invalid(context, field, format!("duration cannot be negative (got {years})")))?;
    if years > MAX_AGE {
        return Err(PlanError::invalid(
            context,
            field,
            format!("{years} years exceeds the {MAX_AGE}-year limit"),
        ));
    }
    Ok(years)
}

/// Reject ages above [`MAX_AGE`]
pub(crate) fn check_age(context: &'static str, field: &'static str, age: u32) -> Result<()> {
    if age > MAX_AGE {
        return Err(PlanError::invalid(context, field, format!("age {age} exceeds {MAX_AGE}")));
    }
    Ok(())
}

/// Reject a phase of `years` starting at `start_age` that would end past [`MAX_AGE`]
pub(crate) fn check_horizon(context: &'static str, start_age: u32, years: u32) -> Result<()> {
    match start_age.checked_add(years) {
        Some(end) if end <= MAX_AGE => Ok(()),
        _ => Err(PlanError::invalid(
            context,
            "duration_years",
            format!("{years} years from age {start_age} runs past age {MAX_AGE}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_is_user_facing() {
        let err = PlanError::invalid("accumulation", "expected_return", "too low");
        assert_eq!(err.to_string(), "invalid accumulation parameter `expected_return`: too low");
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount("test", "x", 0.0).is_ok());
        assert!(check_amount("test", "x", -1.0).is_err());
        assert!(check_amount("test", "x", f64::NAN).is_err());
        assert!(check_amount("test", "x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_check_rate_bounds_inclusive() {
        assert!(check_rate("test", "r", -1.0, -1.0, 1.0).is_ok());
        assert!(check_rate("test", "r", 1.0, -1.0, 1.0).is_ok());
        assert!(check_rate("test", "r", -1.01, -1.0, 1.0).is_err());
    }

    #[test]
    fn test_check_duration() {
        assert_eq!(check_duration("test", "d", 0), Ok(0));
        assert_eq!(check_duration("test", "d", 35), Ok(35));
        assert!(matches!(
            check_duration("test", "d", -1),
            Err(PlanError::InvalidParameter { field: "d", .. })
        ));
        assert_eq!(check_duration("test", "d", 150), Ok(150));
        assert!(check_duration("test", "d", 151).is_err());
        assert!(check_duration("test", "d", i32::MAX).is_err());
    }

    #[test]
    fn test_check_horizon_never_overflows() {
        assert!(check_horizon("test", 60, 90).is_ok());
        assert!(check_horizon("test", 60, 91).is_err());
        assert!(matches!(
            check_horizon("test", u32::MAX - 1, 5),
            Err(PlanError::InvalidParameter { field: "duration_years", .. })
        ));
        assert!(check_age("test", "age", 150).is_ok());
        assert!(check_age("test", "age", 151).is_err());
    }
}
