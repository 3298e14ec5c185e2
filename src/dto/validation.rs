//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a point adjustment is exactly one point up or down.
///
/// The engine repeats this check, but rejecting garbage at the edge keeps
/// malformed payloads out of the version-gated write path entirely.
pub fn validate_point_delta(delta: i8) -> Result<(), ValidationError> {
    if !matches!(delta, 1 | -1) {
        let mut err = ValidationError::new("point_delta");
        err.message = Some(format!("point delta must be +1 or -1 (got {delta})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_point_delta_valid() {
        assert!(validate_point_delta(1).is_ok());
        assert!(validate_point_delta(-1).is_ok());
    }

    #[test]
    fn test_validate_point_delta_invalid() {
        assert!(validate_point_delta(0).is_err());
        assert!(validate_point_delta(2).is_err());
        assert!(validate_point_delta(-2).is_err());
        assert!(validate_point_delta(i8::MAX).is_err());
    }
}
