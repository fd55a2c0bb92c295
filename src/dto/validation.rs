//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a session PIN is exactly 6 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_pin("123456") // Ok
/// validate_pin("12345")  // Err - too short
/// validate_pin("12a456") // Err - non-digit
/// ```
pub fn validate_pin(pin: &str) -> Result<(), ValidationError> {
    if pin.len() != 6 {
        let mut err = ValidationError::new("pin_length");
        err.message = Some(format!("PIN must be exactly 6 digits (got {})", pin.len()).into());
        return Err(err);
    }

    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        let mut err = ValidationError::new("pin_format");
        err.message = Some("PIN must contain only ASCII digits".into());
        return Err(err);
    }

    Ok(())
}
