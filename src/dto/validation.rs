//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_TEAM_NUMBER_LEN: usize = 10;

/// Validates a team number as printed by the tournament manager.
///
/// # Examples
///
/// ```ignore
/// validate_team_number("502A") // Ok
/// validate_team_number("")     // Err - empty
/// validate_team_number("50 2") // Err - space
/// ```
pub fn validate_team_number(number: &str) -> Result<(), ValidationError> {
    if number.is_empty() || number.len() > MAX_TEAM_NUMBER_LEN {
        let mut err = ValidationError::new("team_number_length");
        err.message = Some(
            format!(
                "Team number must be 1 to {MAX_TEAM_NUMBER_LEN} characters (got {})",
                number.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !number.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("team_number_format");
        err.message = Some("Team number must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_team_number_valid() {
        assert!(validate_team_number("502A").is_ok());
        assert!(validate_team_number("1").is_ok());
        assert!(validate_team_number("99999Z").is_ok());
    }

    #[test]
    fn test_validate_team_number_invalid_length() {
        assert!(validate_team_number("").is_err());
        assert!(validate_team_number("12345678901").is_err()); // too long
    }

    #[test]
    fn test_validate_team_number_invalid_format() {
        assert!(validate_team_number("502 A").is_err()); // space
        assert!(validate_team_number("502-A").is_err());
        assert!(validate_team_number(" 502A").is_err());
    }
}
