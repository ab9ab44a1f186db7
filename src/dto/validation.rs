//! Validation helpers for DTOs.

use validator::ValidationError;

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Validates a calendar day written as `YYYY-MM-DD`.
///
/// ```ignore
/// validate_day("2025-10-04") // Ok
/// validate_day("2025-13-01") // Err - month
/// validate_day("4/10/2025")  // Err - format
/// ```
pub fn validate_day(value: &str) -> Result<(), ValidationError> {
    let parts: Vec<&str> = value.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(invalid("day_format", format!("`{value}` is not YYYY-MM-DD")));
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return Err(invalid("day_format", format!("`{value}` is not YYYY-MM-DD")));
    }

    let (Some(year), Some(month), Some(day)) = (digits(year), digits(month), digits(day)) else {
        return Err(invalid("day_format", format!("`{value}` is not YYYY-MM-DD")));
    };
    let month_len = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        _ => return Err(invalid("day_range", format!("month {month} does not exist"))),
    };
    if day == 0 || day > month_len {
        return Err(invalid(
            "day_range",
            format!("day {day} is outside month {month}"),
        ));
    }
    Ok(())
}

/// Validates a wall-clock time written as `HH:MM` (24h).
pub fn validate_clock(value: &str) -> Result<(), ValidationError> {
    let valid = match value.split_once(':') {
        Some((hours, minutes)) if hours.len() == 2 && minutes.len() == 2 => {
            matches!((digits(hours), digits(minutes)), (Some(h), Some(m)) if h < 24 && m < 60)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid("clock_format", format!("`{value}` is not HH:MM")))
    }
}

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", "value must not be blank".into()))
    } else {
        Ok(())
    }
}

/// Game kinds are short slugs: lowercase letters, digits and `-`.
pub fn validate_game_kind(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value.len() <= 32
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(invalid(
            "game_kind_format",
            format!("`{value}` must be a lowercase slug of at most 32 characters"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_day() {
        assert!(validate_day("2025-10-04").is_ok());
        assert!(validate_day("2024-02-29").is_ok());
        assert!(validate_day("2025-02-29").is_err()); // not a leap year
        assert!(validate_day("2025-13-01").is_err());
        assert!(validate_day("2025-1-01").is_err());
        assert!(validate_day("04/10/2025").is_err());
        assert!(validate_day("").is_err());
    }

    #[test]
    fn test_validate_clock() {
        assert!(validate_clock("09:30").is_ok());
        assert!(validate_clock("23:59").is_ok());
        assert!(validate_clock("24:00").is_err());
        assert!(validate_clock("9:30").is_err());
        assert!(validate_clock("09-30").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Blue Jays").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_game_kind() {
        assert!(validate_game_kind("cornhole").is_ok());
        assert!(validate_game_kind("ladder-toss-2").is_ok());
        assert!(validate_game_kind("Cornhole").is_err());
        assert!(validate_game_kind("corn hole").is_err());
        assert!(validate_game_kind("").is_err());
    }
}
