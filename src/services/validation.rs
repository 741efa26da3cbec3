use chrono::NaiveDate;

use crate::error::ValidationError;

const CPF_MASK: &str = "###.###.###-##";
const PHONE_MASK: &str = "(##) 9####-####";
pub const MIN_PASSWORD_LEN: usize = 8;

/// `#` matches an ASCII digit, every other mask char matches itself.
fn matches_mask(value: &str, mask: &str) -> bool {
    value.len() == mask.len()
        && value.chars().zip(mask.chars()).all(|(c, m)| match m {
            '#' => c.is_ascii_digit(),
            _ => c == m,
        })
}

pub fn required_name(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ValidationError::new("Invalid email address")),
    }
}

pub fn password(value: &str) -> Result<&str, ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(value)
}

pub fn cpf(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if !matches_mask(trimmed, CPF_MASK) {
        return Err(ValidationError::new("CPF must match XXX.XXX.XXX-XX"));
    }
    Ok(trimmed.to_string())
}

pub fn phone_number(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if !matches_mask(trimmed, PHONE_MASK) {
        return Err(ValidationError::new(
            "Phone number must match (DD) 9XXXX-XXXX",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn date_of_birth(value: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if value > today {
        return Err(ValidationError::new("Date of birth cannot be in the future"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn cpf_requires_punctuated_digits() {
        assert_eq!(cpf(" 123.456.789-09 ").as_deref(), Ok("123.456.789-09"));
        assert!(cpf("12345678909").is_err());
        assert!(cpf("123.456.789-0a").is_err());
    }

    #[test]
    fn phone_requires_mobile_mask() {
        assert!(phone_number("(11) 98765-4321").is_ok());
        assert!(phone_number("(11) 88765-4321").is_err());
        assert!(phone_number("11 98765-4321").is_err());
    }

    #[test]
    fn email_needs_both_sides_of_at() {
        assert!(email("ana@example.com").is_ok());
        assert!(email("ana@").is_err());
        assert!(email("example.com").is_err());
    }

    #[test]
    fn password_needs_minimum_length() {
        assert!(password("abc123").is_err());
        assert_eq!(password("long enough"), Ok("long enough"));
    }

    #[test]
    fn names_are_trimmed_and_non_empty() {
        assert_eq!(required_name("name", "  Lab ").as_deref(), Ok("Lab"));
        assert!(required_name("name", "   ").is_err());
    }

    #[test]
    fn birth_date_cannot_be_in_future() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
        let tomorrow = today.succ_opt().expect("valid date");

        assert!(date_of_birth(today, today).is_ok());
        assert!(date_of_birth(tomorrow, today).is_err());
    }
}
