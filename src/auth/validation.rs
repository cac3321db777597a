use crate::error::ValidationError;

pub const MIN_PHONE_DIGITS: usize = 9;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Normalizes a phone number to an optional `+` followed by digits only.
///
/// Spaces, dashes, dots and parentheses are dropped before checking the length.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(ValidationError::InvalidPhone(raw.to_string())),
        }
    }

    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::InvalidPhone(raw.to_string()));
    }

    Ok(format!("{}{}", plus, digits))
}

pub fn validate_otp(code: &str, length: usize) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.len() != length || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidOtp(length));
    }
    Ok(())
}
