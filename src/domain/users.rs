//! Username and password rules.

use crate::domain::error::DomainError;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Usernames are 1..=150 characters of letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "username must be at most {USERNAME_MAX_CHARS} characters"
        )));
    }
    if let Some(bad) = username
        .chars()
        .find(|ch| !(ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_')))
    {
        return Err(DomainError::validation(format!(
            "username may not contain `{bad}`"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::validation("password must not be entirely numeric"));
    }
    Ok(())
}
