//! crates/lost_found_core/src/validation.rs
//!
//! Form checks performed by presentation code before calling the store.
//! The store itself accepts whatever it is given.

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("All fields are required")]
    MissingFields,
}

/// Checks a registration form.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Checks a post form. The image is optional.
pub fn validate_post(title: &str, description: &str, location: &str) -> Result<(), ValidationError> {
    if [title, description, location]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}
