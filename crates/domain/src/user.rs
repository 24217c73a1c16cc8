//! Registration inputs and their validation rules.

use serde::{Deserialize, Serialize};
use talentdesk_core::{AppError, AppResult, NonEmptyString};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    /// The stored value is trimmed and lower-cased.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Maximum password length; keeps provider-side hashing bounded.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password chosen at registration.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Profile data captured alongside a new credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileFields {
    first_name: NonEmptyString,
    last_name: NonEmptyString,
    phone: Option<String>,
    gender: Option<String>,
    location: Option<String>,
    date_of_birth: Option<String>,
}

impl ProfileFields {
    /// Creates profile fields with the two required name parts.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> AppResult<Self> {
        let first_name = NonEmptyString::new(first_name.into().trim())
            .map_err(|_| AppError::Validation("first name is required".to_owned()))?;
        let last_name = NonEmptyString::new(last_name.into().trim())
            .map_err(|_| AppError::Validation("last name is required".to_owned()))?;

        Ok(Self {
            first_name,
            last_name,
            phone: None,
            gender: None,
            location: None,
            date_of_birth: None,
        })
    }

    /// Sets the contact phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = optional_text(phone);
        self
    }

    /// Sets the self-described gender.
    #[must_use]
    pub fn with_gender(mut self, gender: Option<String>) -> Self {
        self.gender = optional_text(gender);
        self
    }

    /// Sets the home location.
    #[must_use]
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = optional_text(location);
        self
    }

    /// Sets the date of birth as entered (ISO `YYYY-MM-DD`).
    #[must_use]
    pub fn with_date_of_birth(mut self, date_of_birth: Option<String>) -> Self {
        self.date_of_birth = optional_text(date_of_birth);
        self
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Returns `"first last"` for provider display names.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    /// Returns the phone number, if given.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Returns the gender, if given.
    #[must_use]
    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    /// Returns the location, if given.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the date of birth, if given.
    #[must_use]
    pub fn date_of_birth(&self) -> Option<&str> {
        self.date_of_birth.as_deref()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_accepted() {
        let email = EmailAddress::new("USER@Example.COM");
        assert!(email.is_ok());
        assert_eq!(
            email.unwrap_or_else(|_| panic!("test")).as_str(),
            "user@example.com"
        );
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_with_two_at_signs_is_rejected() {
        assert!(EmailAddress::new("a@b@example.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(EmailAddress::new("  ").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn six_character_password_is_accepted() {
        assert!(validate_password("abc123").is_ok());
    }

    #[test]
    fn very_long_password_is_rejected() {
        let long = "a".repeat(PASSWORD_MAX_LENGTH + 1);
        assert!(validate_password(&long).is_err());
    }

    #[test]
    fn profile_requires_both_names() {
        assert!(ProfileFields::new("Ada", " ").is_err());
        assert!(ProfileFields::new("", "Lovelace").is_err());
    }

    #[test]
    fn profile_drops_blank_optional_fields() -> AppResult<()> {
        let profile = ProfileFields::new(" Ada ", "Lovelace")?
            .with_phone(Some("   ".to_owned()))
            .with_location(Some(" London ".to_owned()));

        assert_eq!(profile.first_name(), "Ada");
        assert_eq!(profile.display_name(), "Ada Lovelace");
        assert_eq!(profile.phone(), None);
        assert_eq!(profile.location(), Some("London"));
        Ok(())
    }
}
