//! Clan name and identity validation.
//!
//! The registry itself only rejects empty names; these rules sit in front of it so a
//! host can bound name length and keep control characters out of the store and logs.

/// Clan name validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClanNameError {
    #[error("Clan name cannot be empty")]
    Empty,

    #[error("Clan name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Clan name cannot start or end with whitespace")]
    InvalidWhitespace,

    #[error("Clan name cannot contain spaces")]
    ContainsSpaces,

    #[error("Clan name contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

/// Identity validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity cannot be empty")]
    Empty,

    #[error("Identity is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Identity contains control characters")]
    ControlCharacters,
}

/// Clan name validation rules
#[derive(Debug, Clone)]
pub struct ClanNameRules {
    pub max_length: usize,
    pub allow_spaces: bool,
}

impl Default for ClanNameRules {
    fn default() -> Self {
        ClanNameRules {
            max_length: 32,
            allow_spaces: false,
        }
    }
}

/// Validate a clan name. Names are case-sensitive and returned unchanged.
pub fn validate_clan_name<'a>(name: &'a str, rules: &ClanNameRules) -> Result<&'a str, ClanNameError> {
    if name.is_empty() {
        return Err(ClanNameError::Empty);
    }
    if name.chars().count() > rules.max_length {
        return Err(ClanNameError::TooLong { max: rules.max_length });
    }
    if name.trim() != name {
        return Err(ClanNameError::InvalidWhitespace);
    }
    if !rules.allow_spaces && name.chars().any(char::is_whitespace) {
        return Err(ClanNameError::ContainsSpaces);
    }
    let control_chars: Vec<String> = name
        .chars()
        .filter(|c| c.is_control())
        .map(|c| format!("\\u{{{:04x}}}", c as u32))
        .collect();
    if !control_chars.is_empty() {
        return Err(ClanNameError::InvalidCharacters { chars: control_chars.join(", ") });
    }
    Ok(name)
}

/// Validate an identity string supplied by the host.
pub fn validate_identity(identity: &str, max_length: usize) -> Result<&str, IdentityError> {
    if identity.is_empty() {
        return Err(IdentityError::Empty);
    }
    if identity.chars().count() > max_length {
        return Err(IdentityError::TooLong { max: max_length });
    }
    if identity.chars().any(char::is_control) {
        return Err(IdentityError::ControlCharacters);
    }
    Ok(identity)
}
