use once_cell::sync::Lazy;
use regex::Regex;

pub fn is_valid_email(string: &str) -> Result<(), String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
        r#"^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$"#
    ).expect("email regex is valid")
    });
    match RE.is_match(&string.to_ascii_lowercase()) {
        true => Ok(()),
        false => Err("invalid".to_string()),
    }
}

/// Names of users, teams and tournaments.
pub fn is_valid_name(string: &str) -> Result<(), String> {
    let trimmed = string.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    if trimmed.chars().count() > 64 {
        return Err("must be at most 64 characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("hello@example.com").is_ok());
        assert!(is_valid_email("Hello@Example.com").is_ok());
        assert!(is_valid_email("hello").is_err());
        assert!(is_valid_email("hello@example.com trailing").is_err());
    }

    #[test]
    fn test_name() {
        assert!(is_valid_name("The Owls").is_ok());
        assert!(is_valid_name("alice smith").is_ok());
        assert!(is_valid_name("ålice").is_ok());
        assert!(is_valid_name("   ").is_err());
        assert!(is_valid_name(&"x".repeat(65)).is_err());
    }
}
