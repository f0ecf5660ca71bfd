use once_cell::sync::Lazy;
use regex::Regex;
use crate::domain::sanitize_input;

// local@domain.tld, with no whitespace and a single `@`
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Email pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Checks the raw, untrimmed input against the email shape, so that the
    /// relay accepts exactly what the form accepts.
    pub fn parse(s: &str) -> Result<Self, String> {
        if Self::is_valid(s) {
            Ok(Self(sanitize_input(s)))
        } else {
            Err(format!("{} is not a valid email address.", s))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        EMAIL_PATTERN.is_match(s)
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
