use std::fmt;
use std::str::FromStr;

/// A required booking field: present and not blank.
///
/// The value is kept exactly as submitted.
#[derive(Debug, PartialEq, Clone)]
pub struct RequiredText(String);

impl FromStr for RequiredText {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err("Value cannot be blank".into());
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for RequiredText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequiredText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
