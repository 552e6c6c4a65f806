use crate::TypeError;
use serde::Serialize;
use std::fmt;

/// A trimmed, non-blank display name as typed into the configuration screen.
///
/// Registry entries keep the name exactly as shown to users; identifiers are derived from it
/// separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns `TypeError::Empty` if `input` is blank after trimming.
    pub fn new(input: &str) -> Result<Self, TypeError> {
        match input.trim() {
            "" => Err(TypeError::Empty),
            trimmed => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  EPSP: Bab El Oued \n").unwrap();
        assert_eq!(text.as_str(), "EPSP: Bab El Oued");
        assert_eq!(text.to_string(), "EPSP: Bab El Oued");
    }

    #[test]
    fn rejects_whitespace_only() {
        assert_eq!(NonEmptyText::new(" \t ").unwrap_err(), TypeError::Empty);
    }

    #[test]
    fn serialises_as_plain_string() {
        let text = NonEmptyText::new("EPSP: Casbah").unwrap();
        assert_eq!(serde_json::to_value(&text).unwrap(), "EPSP: Casbah");
    }
}
