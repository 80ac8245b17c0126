use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps personal data (national ids, emails) so it never shows up in log output.
///
/// `Debug` and `Display` print a fixed mask. Serialization writes the real value,
/// since API responses and database writes need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_hide_value() {
        let pesel = Masked::new("90010112345".to_string());
        assert_eq!(format!("{:?}", pesel), "********");
        assert_eq!(pesel.to_string(), "********");
        assert_eq!(pesel.expose(), "90010112345");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let email = Masked::new("ann@example.com".to_string());
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"ann@example.com\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_inner(), "ann@example.com");
    }
}
