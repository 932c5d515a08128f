//! Room Identifiers
//!
//! Rooms are named by user-chosen strings, matched case-insensitively.

use std::fmt;

/// Longest accepted room identifier
const MAX_LENGTH: usize = 32;

/// A normalized room identifier that can be shared to join a room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Parse a room id from user input.
    ///
    /// Normalizes to uppercase and rejects empty or overlong input.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() || normalized.len() > MAX_LENGTH {
            return None;
        }

        Some(RoomId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_normalizes_case() {
        let id = RoomId::parse("party").unwrap();
        assert_eq!(id.as_str(), "PARTY");

        let id = RoomId::parse("  mix 42 ").unwrap();
        assert_eq!(id.as_str(), "MIX42");
    }

    #[test]
    fn test_room_id_rejects_empty_and_overlong() {
        assert!(RoomId::parse("").is_none());
        assert!(RoomId::parse("   ").is_none());
        assert!(RoomId::parse(&"X".repeat(40)).is_none());
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(RoomId::parse("Party"), RoomId::parse("PARTY"));
    }
}
