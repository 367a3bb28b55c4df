//! ID generation utilities for feedr
//!
//! Provides identifiers for content units, plus masking for
//! credentials that must never reach the logs in full.

use uuid::Uuid;

/// ID given to the seed unit every transcript starts with
pub const SEED_UNIT_ID: &str = "seed";

/// Generate a unique content unit ID
///
/// Format: UUID v4, hyphenated
/// Example: `67e55044-10b1-426f-9247-bb680e5fe0c8`
pub fn generate_unit_id() -> String {
    Uuid::new_v4().to_string()
}

/// Mask a secret for display, keeping only the first and last four characters
///
/// Secrets of eight characters or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len().max(3));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unit_id_format() {
        let id = generate_unit_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id.split('-').count(), 5);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_unit_id_uniqueness() {
        let id1 = generate_unit_id();
        let id2 = generate_unit_id();
        assert_ne!(id1, id2);
        assert_ne!(id1, SEED_UNIT_ID);
    }

    #[test]
    fn test_mask_secret_long() {
        let masked = mask_secret("123456789:ABCdefGHIjklMNOpqr");
        assert_eq!(masked, "1234…Opqr");
        assert!(!masked.contains("ABCdef"));
    }

    #[test]
    fn test_mask_secret_short() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("abcdefgh"), "********");
        assert_eq!(mask_secret(""), "***");
    }
}
