// src/util.rs — Shared utility functions

/// Truncate a string for display/logging (UTF-8 safe).
///
/// Returns a substring of at most `max_len` bytes, ensuring the cut
/// point falls on a valid UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// The words of a button label without leading emoji ("🤒 Fever" -> "Fever").
pub fn label_text(label: &str) -> Option<&str> {
    let text = label
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim();
    (!text.is_empty()).then_some(text)
}

/// A random number for picking display content (not for secrets).
///
/// Falls back to the clock when the OS generator is unavailable.
pub fn random_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(_) => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "café" is 5 bytes (é = 2 bytes), truncating at 4 should not split é
        let s = "café";
        let t = truncate_str(s, 4);
        assert_eq!(t, "caf");
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate_str("", 5), "");
    }

    #[test]
    fn test_truncate_zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_label_text() {
        assert_eq!(label_text("🤒 Fever"), Some("Fever"));
        assert_eq!(label_text("💔 Chest Pain"), Some("Chest Pain"));
        assert_eq!(label_text("headache"), Some("headache"));
        assert_eq!(label_text("🔥 "), None);
    }

    #[test]
    fn test_random_seed_varies() {
        let seeds: std::collections::HashSet<u64> = (0..8).map(|_| random_seed()).collect();
        assert!(seeds.len() > 1);
    }
}
