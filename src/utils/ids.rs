//! Short random identifiers for conversations, messages, and attachments.

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 8;

/// Generate an 8-character lowercase base-36 identifier.
///
/// Falls back to a clock-derived seed when the OS random source is
/// unavailable so callers never have to handle an error for an id.
pub fn create_id() -> String {
    let mut bytes = [0_u8; ID_LEN];
    if getrandom::fill(&mut bytes).is_err() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (nanos >> (i * 8)) as u8 ^ (i as u8).wrapping_mul(31);
        }
    }

    bytes
        .iter()
        .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_base36_and_fixed_length() {
        let id = create_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn ids_do_not_repeat_in_practice() {
        let ids: HashSet<String> = (0..500).map(|_| create_id()).collect();
        assert_eq!(ids.len(), 500);
    }
}
