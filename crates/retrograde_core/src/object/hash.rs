//! # Name Hashing
//!
//! Object classes, static-variable blocks and editable variables are looked
//! up by a 128-bit digest of their name rather than by string comparison.

use siphasher::sip128::{Hasher128, SipHasher24};
use std::fmt;
use std::hash::Hasher;

/// Fixed keys so that digests are stable across runs and platforms.
const NAME_KEY_0: u64 = 0x5245_5452_4f47_5244;
const NAME_KEY_1: u64 = 0x4f42_4a45_4354_5331;

/// A 128-bit name digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NameHash([u32; 4]);

impl NameHash {
    /// Hashes a name. The digest covers the exact bytes of `name`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of(name: &str) -> Self {
        let mut hasher = SipHasher24::new_with_keys(NAME_KEY_0, NAME_KEY_1);
        hasher.write(name.as_bytes());
        let digest = hasher.finish128();

        Self([
            digest.h1 as u32,
            (digest.h1 >> 32) as u32,
            digest.h2 as u32,
            (digest.h2 >> 32) as u32,
        ])
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}{:08x}{:08x}{:08x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(NameHash::of("Ring"), NameHash::of("Ring"));
    }

    #[test]
    fn test_hash_distinguishes_names() {
        assert_ne!(NameHash::of("Ring"), NameHash::of("Rings"));
        assert_ne!(NameHash::of("Ring"), NameHash::of("ring"));
        assert_ne!(NameHash::of(""), NameHash::of("Ring"));
    }

    #[test]
    fn test_display_is_hex() {
        let text = NameHash::of("Player").to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
