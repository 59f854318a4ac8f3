//! Identifiers for chains and slots.
//!
//! Chain ids are durable: they are written to the saved blob and used to find
//! a chain's record again on save. Slot ids are ephemeral and regenerated
//! whenever a chain is decoded.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an [`EffectSlot`](crate::EffectSlot).
///
/// Stable across parameter edits and reordering, not across save/reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    /// Allocates a fresh slot id.
    pub fn next() -> Self {
        Self(NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Durable identifier of a [`Chain`](crate::Chain).
///
/// Freshly created chains get an uppercase hyphenated UUID-v4 string, the same
/// shape the saved data already contains (e.g. `2D7C0612-5D96-489B-8DD6-CAFBB3AA0F4F`).
/// Any string read back from storage is accepted verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(String);

impl ChainId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        let mut bytes: [u8; 16] = rand::thread_rng().r#gen();
        // version 4, RFC 4122 variant
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;

        let mut s = String::with_capacity(36);
        for (i, b) in bytes.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                s.push('-');
            }
            s.push_str(&format!("{b:02X}"));
        }
        Self(s)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_ids_are_unique() {
        let a = SlotId::next();
        let b = SlotId::next();
        assert_ne!(a, b);
        assert!(b.index() > a.index());
    }

    #[test]
    fn chain_id_has_uuid_shape() {
        let id = ChainId::generate();
        let s = id.as_str();
        assert_eq!(s.len(), 36);
        let groups: Vec<&str> = s.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(groups[2].starts_with('4'), "version nibble: {s}");
        assert!(s.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert!(!s.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn chain_ids_differ() {
        assert_ne!(ChainId::generate(), ChainId::generate());
    }

    #[test]
    fn chain_id_from_stored_string() {
        let id = ChainId::from("E9E862FA-C72E-4DB8-B164-C43FF4B6E77F");
        assert_eq!(id.to_string(), "E9E862FA-C72E-4DB8-B164-C43FF4B6E77F");
    }
}
