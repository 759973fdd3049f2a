//! Local per-file envelope cache (§3 "Symmetric envelope (per file,
//! client-side only)"). Keyed by `file_id`; concurrent operations on the
//! same `file_id` are last-writer-wins, matching spec.md §5's requirement
//! for the client's only shared mutable resource.

use dashmap::DashMap;
use fileshare_crypto::Envelope;

#[derive(Default)]
pub struct EnvelopeStore {
    envelopes: DashMap<i64, Envelope>,
}

impl EnvelopeStore {
    pub fn new() -> Self {
        Self { envelopes: DashMap::new() }
    }

    /// Cache the envelope produced by an upload, or the envelope recovered
    /// by unwrapping a share. A later call for the same `file_id` replaces
    /// the earlier one.
    pub fn insert(&self, file_id: i64, envelope: Envelope) {
        self.envelopes.insert(file_id, envelope);
    }

    pub fn get(&self, file_id: i64) -> Option<Envelope> {
        self.envelopes.get(&file_id).map(|entry| entry.clone())
    }

    pub fn remove(&self, file_id: i64) {
        self.envelopes.remove(&file_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let store = EnvelopeStore::new();
        let envelope = Envelope::generate();
        store.insert(1, envelope.clone());
        let fetched = store.get(1).unwrap();
        assert_eq!(fetched.fek.as_bytes(), envelope.fek.as_bytes());
    }

    #[test]
    fn missing_file_id_returns_none() {
        let store = EnvelopeStore::new();
        assert!(store.get(42).is_none());
    }

    #[test]
    fn later_insert_wins() {
        let store = EnvelopeStore::new();
        let first = Envelope::generate();
        let second = Envelope::generate();
        store.insert(1, first);
        store.insert(1, second.clone());
        assert_eq!(store.get(1).unwrap().fek.as_bytes(), second.fek.as_bytes());
    }
}
