//! Per-sender running aggregates
//!
//! One profile per observed sender address, mutated only by the feature
//! extractor. Entries are never evicted: the map grows for the process
//! lifetime, so repeated senders keep their full history within a run.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Running aggregates for one sender address
#[derive(Debug, Clone)]
pub struct AddressProfile {
    pub tx_count: u64,
    /// Cumulative value in normalized (ETH) units
    pub total_value_eth: f64,
    pub contract_interactions: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Snapshot of the profile-derived features for one observation
#[derive(Debug, Clone, Copy)]
pub struct ProfileView {
    pub tx_count: u64,
    pub total_value_eth: f64,
    pub age_hours: f64,
}

/// Unbounded sender profile map. Not internally synchronized; the owning
/// extractor serializes access behind its state lock.
#[derive(Debug, Default)]
pub struct AddressProfileStore {
    profiles: HashMap<String, AddressProfile>,
}

impl AddressProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observed transaction into the sender's profile and return
    /// the post-update view. Counters are monotonic: tx_count and
    /// total_value never decrease. Age is 0 on the first observation.
    pub fn observe(
        &mut self,
        address: &str,
        value_eth: f64,
        is_contract_creation: bool,
        now: DateTime<Utc>,
    ) -> ProfileView {
        let key = address.to_lowercase();
        let profile = self.profiles.entry(key).or_insert_with(|| AddressProfile {
            tx_count: 0,
            total_value_eth: 0.0,
            contract_interactions: 0,
            first_seen: now,
            last_seen: now,
        });

        profile.tx_count += 1;
        profile.total_value_eth += value_eth;
        profile.last_seen = now;
        if is_contract_creation {
            profile.contract_interactions += 1;
        }

        let age_hours = (now - profile.first_seen).num_milliseconds() as f64 / 3_600_000.0;

        ProfileView {
            tx_count: profile.tx_count,
            total_value_eth: profile.total_value_eth,
            age_hours: age_hours.max(0.0),
        }
    }

    pub fn get(&self, address: &str) -> Option<&AddressProfile> {
        self.profiles.get(&address.to_lowercase())
    }

    /// Number of distinct senders seen
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation() {
        let mut store = AddressProfileStore::new();
        let view = store.observe("0xAbC", 1.0, false, Utc::now());
        assert_eq!(view.tx_count, 1);
        assert_eq!(view.total_value_eth, 1.0);
        assert_eq!(view.age_hours, 0.0);
    }

    #[test]
    fn test_counters_monotonic() {
        let mut store = AddressProfileStore::new();
        let mut last_count = 0;
        let mut last_value = 0.0;
        for i in 0..20 {
            let view = store.observe("0xabc", 0.5, i % 3 == 0, Utc::now());
            assert!(view.tx_count > last_count);
            assert!(view.total_value_eth >= last_value);
            last_count = view.tx_count;
            last_value = view.total_value_eth;
        }
        assert_eq!(last_count, 20);
    }

    #[test]
    fn test_address_case_insensitive() {
        let mut store = AddressProfileStore::new();
        store.observe("0xABCDEF", 1.0, false, Utc::now());
        store.observe("0xabcdef", 1.0, false, Utc::now());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("0xAbCdEf").unwrap().tx_count, 2);
    }

    #[test]
    fn test_contract_interactions_counted() {
        let mut store = AddressProfileStore::new();
        store.observe("0x1", 0.0, true, Utc::now());
        store.observe("0x1", 0.0, false, Utc::now());
        store.observe("0x1", 0.0, true, Utc::now());
        assert_eq!(store.get("0x1").unwrap().contract_interactions, 2);
    }

    #[test]
    fn test_no_eviction() {
        let mut store = AddressProfileStore::new();
        for i in 0..5000 {
            store.observe(&format!("0x{:040x}", i), 0.0, false, Utc::now());
        }
        assert_eq!(store.len(), 5000);
    }
}
