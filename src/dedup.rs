//! First-seen-wins de-duplication over a run-scoped key set

use crate::config::DedupPolicy;
use crate::record::Record;
use std::collections::HashSet;

/// Composite identity of a record under the given policy
pub fn dedup_key(record: &Record, policy: DedupPolicy) -> String {
    match policy {
        DedupPolicy::SsnDob => format!("{}|{}", record.ssn, record.dob),
        DedupPolicy::NameDobSsn => format!("{}|{}|{}", record.name, record.dob, record.ssn),
    }
}

/// Tracks the keys seen so far in one run.
///
/// Callers must offer records in original line order; the first record with a
/// given key is kept and later ones are rejected without touching it.
#[derive(Debug)]
pub struct Deduplicator {
    policy: DedupPolicy,
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
        }
    }

    /// Returns `true` if the record is new and records its key
    pub fn admit(&mut self, record: &Record) -> bool {
        self.seen.insert(dedup_key(record, self.policy))
    }
}
