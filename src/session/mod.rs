// src/session/mod.rs — Per-session state: telemetry and conversation history

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::provider::Message;
use crate::telemetry::TelemetryDataset;

struct SessionEntry {
    telemetry: TelemetryDataset,
    history: Vec<Message>,
    last_access: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            telemetry: TelemetryDataset::default(),
            history: Vec::new(),
            last_access: Instant::now(),
        }
    }
}

/// Registry of live sessions behind one lock.
///
/// Sessions are created implicitly on first use; an unknown id reads as
/// empty state, never as an error. Eviction is lazy: idle entries past
/// `idle_ttl` are swept on every operation, and when an insert would grow
/// the map past `max_sessions` the least-recently-used entry is dropped.
/// The lock is never held across an await point.
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, SessionEntry>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_sessions,
            idle_ttl,
        }
    }

    /// Replace the session's telemetry. A fresh upload always supersedes
    /// the previous dataset; nothing is merged.
    pub fn put_telemetry(&self, session_id: &str, dataset: TelemetryDataset) {
        let mut entries = self.lock();
        self.sweep(&mut entries);
        self.reserve_slot(&mut entries, session_id);
        let entry = entries
            .entry(session_id.to_string())
            .or_insert_with(SessionEntry::new);
        entry.telemetry = dataset;
        entry.last_access = Instant::now();
    }

    /// The session's telemetry, or an empty dataset for an unknown id.
    pub fn telemetry(&self, session_id: &str) -> TelemetryDataset {
        let mut entries = self.lock();
        self.sweep(&mut entries);
        match entries.get_mut(session_id) {
            Some(entry) => {
                entry.last_access = Instant::now();
                entry.telemetry.clone()
            }
            None => TelemetryDataset::default(),
        }
    }

    /// The session's conversation so far, empty for an unknown id.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        let mut entries = self.lock();
        self.sweep(&mut entries);
        match entries.get_mut(session_id) {
            Some(entry) => {
                entry.last_access = Instant::now();
                entry.history.clone()
            }
            None => Vec::new(),
        }
    }

    /// Replace the session's conversation with the completed exchange.
    pub fn put_history(&self, session_id: &str, turns: Vec<Message>) {
        let mut entries = self.lock();
        self.sweep(&mut entries);
        self.reserve_slot(&mut entries, session_id);
        let entry = entries
            .entry(session_id.to_string())
            .or_insert_with(SessionEntry::new);
        entry.history = turns;
        entry.last_access = Instant::now();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(&self, entries: &mut HashMap<String, SessionEntry>) {
        entries.retain(|_, entry| entry.last_access.elapsed() < self.idle_ttl);
    }

    fn reserve_slot(&self, entries: &mut HashMap<String, SessionEntry>, session_id: &str) {
        if entries.contains_key(session_id) || entries.len() < self.max_sessions {
            return;
        }
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            tracing::debug!(session_id = %id, "evicting least-recently-used session");
            entries.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryRecord;

    fn dataset_with(msg_type: &str) -> TelemetryDataset {
        let mut dataset = TelemetryDataset::default();
        dataset.push(msg_type.to_string(), TelemetryRecord::new());
        dataset
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(16, Duration::from_secs(3600))
    }

    #[test]
    fn test_unknown_session_reads_empty() {
        let reg = registry();
        assert!(reg.telemetry("nope").is_empty());
        assert!(reg.history("nope").is_empty());
        // reads never create entries
        assert!(reg.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let reg = registry();
        reg.put_telemetry("s1", dataset_with("GPS"));
        assert!(reg.telemetry("s1").records("GPS").is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_second_upload_replaces_dataset() {
        let reg = registry();
        reg.put_telemetry("s1", dataset_with("GPS"));
        reg.put_telemetry("s1", dataset_with("BAT"));

        let current = reg.telemetry("s1");
        assert!(current.records("GPS").is_none());
        assert!(current.records("BAT").is_some());
    }

    #[test]
    fn test_history_roundtrip() {
        let reg = registry();
        let turns = vec![
            Message::system("you are a UAV assistant"),
            Message::user("how high did it fly?"),
            Message::assistant("about 120 meters"),
        ];
        reg.put_history("s1", turns.clone());
        assert_eq!(reg.history("s1"), turns);
    }

    #[test]
    fn test_telemetry_and_history_live_on_one_entry() {
        let reg = registry();
        reg.put_telemetry("s1", dataset_with("GPS"));
        reg.put_history("s1", vec![Message::user("hi")]);
        assert_eq!(reg.len(), 1);
        assert!(reg.telemetry("s1").records("GPS").is_some());
        assert_eq!(reg.history("s1").len(), 1);
    }

    #[test]
    fn test_idle_ttl_sweeps_entries() {
        let reg = SessionRegistry::new(16, Duration::ZERO);
        reg.put_telemetry("s1", dataset_with("GPS"));
        // ttl of zero means the entry is already stale on the next call
        assert!(reg.telemetry("s1").is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let reg = SessionRegistry::new(2, Duration::from_secs(3600));
        reg.put_telemetry("a", dataset_with("GPS"));
        std::thread::sleep(Duration::from_millis(2));
        reg.put_telemetry("b", dataset_with("GPS"));
        std::thread::sleep(Duration::from_millis(2));
        // touch "a" so "b" becomes the oldest
        let _ = reg.telemetry("a");
        std::thread::sleep(Duration::from_millis(2));

        reg.put_telemetry("c", dataset_with("GPS"));
        assert_eq!(reg.len(), 2);
        assert!(!reg.telemetry("a").is_empty());
        assert!(reg.telemetry("b").is_empty());
        assert!(!reg.telemetry("c").is_empty());
    }

    #[test]
    fn test_existing_key_never_triggers_eviction() {
        let reg = SessionRegistry::new(1, Duration::from_secs(3600));
        reg.put_telemetry("a", dataset_with("GPS"));
        reg.put_telemetry("a", dataset_with("BAT"));
        assert_eq!(reg.len(), 1);
        assert!(reg.telemetry("a").records("BAT").is_some());
    }
}
