use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Tickets {
    issued: u64,
    latest: HashMap<String, u64>,
}

/// Hands out increasing tickets per plan key so that a model reply which
/// arrives after a newer request or a manual edit of the same plan can be
/// recognised and dropped instead of overwriting the newer state.
///
/// Tickets come from one counter shared by all keys, so a key can be
/// forgotten on reset without an old ticket ever matching again.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    tickets: Mutex<Tickets>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new change to `key` and return its ticket.
    pub fn begin(&self, key: &str) -> u64 {
        let mut tickets = self.tickets.lock().unwrap_or_else(|e| e.into_inner());
        tickets.issued += 1;
        let ticket = tickets.issued;
        tickets.latest.insert(key.to_string(), ticket);
        ticket
    }

    /// True when nothing touched `key` after `ticket` was issued.
    pub fn is_latest(&self, key: &str, ticket: u64) -> bool {
        let tickets = self.tickets.lock().unwrap_or_else(|e| e.into_inner());
        tickets.latest.get(key).map_or(false, |current| *current == ticket)
    }

    /// Drop `key` once its plan is gone. Pending tickets for it become stale.
    pub fn forget(&self, key: &str) {
        let mut tickets = self.tickets.lock().unwrap_or_else(|e| e.into_inner());
        tickets.latest.remove(key);
    }

    pub fn tracked_keys(&self) -> usize {
        let tickets = self.tickets.lock().unwrap_or_else(|e| e.into_inner());
        tickets.latest.len()
    }
}
