//! Round-robin rotation over collector hosts.

/// Rotates through a fixed, ordered host list.
///
/// Owned by the worker thread alone, so the cursor is a plain counter.
#[derive(Debug, Clone)]
pub struct HostRotation {
    hosts: Vec<String>,
    cursor: usize,
}

impl HostRotation {
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts, cursor: 0 }
    }

    /// Host for the next attempt. Advances the cursor exactly once.
    pub fn next_host(&mut self) -> Option<&str> {
        if self.hosts.is_empty() {
            return None;
        }

        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.hosts.len();
        self.hosts.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
