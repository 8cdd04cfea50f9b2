// Store status - last known reachability of the progress store

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// No call has settled yet
    Unknown = 0,
    Online = 1,
    /// Last call failed; the next successful call catches up
    Offline = 2,
}

impl From<u8> for StoreStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => StoreStatus::Online,
            2 => StoreStatus::Offline,
            _ => StoreStatus::Unknown,
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreStatus::Unknown => "unknown",
            StoreStatus::Online => "online",
            StoreStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Atomic wrapper to share the status between the session and the host
#[derive(Debug, Clone)]
pub struct AtomicStoreStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicStoreStatus {
    pub fn new(status: StoreStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> StoreStatus {
        StoreStatus::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: StoreStatus) {
        self.inner.store(status as u8, Ordering::Relaxed);
    }

    /// Record the outcome of a store call, returning the previous status
    pub fn record<T, E>(&self, outcome: &Result<T, E>) -> StoreStatus {
        let next = if outcome.is_ok() {
            StoreStatus::Online
        } else {
            StoreStatus::Offline
        };
        StoreStatus::from(self.inner.swap(next as u8, Ordering::Relaxed))
    }
}

impl Default for AtomicStoreStatus {
    fn default() -> Self {
        Self::new(StoreStatus::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_last_outcome() {
        let status = AtomicStoreStatus::default();
        assert_eq!(status.get(), StoreStatus::Unknown);

        let previous = status.record::<(), &str>(&Err("down"));
        assert_eq!(previous, StoreStatus::Unknown);
        assert_eq!(status.get(), StoreStatus::Offline);

        let shared = status.clone();
        shared.record::<(), &str>(&Ok(()));
        assert_eq!(status.get(), StoreStatus::Online);
    }

    #[test]
    fn test_unknown_byte_maps_to_unknown() {
        assert_eq!(StoreStatus::from(42), StoreStatus::Unknown);
    }
}
