//! Generic, string-keyed single-flight lock registry.
//!
//! A `Mutex<HashMap<String, Arc<Notify>>>` pulled out into one reusable
//! primitive keyed by an arbitrary string, so the block cache can lock by
//! `"{key}-{block_id}"` without re-deriving the map-of-notifies dance inline.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

/// A lock registry keyed by arbitrary names.
///
/// `lock(name)` returns `true` to exactly one caller per name at a time (the
/// *leader*); concurrent callers block until the leader releases and then
/// return `false` (*followers*). The registry carries no payload: followers
/// are expected to re-check whatever shared state the leader was populating
/// (typically a [`BlockStore`](super::BlockStore)) once they wake.
pub struct KeyedSingleFlight {
    in_flight: Mutex<HashMap<String, Arc<Notify>>>,
}

impl Default for KeyedSingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedSingleFlight {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to acquire `name`.
    ///
    /// Returns `true` if no one currently holds `name` (the caller becomes the
    /// leader and must eventually call [`unlock`](Self::unlock)). Returns `false`
    /// after waiting for the current holder to release (the caller is a follower
    /// and holds nothing).
    pub async fn lock(&self, name: &str) -> bool {
        let mut in_flight = self.in_flight.lock().await;
        let notify = match in_flight.get(name) {
            Some(notify) => notify.clone(),
            None => {
                in_flight.insert(name.to_string(), Arc::new(Notify::new()));
                return true;
            }
        };
        // Construct the `Notified` future while still holding the map lock, so
        // it is registered before any concurrent `unlock` (which must take the
        // same lock) can call `notify_waiters`. Constructing it after dropping
        // the guard would leave a window where the wakeup could be missed and
        // the follower would wait forever.
        let notified = notify.notified();
        drop(in_flight);
        // Someone else holds `name`. Wait for their `unlock`, then return as a
        // follower — the registry carries no payload, so the caller is expected
        // to re-read whatever shared state the leader populated.
        notified.await;
        false
    }

    /// Release `name`, waking every follower waiting on it.
    ///
    /// Must be called exactly once by whichever caller's `lock` returned `true`
    /// for this name. Calling `unlock` for a name no one holds is a no-op.
    pub async fn unlock(&self, name: &str) {
        let notify = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(name)
        };
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }
}
