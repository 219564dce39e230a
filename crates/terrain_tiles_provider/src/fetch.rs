use crate::Response;

use terrain_tiles_core::TileKey;
use terrain_tiles_storage::SmallKeyHashMap;

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A fetch that any number of waiters can await. Every waiter sees the same `Response`.
pub type SharedFetch = Shared<BoxFuture<'static, Response>>;

/// De-duplicates concurrent fetches of the same tile.
///
/// While a fetch for a key is in flight, every further request for that key gets the same `SharedFetch`. The entry is
/// dropped as soon as the fetch settles, whatever the outcome, so a later request goes to the network again unless the
/// caller cached the result.
#[derive(Clone, Default)]
pub struct FetchCoordinator {
    in_flight: Arc<Mutex<SmallKeyHashMap<TileKey, (u64, SharedFetch)>>>,
    issued: Arc<AtomicU64>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SmallKeyHashMap<TileKey, (u64, SharedFetch)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins the in-flight fetch for `key`, or starts one with `issue`.
    ///
    /// `issue` runs while the coordinator is locked, so it must only build the future and must not call back into the
    /// coordinator.
    pub fn fetch_once(
        &self,
        key: TileKey,
        issue: impl FnOnce() -> BoxFuture<'static, Response>,
    ) -> SharedFetch {
        let mut in_flight = self.lock();
        if let Some((_, fetch)) = in_flight.get(&key) {
            tracing::trace!(tile = %key, "joining in-flight fetch");
            return fetch.clone();
        }

        let id = self.issued.fetch_add(1, Ordering::Relaxed);
        let request = issue();
        let map = Arc::clone(&self.in_flight);
        let fetch = async move {
            let response = request.await;
            let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
            // Only remove our own entry; `forget_all` may have let a newer fetch take the slot.
            if map.get(&key).map_or(false, |(entry_id, _)| *entry_id == id) {
                map.remove(&key);
            }
            response
        }
        .boxed()
        .shared();

        in_flight.insert(key, (id, fetch.clone()));

        fetch
    }

    #[inline]
    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.lock().contains_key(key)
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Total number of fetches started, not counting joins.
    #[inline]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Forgets every in-flight fetch. Current waiters still get their responses.
    pub fn forget_all(&self) {
        self.lock().clear();
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
