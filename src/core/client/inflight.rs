//! Registry of requests currently on the wire.
//!
//! Each slot holds a weak handle to a [`Shared`] future. Callers attaching to
//! a key clone the strong handle and await the same outcome. The slot is
//! released when the shared future settles, or when every caller has dropped
//! it (which also drops the network call).

use crate::core::{ApiError, EndpointKey, Payload};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) type CallFuture = BoxFuture<'static, Result<Payload, ApiError>>;
pub(crate) type SharedCall = Shared<CallFuture>;

struct Slot {
    id: u64,
    call: WeakShared<CallFuture>,
}

#[derive(Default)]
pub(crate) struct InFlightTable {
    next_id: AtomicU64,
    slots: Mutex<HashMap<EndpointKey, Slot>>,
}

impl InFlightTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<EndpointKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to the call running for `key`, if any.
    pub(crate) fn attach(&self, key: &EndpointKey) -> Option<SharedCall> {
        self.lock().get(key).and_then(|slot| slot.call.upgrade())
    }

    /// Attach to the call running for `key`, or register the one built by
    /// `start`. The check and the insert happen under one lock, so at most
    /// one call per key is ever registered.
    pub(crate) fn join_or_start<F>(self: &Arc<Self>, key: EndpointKey, start: F) -> SharedCall
    where
        F: FnOnce() -> CallFuture,
    {
        let mut slots = self.lock();
        if let Some(call) = slots.get(&key).and_then(|slot| slot.call.upgrade()) {
            return call;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let release = SlotRelease {
            table: Arc::clone(self),
            key: key.clone(),
            id,
        };
        let work = start();
        let call = async move {
            let _release = release;
            work.await
        }
        .boxed()
        .shared();

        if let Some(weak) = call.downgrade() {
            slots.insert(key, Slot { id, call: weak });
        }
        call
    }

    /// Number of calls currently on the wire.
    pub(crate) fn len(&self) -> usize {
        // Strong handles are dropped only after the lock is released: dropping
        // the last one runs `SlotRelease`, which locks the table again.
        let live: Vec<SharedCall> = self
            .lock()
            .values()
            .filter_map(|slot| slot.call.upgrade())
            .collect();
        live.len()
    }
}

/// Frees a slot when its call settles or is dropped.
///
/// A slot re-registered under the same key by a newer call is left alone.
struct SlotRelease {
    table: Arc<InFlightTable>,
    key: EndpointKey,
    id: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut slots = self.table.lock();
        if slots.get(&self.key).is_some_and(|slot| slot.id == self.id) {
            slots.remove(&self.key);
        }
    }
}
