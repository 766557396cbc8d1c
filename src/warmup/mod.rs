//! Delayed warm-up tasks.
//!
//! Each user has at most one pending warm-up. Tasks are detached tokio tasks
//! that can be aborted when the user leaves before the delay has elapsed.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use teloxide::types::UserId;
use tokio::task::AbortHandle;
use tracing::debug;

/// Pending task plus the ticket that identifies it.
type Pending = (u64, AbortHandle);

/// Tracks pending warm-up tasks by user id.
#[derive(Clone, Default)]
pub struct WarmupScheduler {
    pending: Arc<DashMap<UserId, Pending>>,
    tickets: Arc<AtomicU64>,
}

impl WarmupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` after `delay` unless something is already pending for the user.
    ///
    /// Returns `false` when a task for `user_id` already exists.
    pub fn schedule<F>(&self, user_id: UserId, delay: Duration, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.pending.entry(user_id) {
            Entry::Occupied(_) => {
                debug!("Warm-up for {} already pending", user_id);
                false
            }
            Entry::Vacant(slot) => {
                let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
                let pending = Arc::clone(&self.pending);

                let handle = tokio::spawn(async move {
                    let _guard = PendingGuard {
                        pending,
                        user_id,
                        ticket,
                    };
                    tokio::time::sleep(delay).await;
                    job.await;
                });

                slot.insert((ticket, handle.abort_handle()));
                debug!("Scheduled warm-up for {} in {:?}", user_id, delay);
                true
            }
        }
    }

    /// Abort the pending task for `user_id`. Returns whether one existed.
    pub fn cancel(&self, user_id: UserId) -> bool {
        match self.pending.remove(&user_id) {
            Some((_, (_, handle))) => {
                handle.abort();
                debug!("Cancelled warm-up for {}", user_id);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, user_id: UserId) -> bool {
        self.pending.contains_key(&user_id)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Clears the task's own entry however the task ends (done, aborted or panicked).
struct PendingGuard {
    pending: Arc<DashMap<UserId, Pending>>,
    user_id: UserId,
    ticket: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.pending.remove_if(&self.user_id, |_, (t, _)| *t == ticket);
    }
}

impl std::fmt::Debug for WarmupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmupScheduler")
            .field("pending", &self.pending.len())
            .finish()
    }
}
