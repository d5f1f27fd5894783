#![forbid(unsafe_code)]

//! Debounced, cancelable pending loads.
//!
//! Each scheduled load gets a fresh [`LoadToken`]. The controller keeps the
//! token of the load it currently wants in the element's hover record; when a
//! load comes due it only fires if that token still matches. Cancelling on
//! exit additionally removes the entry from the queue.
//!
//! Time is a host-supplied monotonic [`Duration`]; the queue never reads a
//! clock itself.

use core::time::Duration;

use crate::content::SourceKey;

/// Identity of one scheduled load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    /// Raw token value (for logs).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A load waiting for its debounce delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad<K> {
    pub token: LoadToken,
    /// Element whose hover scheduled the load.
    pub element: K,
    pub source: SourceKey,
    pub scheduled_at: Duration,
    pub due_at: Duration,
}

/// Pending loads in scheduling order.
#[derive(Debug, Clone)]
pub struct PendingLoads<K> {
    next_token: u64,
    queue: Vec<PendingLoad<K>>,
}

impl<K> Default for PendingLoads<K> {
    fn default() -> Self {
        Self {
            next_token: 1,
            queue: Vec::new(),
        }
    }
}

impl<K: Clone> PendingLoads<K> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a load of `source` for `element`, due `delay` after `now`.
    pub fn schedule(
        &mut self,
        element: K,
        source: SourceKey,
        now: Duration,
        delay: Duration,
    ) -> LoadToken {
        let token = LoadToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.queue.push(PendingLoad {
            token,
            element,
            source,
            scheduled_at: now,
            due_at: now.saturating_add(delay),
        });
        token
    }

    /// Remove a pending load. Returns `false` if it already fired or was
    /// never scheduled.
    pub fn cancel(&mut self, token: LoadToken) -> bool {
        let before = self.queue.len();
        self.queue.retain(|p| p.token != token);
        self.queue.len() != before
    }

    /// Remove and return every load due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<PendingLoad<K>> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.queue.len() {
            if self.queue[i].due_at <= now {
                due.push(self.queue.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due_at, p.token));
        due
    }

    /// Earliest due time among pending loads.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.iter().map(|p| p.due_at).min()
    }

    /// Number of pending loads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
