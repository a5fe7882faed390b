use std::collections::VecDeque;
use std::time::Duration;

use chrono::TimeDelta;
use dashmap::DashMap;

use crate::limits::MAX_TRACKED_REQUESTERS;
use crate::model::LocalInstant;

/// Per-requester sliding windows of admission instants.
///
/// Each key's check-then-record runs under its `DashMap` entry guard, so concurrent
/// callers for one requester cannot both take the last place in the window.
pub struct RateWindows {
    windows: DashMap<String, VecDeque<LocalInstant>>,
    max: usize,
    window: TimeDelta,
}

impl RateWindows {
    pub fn new(max: usize, window: TimeDelta) -> Self {
        Self {
            windows: DashMap::new(),
            max,
            window,
        }
    }

    /// Record an admission at `now` if the window has room. On rejection returns how
    /// long until the oldest entry leaves the window. Rejections are not recorded.
    pub fn try_acquire(&self, key: &str, now: LocalInstant) -> Result<(), Duration> {
        if !self.windows.contains_key(key) && self.windows.len() >= MAX_TRACKED_REQUESTERS {
            self.sweep(now);
            if self.windows.len() >= MAX_TRACKED_REQUESTERS {
                tracing::warn!(requester = %key, "rate window table full, admitting untracked");
                return Ok(());
            }
        }

        let mut entries = self.windows.entry(key.to_string()).or_default();
        prune(&mut entries, now - self.window);

        if entries.len() >= self.max {
            let retry_after = entries
                .front()
                .and_then(|oldest| (*oldest + self.window - now).to_std().ok())
                .unwrap_or_default();
            return Err(retry_after);
        }

        // Out-of-order instants still land sorted.
        let pos = entries.partition_point(|t| *t <= now);
        entries.insert(pos, now);
        Ok(())
    }

    /// Number of admissions for `key` still inside the window at `now`.
    pub fn in_window(&self, key: &str, now: LocalInstant) -> usize {
        let cutoff = now - self.window;
        self.windows
            .get(key)
            .map_or(0, |e| e.iter().filter(|t| **t > cutoff).count())
    }

    /// Drop expired instants and empty windows. Returns how many keys were removed.
    pub fn sweep(&self, now: LocalInstant) -> usize {
        let cutoff = now - self.window;
        let before = self.windows.len();
        self.windows.retain(|_, entries| {
            prune(entries, cutoff);
            !entries.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

fn prune(entries: &mut VecDeque<LocalInstant>, cutoff: LocalInstant) {
    while entries.front().is_some_and(|t| *t <= cutoff) {
        entries.pop_front();
    }
}
