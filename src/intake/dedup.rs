use dashmap::DashMap;

use crate::model::{LocalInstant, StoredRequest};

/// Whether two descriptions describe the same logical submission.
///
/// Both empty is a match. Otherwise both must be non-empty and either one contains
/// the other (case-insensitive, trimmed), or both are longer than `min_chars` and
/// share their first `prefix_chars` characters.
pub fn is_same_submission(a: Option<&str>, b: Option<&str>, prefix_chars: usize, min_chars: usize) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return true,
        (false, false) => {}
        _ => return false,
    }
    if a.contains(&b) || b.contains(&a) {
        return true;
    }
    if a.chars().count() > min_chars && b.chars().count() > min_chars {
        return a.chars().take(prefix_chars).eq(b.chars().take(prefix_chars));
    }
    false
}

fn normalize(s: Option<&str>) -> String {
    s.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

/// Requests this process admitted and persisted, kept for the dedup horizon so a
/// store that lags behind its own writes still catches a double submit.
#[derive(Default)]
pub struct RecentAdmissions {
    by_requester: DashMap<String, Vec<StoredRequest>>,
}

impl RecentAdmissions {
    pub fn remember(&self, request: StoredRequest) {
        self.by_requester
            .entry(request.requester_key.clone())
            .or_default()
            .push(request);
    }

    /// Remembered requests from `requester_key` created at or after `since`.
    pub fn since(&self, requester_key: &str, since: LocalInstant) -> Vec<StoredRequest> {
        self.by_requester.get(requester_key).map_or_else(Vec::new, |reqs| {
            reqs.iter().filter(|r| r.created_at >= since).cloned().collect()
        })
    }

    /// Forget everything created before `cutoff`. Returns how many entries were dropped.
    pub fn sweep(&self, cutoff: LocalInstant) -> usize {
        let mut dropped = 0;
        self.by_requester.retain(|_, reqs| {
            let before = reqs.len();
            reqs.retain(|r| r.created_at >= cutoff);
            dropped += before - reqs.len();
            !reqs.is_empty()
        });
        dropped
    }

    pub fn len(&self) -> usize {
        self.by_requester.iter().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_requester.is_empty()
    }
}
