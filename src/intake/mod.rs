mod dedup;
mod window;

pub use dedup::{RecentAdmissions, is_same_submission};
pub use window::RateWindows;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::{IntakeError, StoreError};
use crate::limits::{MAX_ADMISSIONS_PER_WINDOW, MAX_DESCRIPTION_LEN, MAX_REQUESTER_KEY_LEN};
use crate::model::*;
use crate::observability;
use crate::store::RequestStore;

/// Thresholds for rate limiting and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    /// Admissions allowed per requester inside `rate_window`.
    pub max_per_window: usize,
    pub rate_window: TimeDelta,
    /// How far back prior requests are compared for duplicates.
    pub dedup_window: TimeDelta,
    pub prefix_chars: usize,
    /// Both descriptions must be longer than this for the prefix rule to apply.
    pub min_chars: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_per_window: 3,
            rate_window: TimeDelta::seconds(60),
            dedup_window: TimeDelta::seconds(300),
            prefix_chars: 20,
            min_chars: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    RateLimited { retry_after: Duration },
}

/// Outcome of `IntakeGuard::admit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Create the request. Its instant has been recorded in the rate window.
    Admit,
    /// Same logical submission as an existing request; reuse its id.
    Duplicate(RequestId),
    Reject(RejectReason),
}

/// Successful submission: a new request, or the one it duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Created(RequestId),
    Existing(RequestId),
}

impl Submission {
    pub fn id(&self) -> &str {
        match self {
            Submission::Created(id) | Submission::Existing(id) => id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Submission::Created(_))
    }
}

/// Guards request creation against double submits and bursts.
///
/// The guard decides; it never persists. `submit` wires the decision to a
/// `RequestStore`. State is process-local and advisory.
pub struct IntakeGuard {
    policy: IntakePolicy,
    windows: RateWindows,
    recent: RecentAdmissions,
    /// One submit at a time per requester: lookup, decision and persist.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl IntakeGuard {
    pub fn new(mut policy: IntakePolicy) -> Self {
        let max = policy.max_per_window.clamp(1, MAX_ADMISSIONS_PER_WINDOW);
        if max != policy.max_per_window {
            tracing::warn!(requested = policy.max_per_window, max, "admissions per window clamped");
            policy.max_per_window = max;
        }
        Self {
            windows: RateWindows::new(policy.max_per_window, policy.rate_window),
            recent: RecentAdmissions::default(),
            in_flight: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Start of the duplicate horizon for a request created at `created_at`.
    pub fn dedup_since(&self, created_at: LocalInstant) -> LocalInstant {
        created_at - self.policy.dedup_window
    }

    /// Decide on `request` given the store's view of the requester's recent requests.
    ///
    /// A failed lookup is logged and treated as "no prior requests". Duplicates are
    /// resolved before the rate window, so a retry of an existing request never counts
    /// against the requester.
    pub fn admit(&self, request: &IntakeRequest, prior: Result<Vec<StoredRequest>, StoreError>) -> Admission {
        let key = request.requester_key.as_str();
        let since = self.dedup_since(request.created_at);

        let mut candidates = match prior {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!(requester = %key, error = %e, "duplicate lookup failed, continuing without it");
                metrics::counter!(observability::DEDUP_LOOKUP_FAILURES_TOTAL).increment(1);
                Vec::new()
            }
        };
        candidates.extend(self.recent.since(key, since));
        candidates.retain(|p| p.requester_key == key && p.created_at >= since);
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        candidates.dedup_by(|a, b| a.id == b.id);

        let existing = candidates.iter().find(|p| {
            is_same_submission(
                p.description.as_deref(),
                request.description.as_deref(),
                self.policy.prefix_chars,
                self.policy.min_chars,
            )
        });
        if let Some(existing) = existing {
            tracing::debug!(requester = %key, id = %existing.id, "duplicate submission");
            metrics::counter!(observability::INTAKE_OUTCOMES_TOTAL, "outcome" => "duplicate").increment(1);
            return Admission::Duplicate(existing.id.clone());
        }

        match self.windows.try_acquire(key, request.created_at) {
            Ok(()) => {
                metrics::counter!(observability::INTAKE_OUTCOMES_TOTAL, "outcome" => "admitted").increment(1);
                Admission::Admit
            }
            Err(retry_after) => {
                tracing::info!(requester = %key, retry_after_secs = retry_after.as_secs(), "rate limited");
                metrics::counter!(observability::INTAKE_OUTCOMES_TOTAL, "outcome" => "rate_limited").increment(1);
                Admission::Reject(RejectReason::RateLimited { retry_after })
            }
        }
    }

    /// Remember a request the store accepted so later duplicates match it even if
    /// the store has not caught up.
    pub fn record_persisted(&self, id: &str, request: &IntakeRequest) {
        self.recent.remember(StoredRequest {
            id: id.to_string(),
            requester_key: request.requester_key.clone(),
            description: request.description.clone(),
            created_at: request.created_at,
        });
    }

    /// Validate, look up prior requests, decide, and persist if admitted.
    ///
    /// Submissions from one requester are serialized, so a concurrent double submit
    /// sees the first one's request and resolves to its id.
    pub async fn submit(
        &self,
        business_id: &str,
        store: &dyn RequestStore,
        request: IntakeRequest,
    ) -> Result<Submission, IntakeError> {
        validate(&request)?;

        let lock = self
            .in_flight
            .entry(request.requester_key.clone())
            .or_default()
            .clone();
        let _held = lock.lock().await;

        let since = self.dedup_since(request.created_at);
        let prior = store
            .fetch_recent_requests(business_id, &request.requester_key, since)
            .await;

        match self.admit(&request, prior) {
            Admission::Admit => {
                let id = store.persist(business_id, &request).await?;
                self.record_persisted(&id, &request);
                tracing::info!(business = %business_id, requester = %request.requester_key, id = %id, "request created");
                Ok(Submission::Created(id))
            }
            Admission::Duplicate(id) => Ok(Submission::Existing(id)),
            Admission::Reject(RejectReason::RateLimited { retry_after }) => {
                Err(IntakeError::RateLimited { retry_after })
            }
        }
    }

    /// Drop expired window entries and remembered admissions. Returns how many
    /// requesters and remembered requests were dropped.
    pub fn sweep(&self, now: LocalInstant) -> usize {
        // Only the map holds an idle lock.
        self.in_flight.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.windows.sweep(now) + self.recent.sweep(self.dedup_since(now))
    }

    pub fn tracked_requesters(&self) -> usize {
        self.windows.tracked()
    }
}

fn validate(request: &IntakeRequest) -> Result<(), IntakeError> {
    if request.requester_key.is_empty() {
        return Err(IntakeError::InvalidRequest("requester key is empty"));
    }
    if request.requester_key.len() > MAX_REQUESTER_KEY_LEN {
        return Err(IntakeError::LimitExceeded("requester key too long"));
    }
    if request
        .description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
    {
        return Err(IntakeError::LimitExceeded("description too long"));
    }
    Ok(())
}
