use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::error::StoreError;
use crate::model::*;

/// Read side of the booking store: occupancy projected for a date range.
#[async_trait]
pub trait OccupancySource: Send + Sync {
    async fn fetch_occupancy(&self, business_id: &str, range: DateRange) -> Result<Vec<OccupancyRecord>, StoreError>;
}

/// Where intake requests end up once admitted.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Requests from `requester_key` created at or after `since`, newest first.
    async fn fetch_recent_requests(
        &self,
        business_id: &str,
        requester_key: &str,
        since: LocalInstant,
    ) -> Result<Vec<StoredRequest>, StoreError>;

    async fn persist(&self, business_id: &str, request: &IntakeRequest) -> Result<RequestId, StoreError>;
}

/// In-process store backing both collaborator traits. Used by the binary and tests.
pub struct MemoryStore {
    occupancy: DashMap<BusinessId, Vec<OccupancyRecord>>,
    requests: DashMap<BusinessId, Vec<StoredRequest>>,
    fail_occupancy: AtomicBool,
    fail_lookups: AtomicBool,
    fail_persist: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            occupancy: DashMap::new(),
            requests: DashMap::new(),
            fail_occupancy: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
            fail_persist: AtomicBool::new(false),
        }
    }

    pub fn insert_occupancy(&self, business_id: &str, records: impl IntoIterator<Item = OccupancyRecord>) {
        self.occupancy
            .entry(business_id.to_string())
            .or_default()
            .extend(records);
    }

    pub fn request_count(&self, business_id: &str) -> usize {
        self.requests.get(business_id).map_or(0, |r| r.len())
    }

    // ── Fault injection ──────────────────────────────────────

    pub fn set_fail_occupancy(&self, fail: bool) {
        self.fail_occupancy.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OccupancySource for MemoryStore {
    async fn fetch_occupancy(&self, business_id: &str, range: DateRange) -> Result<Vec<OccupancyRecord>, StoreError> {
        if self.fail_occupancy.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("occupancy fetch disabled".into()));
        }
        Ok(self
            .occupancy
            .get(business_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| range.contains(r.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn fetch_recent_requests(
        &self,
        business_id: &str,
        requester_key: &str,
        since: LocalInstant,
    ) -> Result<Vec<StoredRequest>, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("request lookup disabled".into()));
        }
        let mut found: Vec<StoredRequest> = self
            .requests
            .get(business_id)
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.requester_key == requester_key && r.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn persist(&self, business_id: &str, request: &IntakeRequest) -> Result<RequestId, StoreError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("persist disabled".into()));
        }
        let id = Ulid::new().to_string();
        self.requests
            .entry(business_id.to_string())
            .or_default()
            .push(StoredRequest {
                id: id.clone(),
                requester_key: request.requester_key.clone(),
                description: request.description.clone(),
                created_at: request.created_at,
            });
        Ok(id)
    }
}
