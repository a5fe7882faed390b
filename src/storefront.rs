use std::sync::Arc;

use crate::engine::{AvailabilityEngine, BusinessSchedule};
use crate::error::IntakeError;
use crate::intake::{IntakeGuard, Submission};
use crate::model::*;
use crate::observability;
use crate::occupancy::SlotOccupancyIndex;
use crate::store::{OccupancySource, RequestStore};

/// One business's booking front: availability over its schedule and guarded
/// request intake, both backed by the store collaborators.
pub struct Storefront {
    business_id: BusinessId,
    engine: AvailabilityEngine,
    guard: Arc<IntakeGuard>,
    occupancy: Arc<dyn OccupancySource>,
    requests: Arc<dyn RequestStore>,
}

impl Storefront {
    pub fn new(
        business_id: impl Into<BusinessId>,
        engine: AvailabilityEngine,
        guard: Arc<IntakeGuard>,
        occupancy: Arc<dyn OccupancySource>,
        requests: Arc<dyn RequestStore>,
    ) -> Self {
        Self {
            business_id: business_id.into(),
            engine,
            guard,
            occupancy,
            requests,
        }
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }

    pub fn guard(&self) -> &Arc<IntakeGuard> {
        &self.guard
    }

    /// Fetch occupancy for the horizon starting at `now`'s date. A failed fetch is
    /// logged and yields `None`, which makes the engine answer coarsely.
    pub async fn load_occupancy(&self, now: LocalInstant) -> Option<SlotOccupancyIndex> {
        let range = DateRange::horizon(now.date(), self.engine.policy().horizon_days);
        match self.occupancy.fetch_occupancy(&self.business_id, range).await {
            Ok(records) => Some(SlotOccupancyIndex::build(&self.business_id, range, records)),
            Err(e) => {
                tracing::warn!(business = %self.business_id, error = %e, "occupancy unavailable, answering coarsely");
                metrics::counter!(observability::OCCUPANCY_FETCH_FAILURES_TOTAL).increment(1);
                None
            }
        }
    }

    pub async fn availability(
        &self,
        service: &Service,
        schedule: &BusinessSchedule,
        now: LocalInstant,
    ) -> AvailabilityQuery {
        let occupancy = self.load_occupancy(now).await;
        self.engine.is_bookable(service, schedule, occupancy.as_ref(), now)
    }

    /// Every service of the business against a single occupancy fetch.
    pub async fn catalog_availability(&self, schedule: &BusinessSchedule, now: LocalInstant) -> Vec<AvailabilityQuery> {
        let occupancy = self.load_occupancy(now).await;
        self.engine.evaluate_catalog(schedule, occupancy.as_ref(), now)
    }

    pub async fn submit(&self, request: IntakeRequest) -> Result<Submission, IntakeError> {
        self.guard
            .submit(&self.business_id, self.requests.as_ref(), request)
            .await
    }
}
