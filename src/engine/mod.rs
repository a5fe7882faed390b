mod scan;
mod schedule;
#[cfg(test)]
mod tests;

pub use scan::{FreeSlot, earliest_occurrence, first_free};
pub use schedule::BusinessSchedule;

use crate::limits::MAX_HORIZON_DAYS;
use crate::model::*;
use crate::observability;
use crate::occupancy::SlotOccupancyIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityPolicy {
    /// Look-ahead window in days, counted from `now`'s date (inclusive at both ends).
    pub horizon_days: u32,
    /// Whether a service with no slot link at all is judged bookable (coarsely).
    pub unlinked_services_bookable: bool,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            unlinked_services_bookable: false,
        }
    }
}

/// Answers "is this service bookable, with whom, and when next?" over a rolling window.
/// Stateless: every call works on the snapshots it is handed.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityEngine {
    policy: AvailabilityPolicy,
}

impl AvailabilityEngine {
    pub fn new(mut policy: AvailabilityPolicy) -> Self {
        if policy.horizon_days > MAX_HORIZON_DAYS {
            tracing::warn!(
                requested = policy.horizon_days,
                max = MAX_HORIZON_DAYS,
                "availability horizon clamped"
            );
            policy.horizon_days = MAX_HORIZON_DAYS;
        }
        Self { policy }
    }

    pub fn policy(&self) -> &AvailabilityPolicy {
        &self.policy
    }

    /// Evaluate `service` against the business `schedule`.
    ///
    /// `occupancy` is `None` when no occupancy data could be obtained; the engine then
    /// answers coarsely instead of scanning.
    pub fn is_bookable(
        &self,
        service: &Service,
        schedule: &BusinessSchedule,
        occupancy: Option<&SlotOccupancyIndex>,
        now: LocalInstant,
    ) -> AvailabilityQuery {
        let result = self.evaluate(service, schedule, occupancy, now);
        metrics::counter!(observability::AVAILABILITY_QUERIES_TOTAL, "reason" => result.reason.label())
            .increment(1);
        result
    }

    fn evaluate(
        &self,
        service: &Service,
        schedule: &BusinessSchedule,
        occupancy: Option<&SlotOccupancyIndex>,
        now: LocalInstant,
    ) -> AvailabilityQuery {
        // Step 1: eligibility gate.
        if !service.is_active() {
            return AvailabilityQuery::closed(&service.id, AvailabilityReason::ServiceInactive);
        }

        // Step 2: a business without scheduling granularity gets the coarse answer.
        if !schedule.has_active_slots() || !schedule.has_links() {
            return coarse(service, None);
        }

        // Step 3: candidate slots.
        let candidates = schedule.candidate_slots(&service.id);
        if candidates.is_empty() {
            if self.policy.unlinked_services_bookable && !schedule.is_linked(&service.id) {
                return coarse(service, None);
            }
            return AvailabilityQuery::closed(&service.id, AvailabilityReason::NotOffered);
        }

        let Some(occupancy) = occupancy else {
            return coarse(service, earliest_occurrence(&candidates, now));
        };

        // Occupancy is only known inside the index range; the walk stops at its end.
        let Some(scan_days) = covered_days(occupancy, now, self.policy.horizon_days) else {
            tracing::warn!(service = %service.id, range = ?occupancy.range(), "occupancy index does not cover today, answering coarsely");
            return coarse(service, earliest_occurrence(&candidates, now));
        };

        // Step 4: day walk.
        let resources = service.candidate_resources();
        let scan_start = std::time::Instant::now();
        let found = first_free(&candidates, &resources, occupancy, now, scan_days);
        metrics::histogram!(observability::SCAN_DURATION_SECONDS).record(scan_start.elapsed().as_secs_f64());

        match found {
            Some(free) => AvailabilityQuery {
                service_id: service.id.clone(),
                bookable: true,
                next_occurrence: Some(free.at),
                resource_id: Some(free.resource),
                reason: AvailabilityReason::Open,
            },
            // Step 5: exhaustion.
            None => AvailabilityQuery::closed(&service.id, AvailabilityReason::FullyBooked),
        }
    }

    /// Evaluate every service in the schedule against one occupancy snapshot.
    pub fn evaluate_catalog(
        &self,
        schedule: &BusinessSchedule,
        occupancy: Option<&SlotOccupancyIndex>,
        now: LocalInstant,
    ) -> Vec<AvailabilityQuery> {
        schedule
            .services()
            .iter()
            .map(|service| self.is_bookable(service, schedule, occupancy, now))
            .collect()
    }
}

/// Days past `now`'s date the walk may visit: the horizon, cut short where the
/// index range ends. `None` if the index does not cover `now`'s date at all.
fn covered_days(occupancy: &SlotOccupancyIndex, now: LocalInstant, horizon_days: u32) -> Option<u32> {
    let today = now.date();
    let range = occupancy.range().filter(|r| r.contains(today))?;
    let covered = u32::try_from((range.end - today).num_days()).unwrap_or(u32::MAX);
    if covered < horizon_days {
        tracing::debug!(covered, horizon_days, "occupancy index shorter than horizon");
    }
    Some(covered.min(horizon_days))
}

fn coarse(service: &Service, next_occurrence: Option<LocalInstant>) -> AvailabilityQuery {
    AvailabilityQuery {
        service_id: service.id.clone(),
        bookable: service.is_active(),
        next_occurrence,
        resource_id: None,
        reason: AvailabilityReason::Unscheduled,
    }
}
