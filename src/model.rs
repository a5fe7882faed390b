use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Business-local wall clock instant. No time zone is attached.
pub type LocalInstant = NaiveDateTime;

/// Current business-local time from the host clock.
pub fn local_now() -> LocalInstant {
    chrono::Local::now().naive_local()
}

pub type BusinessId = String;
pub type SlotId = String;
pub type ServiceId = String;
pub type RequestId = String;

/// Lifecycle status shared by slots and services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// Identifier of a professional or other bookable resource.
///
/// `unassigned` is a sentinel: a slot with no assigned resource is itself a shared,
/// exclusive resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub const UNASSIGNED: &'static str = "unassigned";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unassigned() -> Self {
        Self(Self::UNASSIGNED.to_string())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0 == Self::UNASSIGNED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A recurring weekly opening window.
///
/// Weekday tags and times are kept exactly as the store returned them; bad entries
/// are skipped during resolution rather than rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSlot {
    pub id: SlotId,
    pub days_of_week: Vec<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Status,
}

impl RecurringSlot {
    pub fn is_active(&self) -> bool {
        self.status != Status::Inactive
    }

    /// Display range, `"10:00 - 11:00"` or just `"10:00"`.
    pub fn time_range(&self) -> String {
        match &self.end_time {
            Some(end) => format!("{} - {}", self.start_time, end),
            None => self.start_time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    #[serde(default)]
    pub status: Status,
    /// Eligible resources. Empty means any resource may fulfill the service.
    #[serde(default)]
    pub resource_ids: Vec<ResourceId>,
}

impl Service {
    pub fn is_active(&self) -> bool {
        self.status != Status::Inactive
    }

    /// Resources to try, in definition order. Falls back to `{unassigned}`.
    pub fn candidate_resources(&self) -> Vec<ResourceId> {
        if self.resource_ids.is_empty() {
            vec![ResourceId::unassigned()]
        } else {
            self.resource_ids.clone()
        }
    }
}

/// Many-to-many link between a service and a recurring slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceSlotLink {
    pub service_id: ServiceId,
    pub slot_id: SlotId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyStatus {
    #[default]
    Booked,
    Requested,
    Cancelled,
}

impl OccupancyStatus {
    pub fn occupies(&self) -> bool {
        matches!(self, OccupancyStatus::Booked | OccupancyStatus::Requested)
    }
}

/// An already-reserved interval on one calendar date. Read model, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    #[serde(default)]
    pub business_id: BusinessId,
    pub date: NaiveDate,
    pub resource_id: ResourceId,
    #[serde(default)]
    pub slot_id: Option<SlotId>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: OccupancyStatus,
}

/// Why an availability answer came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    /// A free (date, slot, resource) triple was found.
    Open,
    /// Coarse answer: the business has no scheduling granularity, or occupancy is unknown.
    Unscheduled,
    ServiceInactive,
    /// No active slot is linked to the service.
    NotOffered,
    /// Every candidate triple within the horizon is occupied.
    FullyBooked,
}

impl AvailabilityReason {
    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityReason::Open => "open",
            AvailabilityReason::Unscheduled => "unscheduled",
            AvailabilityReason::ServiceInactive => "service_inactive",
            AvailabilityReason::NotOffered => "not_offered",
            AvailabilityReason::FullyBooked => "fully_booked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub service_id: ServiceId,
    pub bookable: bool,
    pub next_occurrence: Option<LocalInstant>,
    pub resource_id: Option<ResourceId>,
    pub reason: AvailabilityReason,
}

impl AvailabilityQuery {
    pub(crate) fn closed(service_id: &str, reason: AvailabilityReason) -> Self {
        Self {
            service_id: service_id.to_string(),
            bookable: false,
            next_occurrence: None,
            resource_id: None,
            reason,
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DateRange start must not be after end");
        Self { start, end }
    }

    /// `[start, start + days]`.
    pub fn horizon(start: NaiveDate, days: u32) -> Self {
        Self::new(start, start + chrono::Days::new(days as u64))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A submission on its way to the store. The guard never persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub requester_key: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Business-local host clock, as from `local_now`. The intake sweeper expires
    /// rate windows against that clock, so stamps from another clock are swept early
    /// or late.
    pub created_at: LocalInstant,
}

impl IntakeRequest {
    pub fn new(requester: &str, description: Option<&str>, created_at: LocalInstant) -> Self {
        Self {
            requester_key: normalize_requester_key(requester),
            description: description.map(str::to_string),
            created_at,
        }
    }

    /// A request stamped with the host clock.
    pub fn now(requester: &str, description: Option<&str>) -> Self {
        Self::new(requester, description, local_now())
    }
}

/// A request as the store knows it, with its assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub id: RequestId,
    pub requester_key: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: LocalInstant,
}

/// Phone-like keys reduce to their digits; contact keys with `@` are trimmed and
/// lower-cased. Anything without digits falls back to the trimmed lower-case form.
pub fn normalize_requester_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        return trimmed.to_lowercase();
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        trimmed.to_lowercase()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_sentinel() {
        assert!(ResourceId::unassigned().is_unassigned());
        assert!(!ResourceId::new("barber-1").is_unassigned());
        assert_eq!(ResourceId::unassigned().as_str(), "unassigned");
    }

    #[test]
    fn service_without_resources_falls_back_to_unassigned() {
        let svc = Service {
            id: "cut".into(),
            status: Status::Active,
            resource_ids: vec![],
        };
        assert_eq!(svc.candidate_resources(), vec![ResourceId::unassigned()]);

        let scoped = Service {
            resource_ids: vec!["a".into(), "b".into()],
            ..svc
        };
        assert_eq!(
            scoped.candidate_resources(),
            vec![ResourceId::new("a"), ResourceId::new("b")]
        );
    }

    #[test]
    fn slot_time_range() {
        let mut slot = RecurringSlot {
            id: "s1".into(),
            days_of_week: vec!["MONDAY".into()],
            start_time: "10:00".into(),
            end_time: None,
            status: Status::Active,
        };
        assert_eq!(slot.time_range(), "10:00");
        slot.end_time = Some("11:30".into());
        assert_eq!(slot.time_range(), "10:00 - 11:30");
    }

    #[test]
    fn occupancy_status_occupies() {
        assert!(OccupancyStatus::Booked.occupies());
        assert!(OccupancyStatus::Requested.occupies());
        assert!(!OccupancyStatus::Cancelled.occupies());
    }

    #[test]
    fn date_range_horizon_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let range = DateRange::horizon(start, 30);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(range.contains(start));
        assert!(range.contains(range.end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn requester_key_normalization() {
        assert_eq!(normalize_requester_key("+56 9 1234-5678"), "56912345678");
        assert_eq!(normalize_requester_key("  Ana@Example.COM "), "ana@example.com");
        assert_eq!(normalize_requester_key(" Anon "), "anon");
    }

    #[test]
    fn status_serde_uses_upper_case_tags() {
        let slot: RecurringSlot = serde_json::from_str(
            r#"{"id":"s","days_of_week":["MONDAY"],"start_time":"09:00","status":"INACTIVE"}"#,
        )
        .unwrap();
        assert_eq!(slot.status, Status::Inactive);
        assert_eq!(slot.end_time, None);

        let rec: OccupancyRecord = serde_json::from_str(
            r#"{"business_id":"b","date":"2024-01-01","resource_id":"unassigned","status":"REQUESTED"}"#,
        )
        .unwrap();
        assert!(rec.resource_id.is_unassigned());
        assert_eq!(rec.status, OccupancyStatus::Requested);
    }
}
