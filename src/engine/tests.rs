use chrono::{Datelike, Days, NaiveDate};

use super::*;

// 2024-01-01 is a Monday.
fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new((d - 1) as u64)
}

fn at(d: u32, h: u32, m: u32) -> LocalInstant {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

fn slot(id: &str, days: &[&str], start: &str) -> RecurringSlot {
    RecurringSlot {
        id: id.into(),
        days_of_week: days.iter().map(|d| d.to_string()).collect(),
        start_time: start.into(),
        end_time: None,
        status: Status::Active,
    }
}

fn service(id: &str, resources: &[&str]) -> Service {
    Service {
        id: id.into(),
        status: Status::Active,
        resource_ids: resources.iter().map(|r| ResourceId::new(*r)).collect(),
    }
}

fn link(service: &str, slot: &str) -> ServiceSlotLink {
    ServiceSlotLink {
        service_id: service.into(),
        slot_id: slot.into(),
    }
}

fn booked(date: NaiveDate, resource: &str, slot_id: &str) -> OccupancyRecord {
    OccupancyRecord {
        business_id: "biz".into(),
        date,
        resource_id: ResourceId::new(resource),
        slot_id: Some(slot_id.into()),
        start_time: None,
        end_time: None,
        status: OccupancyStatus::Booked,
    }
}

fn index(now: LocalInstant, records: Vec<OccupancyRecord>) -> SlotOccupancyIndex {
    SlotOccupancyIndex::build("biz", DateRange::horizon(now.date(), 30), records)
}

/// One Monday 10:00 slot, one service linked to it.
fn monday_schedule(svc: Service) -> BusinessSchedule {
    BusinessSchedule::new(
        vec![slot("mon10", &["MONDAY"], "10:00")],
        vec![link(&svc.id, "mon10")],
        vec![svc],
    )
}

/// A slot open every day at 10:00.
fn daily_schedule(svc: Service) -> BusinessSchedule {
    let all = [
        "MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY", "SATURDAY", "SUNDAY",
    ];
    BusinessSchedule::new(
        vec![slot("daily", &all, "10:00")],
        vec![link(&svc.id, "daily")],
        vec![svc],
    )
}

// ── End-to-end scenarios ──────────────────────────────────

#[test]
fn monday_morning_books_today() {
    let svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 9, 0);
    let idx = index(now, vec![]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Open);
    assert_eq!(q.next_occurrence, Some(at(1, 10, 0)));
    assert_eq!(q.resource_id, Some(ResourceId::unassigned()));
}

#[test]
fn monday_after_slot_books_next_week() {
    let svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 10, 1);
    let idx = index(now, vec![]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(q.bookable);
    assert_eq!(q.next_occurrence, Some(at(8, 10, 0)));
    assert_eq!(q.resource_id, Some(ResourceId::unassigned()));
}

#[test]
fn slot_at_exactly_now_counts_as_passed() {
    let svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 10, 0);
    let idx = index(now, vec![]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.next_occurrence, Some(at(8, 10, 0)));
}

#[test]
fn first_week_agrees_with_resolver() {
    let svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    for now in [at(1, 9, 0), at(1, 10, 0), at(3, 12, 0), at(7, 23, 59)] {
        let idx = index(now, vec![]);
        let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
        let resolved = crate::recurrence::next_occurrence("MONDAY", "10:00", now).found();
        assert_eq!(q.next_occurrence, resolved, "now = {now}");
    }
}

// ── Eligibility gate ──────────────────────────────────────

#[test]
fn inactive_service_is_never_bookable() {
    let mut svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    svc.status = Status::Inactive;
    let now = at(1, 9, 0);
    let idx = index(now, vec![]);
    let engine = AvailabilityEngine::default();

    let q = engine.is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::ServiceInactive);
    assert_eq!(q.next_occurrence, None);

    // Degraded paths short-circuit the same way.
    assert!(!engine.is_bookable(&svc, &schedule, None, now).bookable);
    assert!(
        !engine
            .is_bookable(&svc, &BusinessSchedule::default(), None, now)
            .bookable
    );
}

// ── Degraded mode ─────────────────────────────────────────

#[test]
fn business_without_slots_is_coarse() {
    let svc = service("cut", &[]);
    let schedule = BusinessSchedule::new(vec![], vec![], vec![svc.clone()]);
    let now = at(1, 9, 0);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&index(now, vec![])), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
    assert_eq!(q.resource_id, None);
}

#[test]
fn business_with_only_inactive_slots_is_coarse() {
    let svc = service("cut", &[]);
    let mut s = slot("mon10", &["MONDAY"], "10:00");
    s.status = Status::Inactive;
    let schedule = BusinessSchedule::new(vec![s], vec![link("cut", "mon10")], vec![svc.clone()]);
    let now = at(1, 9, 0);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, None, now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
}

#[test]
fn business_without_links_is_coarse() {
    let svc = service("cut", &[]);
    let schedule = BusinessSchedule::new(vec![slot("mon10", &["MONDAY"], "10:00")], vec![], vec![svc.clone()]);
    let now = at(1, 9, 0);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&index(now, vec![])), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
}

#[test]
fn missing_occupancy_still_requires_a_linked_slot() {
    let svc = service("cut", &[]);
    let other = service("shave", &[]);
    let schedule = BusinessSchedule::new(
        vec![slot("mon10", &["MONDAY"], "10:00"), slot("fri18", &["FRIDAY"], "18:00")],
        vec![link("cut", "fri18"), link("cut", "mon10")],
        vec![svc.clone(), other.clone()],
    );
    let now = at(1, 11, 0);
    let engine = AvailabilityEngine::default();

    let q = engine.is_bookable(&svc, &schedule, None, now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
    assert_eq!(q.next_occurrence, Some(at(5, 18, 0)));

    let q = engine.is_bookable(&other, &schedule, None, now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::NotOffered);
}

// ── Candidate slots ───────────────────────────────────────

#[test]
fn unlinked_service_is_not_offered_by_default() {
    let orphan = service("color", &[]);
    let schedule = BusinessSchedule::new(
        vec![slot("mon10", &["MONDAY"], "10:00")],
        vec![link("cut", "mon10")],
        vec![orphan.clone()],
    );
    let now = at(1, 9, 0);
    let idx = index(now, vec![]);

    let q = AvailabilityEngine::default().is_bookable(&orphan, &schedule, Some(&idx), now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::NotOffered);

    let lenient = AvailabilityEngine::new(AvailabilityPolicy {
        unlinked_services_bookable: true,
        ..AvailabilityPolicy::default()
    });
    let q = lenient.is_bookable(&orphan, &schedule, Some(&idx), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
}

#[test]
fn service_linked_only_to_inactive_slots_is_not_offered() {
    let svc = service("cut", &[]);
    let mut off = slot("off", &["TUESDAY"], "10:00");
    off.status = Status::Inactive;
    let schedule = BusinessSchedule::new(
        vec![slot("mon10", &["MONDAY"], "10:00"), off],
        vec![link("other", "mon10"), link("cut", "off")],
        vec![svc.clone()],
    );
    let now = at(1, 9, 0);

    let lenient = AvailabilityEngine::new(AvailabilityPolicy {
        unlinked_services_bookable: true,
        ..AvailabilityPolicy::default()
    });
    let q = lenient.is_bookable(&svc, &schedule, Some(&index(now, vec![])), now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::NotOffered);
}

// ── Horizon exhaustion ────────────────────────────────────

#[test]
fn fully_booked_horizon_is_not_bookable() {
    let svc = service("cut", &["ana"]);
    let schedule = daily_schedule(svc.clone());
    let now = at(1, 8, 0);
    let records = (0..=30).map(|o| booked(now.date() + Days::new(o), "ana", "daily")).collect();
    let idx = index(now, records);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::FullyBooked);
    assert_eq!(q.next_occurrence, None);
    assert_eq!(q.resource_id, None);
}

#[test]
fn freeing_the_last_horizon_day_makes_it_bookable() {
    let svc = service("cut", &["ana"]);
    let schedule = daily_schedule(svc.clone());
    let now = at(1, 8, 0);
    let last = now.date() + Days::new(30);
    let records = (0..30).map(|o| booked(now.date() + Days::new(o), "ana", "daily")).collect();
    let idx = index(now, records);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Open);
    assert_eq!(q.next_occurrence, Some(last.and_hms_opt(10, 0, 0).unwrap()));
    assert_eq!(q.resource_id, Some(ResourceId::new("ana")));
}

#[test]
fn free_day_beyond_horizon_does_not_count() {
    let svc = service("cut", &["ana"]);
    let schedule = daily_schedule(svc.clone());
    let now = at(1, 8, 0);
    let records = (0..=9).map(|o| booked(now.date() + Days::new(o), "ana", "daily")).collect();
    let idx = index(now, records);

    let short = AvailabilityEngine::new(AvailabilityPolicy {
        horizon_days: 9,
        ..AvailabilityPolicy::default()
    });
    let q = short.is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.reason, AvailabilityReason::FullyBooked);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.next_occurrence, Some(at(11, 10, 0)));
}

#[test]
fn walk_stops_where_the_index_range_ends() {
    let svc = service("cut", &[]);
    let schedule = daily_schedule(svc.clone());
    let now = at(1, 8, 0);
    let week = DateRange::new(day(1), day(7));
    let records = (1..=7).map(|d| booked(day(d), "unassigned", "daily"));
    let idx = SlotOccupancyIndex::build("biz", week, records);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert!(!q.bookable);
    assert_eq!(q.reason, AvailabilityReason::FullyBooked);
    assert_eq!(q.next_occurrence, None);
}

#[test]
fn short_index_still_finds_a_free_day_it_covers() {
    let svc = service("cut", &[]);
    let schedule = daily_schedule(svc.clone());
    let now = at(1, 8, 0);
    let idx = SlotOccupancyIndex::build("biz", DateRange::new(day(1), day(7)), vec![booked(day(1), "unassigned", "daily")]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.reason, AvailabilityReason::Open);
    assert_eq!(q.next_occurrence, Some(at(2, 10, 0)));
}

#[test]
fn index_not_covering_today_answers_coarsely() {
    let svc = service("cut", &[]);
    let schedule = daily_schedule(svc.clone());
    let now = at(10, 8, 0);
    let stale = SlotOccupancyIndex::build("biz", DateRange::new(day(1), day(7)), vec![]);
    let engine = AvailabilityEngine::default();

    let q = engine.is_bookable(&svc, &schedule, Some(&stale), now);
    assert!(q.bookable);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
    assert_eq!(q.next_occurrence, Some(at(10, 10, 0)));

    let q = engine.is_bookable(&svc, &schedule, Some(&SlotOccupancyIndex::default()), now);
    assert_eq!(q.reason, AvailabilityReason::Unscheduled);
}

#[test]
fn horizon_is_clamped() {
    let engine = AvailabilityEngine::new(AvailabilityPolicy {
        horizon_days: 10_000,
        ..AvailabilityPolicy::default()
    });
    assert_eq!(engine.policy().horizon_days, MAX_HORIZON_DAYS);
}

// ── Resources ─────────────────────────────────────────────

#[test]
fn second_resource_offered_when_first_is_taken() {
    let svc = service("cut", &["ana", "bea"]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 9, 0);
    let idx = index(now, vec![booked(day(1), "ana", "mon10")]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.resource_id, Some(ResourceId::new("bea")));
    assert_eq!(q.next_occurrence, Some(at(1, 10, 0)));
}

#[test]
fn unassigned_booking_blocks_every_resource_that_day() {
    let svc = service("cut", &["ana", "bea"]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 9, 0);
    let idx = index(now, vec![booked(day(1), "unassigned", "mon10")]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.next_occurrence, Some(at(8, 10, 0)));
    assert_eq!(q.resource_id, Some(ResourceId::new("ana")));
}

#[test]
fn cancelled_bookings_do_not_occupy() {
    let svc = service("cut", &[]);
    let schedule = monday_schedule(svc.clone());
    let now = at(1, 9, 0);
    let mut cancelled = booked(day(1), "unassigned", "mon10");
    cancelled.status = OccupancyStatus::Cancelled;
    let idx = index(now, vec![cancelled]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    assert_eq!(q.next_occurrence, Some(at(1, 10, 0)));
}

#[test]
fn weekday_of_offer_matches_slot() {
    let svc = service("cut", &[]);
    let schedule = BusinessSchedule::new(
        vec![slot("weekend", &["SATURDAY", "SUNDAY"], "11:00")],
        vec![link("cut", "weekend")],
        vec![svc.clone()],
    );
    let now = at(1, 9, 0);
    let idx = index(now, vec![booked(day(6), "unassigned", "weekend")]);

    let q = AvailabilityEngine::default().is_bookable(&svc, &schedule, Some(&idx), now);
    let next = q.next_occurrence.unwrap();
    assert_eq!(next, at(7, 11, 0));
    assert_eq!(next.weekday(), chrono::Weekday::Sun);
}

// ── Catalog ───────────────────────────────────────────────

#[test]
fn catalog_evaluates_every_service_in_order() {
    let cut = service("cut", &[]);
    let mut shave = service("shave", &[]);
    shave.status = Status::Inactive;
    let color = service("color", &[]);
    let schedule = BusinessSchedule::new(
        vec![slot("mon10", &["MONDAY"], "10:00")],
        vec![link("cut", "mon10"), link("shave", "mon10")],
        vec![cut, shave, color],
    );
    let now = at(1, 9, 0);
    let idx = index(now, vec![]);

    let results = AvailabilityEngine::default().evaluate_catalog(&schedule, Some(&idx), now);
    let reasons: Vec<_> = results.iter().map(|q| (q.service_id.as_str(), q.reason)).collect();
    assert_eq!(
        reasons,
        vec![
            ("cut", AvailabilityReason::Open),
            ("shave", AvailabilityReason::ServiceInactive),
            ("color", AvailabilityReason::NotOffered),
        ]
    );
}
