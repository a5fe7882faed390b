use chrono::{Datelike, Days, NaiveTime, Weekday};

use crate::model::*;
use crate::occupancy::SlotOccupancyIndex;
use crate::recurrence::{SkipReason, next_occurrence_parsed, occurrence_on, parse_time_of_day, parse_weekday};

// ── Day-walk search ───────────────────────────────────────────────

/// The first free (date, slot, resource) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeSlot<'a> {
    pub slot: &'a RecurringSlot,
    pub resource: ResourceId,
    pub at: LocalInstant,
}

/// A slot with its weekday tags and start time parsed once per scan.
struct Prepared<'a> {
    slot: &'a RecurringSlot,
    days: Vec<Weekday>,
    time: NaiveTime,
}

/// Parse every candidate slot, dropping malformed weekday tags and slots whose
/// start time does not parse. Definition order is preserved.
fn prepare<'a>(slots: &[&'a RecurringSlot]) -> Vec<Prepared<'a>> {
    let mut prepared = Vec::with_capacity(slots.len());
    for &slot in slots {
        let Some(time) = parse_time_of_day(&slot.start_time) else {
            tracing::debug!(slot = %slot.id, start = %slot.start_time, reason = ?SkipReason::MalformedTime, "skipping slot");
            continue;
        };
        let mut days = Vec::with_capacity(slot.days_of_week.len());
        for tag in &slot.days_of_week {
            match parse_weekday(tag) {
                Some(day) => days.push(day),
                None => {
                    tracing::debug!(slot = %slot.id, tag = %tag, reason = ?SkipReason::UnknownWeekday, "skipping slot day")
                }
            }
        }
        if !days.is_empty() {
            prepared.push(Prepared { slot, days, time });
        }
    }
    prepared
}

/// Walk dates from `now`'s date through `now + horizon_days` inclusive. For each date,
/// each slot on that weekday (definition order), each resource (definition order):
/// the first triple the index does not report occupied wins.
///
/// An occurrence on `now`'s date at or before `now` has already passed and is skipped.
pub fn first_free<'a>(
    slots: &[&'a RecurringSlot],
    resources: &[ResourceId],
    occupancy: &SlotOccupancyIndex,
    now: LocalInstant,
    horizon_days: u32,
) -> Option<FreeSlot<'a>> {
    let prepared = prepare(slots);
    if prepared.is_empty() || resources.is_empty() {
        return None;
    }
    let today = now.date();

    for offset in 0..=horizon_days {
        let date = today + Days::new(offset as u64);
        let weekday = date.weekday();
        for p in &prepared {
            if !p.days.contains(&weekday) {
                continue;
            }
            let Some(at) = occurrence_on(date, p.time, now) else {
                continue;
            };
            for resource in resources {
                if !occupancy.is_occupied(p.slot, std::slice::from_ref(resource), date) {
                    return Some(FreeSlot {
                        slot: p.slot,
                        resource: resource.clone(),
                        at,
                    });
                }
            }
        }
    }
    None
}

/// Earliest next occurrence across all valid (slot, weekday) pairs. Used when there
/// is no occupancy to scan against.
pub fn earliest_occurrence(slots: &[&RecurringSlot], now: LocalInstant) -> Option<LocalInstant> {
    prepare(slots)
        .iter()
        .flat_map(|p| p.days.iter().map(move |&d| next_occurrence_parsed(d, p.time, now)))
        .min()
}
