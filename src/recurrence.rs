use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use crate::model::{LocalInstant, RecurringSlot, SlotId};

// ── Weekday tags ─────────────────────────────────────────────────

/// Parse a symbolic weekday tag (`MONDAY`..`SUNDAY`, case-insensitive).
pub fn parse_weekday(tag: &str) -> Option<Weekday> {
    match tag.trim().to_ascii_uppercase().as_str() {
        "MONDAY" => Some(Weekday::Mon),
        "TUESDAY" => Some(Weekday::Tue),
        "WEDNESDAY" => Some(Weekday::Wed),
        "THURSDAY" => Some(Weekday::Thu),
        "FRIDAY" => Some(Weekday::Fri),
        "SATURDAY" => Some(Weekday::Sat),
        "SUNDAY" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_tag(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

// ── Time of day ──────────────────────────────────────────────────

/// Parse `HH:MM`. Hours must parse; minutes fall back to `00` when omitted,
/// unparseable, or out of range.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let mut parts = value.trim().splitn(2, ':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes = parts
        .next()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .filter(|m| *m < 60)
        .unwrap_or(0);
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

// ── Resolution ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    UnknownWeekday,
    MalformedTime,
}

/// Outcome of resolving one (weekday, time) pair. `Skipped` is a soft failure:
/// callers move on to the next pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Found(LocalInstant),
    Skipped(SkipReason),
}

impl Occurrence {
    pub fn found(self) -> Option<LocalInstant> {
        match self {
            Occurrence::Found(at) => Some(at),
            Occurrence::Skipped(_) => None,
        }
    }
}

/// The instant of `time` on `date`, unless that instant is on or before `reference`.
/// This is the "already passed today" tie-break shared by every resolver path.
pub fn occurrence_on(date: NaiveDate, time: NaiveTime, reference: LocalInstant) -> Option<LocalInstant> {
    let at = date.and_time(time);
    (at > reference).then_some(at)
}

/// Next concrete occurrence of `weekday` at `time_of_day` strictly after `reference`.
///
/// The candidate is the weekday's date in the current week; if that lands on the
/// reference date and the time has already passed (equal counts as passed), it moves
/// to the following week.
pub fn next_occurrence(weekday: &str, time_of_day: &str, reference: LocalInstant) -> Occurrence {
    let Some(day) = parse_weekday(weekday) else {
        return Occurrence::Skipped(SkipReason::UnknownWeekday);
    };
    let Some(time) = parse_time_of_day(time_of_day) else {
        return Occurrence::Skipped(SkipReason::MalformedTime);
    };
    Occurrence::Found(next_occurrence_parsed(day, time, reference))
}

pub(crate) fn next_occurrence_parsed(day: Weekday, time: NaiveTime, reference: LocalInstant) -> LocalInstant {
    let today = reference.date();
    let diff = (7 + day.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64) % 7;
    let date = today + Duration::days(diff);
    occurrence_on(date, time, reference).unwrap_or_else(|| (date + Duration::days(7)).and_time(time))
}

// ── Upcoming listing ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingOccurrence {
    pub slot_id: SlotId,
    pub weekday: &'static str,
    pub at: LocalInstant,
    pub time_range: String,
}

/// Every (active slot, weekday) pair resolved to its next occurrence, earliest first,
/// truncated to `limit`. Malformed pairs are skipped.
pub fn upcoming_occurrences(slots: &[RecurringSlot], now: LocalInstant, limit: usize) -> Vec<UpcomingOccurrence> {
    let mut entries = Vec::new();
    for slot in slots.iter().filter(|s| s.is_active()) {
        for tag in &slot.days_of_week {
            match next_occurrence(tag, &slot.start_time, now) {
                Occurrence::Found(at) => {
                    // parse cannot fail here: next_occurrence already accepted the tag
                    let weekday = parse_weekday(tag).map(weekday_tag).unwrap_or("UNKNOWN");
                    entries.push(UpcomingOccurrence {
                        slot_id: slot.id.clone(),
                        weekday,
                        at,
                        time_range: slot.time_range(),
                    });
                }
                Occurrence::Skipped(reason) => {
                    tracing::debug!(slot = %slot.id, tag = %tag, ?reason, "skipping slot day");
                }
            }
        }
    }
    entries.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.slot_id.cmp(&b.slot_id)));
    entries.truncate(limit);
    entries
}
