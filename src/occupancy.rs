use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use crate::model::{DateRange, OccupancyRecord, RecurringSlot, ResourceId};
use crate::recurrence::parse_time_of_day;

/// Occupancy for one business over a bounded date range, grouped by date and by
/// resource. Built once per scan and discarded afterwards.
#[derive(Debug, Default)]
pub struct SlotOccupancyIndex {
    range: Option<DateRange>,
    by_date: HashMap<NaiveDate, Vec<OccupancyRecord>>,
    /// (date, resource) → positions into `by_date[date]`.
    by_resource: HashMap<(NaiveDate, ResourceId), Vec<usize>>,
}

impl SlotOccupancyIndex {
    /// Index the records of `business_id` that fall within `range` and still occupy
    /// (BOOKED or REQUESTED). Everything else is dropped.
    pub fn build(business_id: &str, range: DateRange, records: impl IntoIterator<Item = OccupancyRecord>) -> Self {
        let mut index = Self {
            range: Some(range),
            ..Self::default()
        };
        let mut foreign = 0usize;
        for record in records {
            if record.business_id != business_id {
                foreign += 1;
                continue;
            }
            if !range.contains(record.date) || !record.status.occupies() {
                continue;
            }
            let day = index.by_date.entry(record.date).or_default();
            index
                .by_resource
                .entry((record.date, record.resource_id.clone()))
                .or_default()
                .push(day.len());
            day.push(record);
        }
        if foreign > 0 {
            tracing::warn!(business = %business_id, foreign, "ignored occupancy records of other businesses");
        }
        index
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn records_on_date(&self, date: NaiveDate) -> &[OccupancyRecord] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    fn records_for(&self, date: NaiveDate, resource: &ResourceId) -> impl Iterator<Item = &OccupancyRecord> {
        let day = self.records_on_date(date);
        self.by_resource
            .get(&(date, resource.clone()))
            .into_iter()
            .flatten()
            .map(move |&i| &day[i])
    }

    /// True if any record on `date` takes `slot` for one of `candidates`.
    /// Records attributed to `unassigned` take the slot for every candidate.
    pub fn is_occupied(&self, slot: &RecurringSlot, candidates: &[ResourceId], date: NaiveDate) -> bool {
        let unassigned = ResourceId::unassigned();
        if self.records_for(date, &unassigned).any(|r| takes_slot(r, slot)) {
            return true;
        }
        candidates
            .iter()
            .filter(|c| !c.is_unassigned())
            .any(|c| self.records_for(date, c).any(|r| takes_slot(r, slot)))
    }

    /// Whether `resource` has at least one of `slots` free on `date`.
    pub fn has_free_slot(&self, resource: &ResourceId, slots: &[RecurringSlot], date: NaiveDate) -> bool {
        let candidates = std::slice::from_ref(resource);
        slots.iter().any(|slot| !self.is_occupied(slot, candidates, date))
    }
}

/// A record takes a slot when it names the slot, or, lacking a slot id, when its
/// `[start, end)` overlaps the slot's.
fn takes_slot(record: &OccupancyRecord, slot: &RecurringSlot) -> bool {
    if let Some(slot_id) = &record.slot_id {
        return *slot_id == slot.id;
    }
    let (Some(r_start), Some(r_end)) = (
        record.start_time.as_deref().and_then(parse_time_of_day),
        record.end_time.as_deref().and_then(parse_time_of_day),
    ) else {
        return false;
    };
    let Some(s_start) = parse_time_of_day(&slot.start_time) else {
        return false;
    };
    let s_end = slot
        .end_time
        .as_deref()
        .and_then(parse_time_of_day)
        .unwrap_or(s_start);
    overlaps(s_start, s_end, r_start, r_end)
}

fn overlaps(s_start: NaiveTime, s_end: NaiveTime, r_start: NaiveTime, r_end: NaiveTime) -> bool {
    if s_start == s_end {
        // instant slot
        return r_start <= s_start && s_start < r_end;
    }
    s_start < r_end && r_start < s_end
}
