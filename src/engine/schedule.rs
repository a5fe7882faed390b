use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::*;

/// A business's scheduling configuration: recurring slots (in definition order),
/// service ↔ slot links, and the service catalog. Read-only input to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ScheduleParts", into = "ScheduleParts")]
pub struct BusinessSchedule {
    slots: Vec<RecurringSlot>,
    links: Vec<ServiceSlotLink>,
    services: Vec<Service>,
    /// service id → linked slot ids.
    linked: HashMap<ServiceId, HashSet<SlotId>>,
}

#[derive(Serialize, Deserialize)]
struct ScheduleParts {
    #[serde(default)]
    slots: Vec<RecurringSlot>,
    #[serde(default)]
    links: Vec<ServiceSlotLink>,
    #[serde(default)]
    services: Vec<Service>,
}

impl From<ScheduleParts> for BusinessSchedule {
    fn from(p: ScheduleParts) -> Self {
        Self::new(p.slots, p.links, p.services)
    }
}

impl From<BusinessSchedule> for ScheduleParts {
    fn from(s: BusinessSchedule) -> Self {
        Self {
            slots: s.slots,
            links: s.links,
            services: s.services,
        }
    }
}

impl BusinessSchedule {
    pub fn new(slots: Vec<RecurringSlot>, links: Vec<ServiceSlotLink>, services: Vec<Service>) -> Self {
        let mut linked: HashMap<ServiceId, HashSet<SlotId>> = HashMap::new();
        for link in &links {
            linked
                .entry(link.service_id.clone())
                .or_default()
                .insert(link.slot_id.clone());
        }
        Self {
            slots,
            links,
            services,
            linked,
        }
    }

    pub fn slots(&self) -> &[RecurringSlot] {
        &self.slots
    }

    pub fn links(&self) -> &[ServiceSlotLink] {
        &self.links
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn has_active_slots(&self) -> bool {
        self.slots.iter().any(RecurringSlot::is_active)
    }

    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_linked(&self, service_id: &str) -> bool {
        self.linked.get(service_id).is_some_and(|s| !s.is_empty())
    }

    /// Active slots linked to `service_id`, in slot definition order.
    pub fn candidate_slots(&self, service_id: &str) -> Vec<&RecurringSlot> {
        let Some(linked) = self.linked.get(service_id) else {
            return Vec::new();
        };
        self.slots
            .iter()
            .filter(|s| s.is_active() && linked.contains(&s.id))
            .collect()
    }
}
