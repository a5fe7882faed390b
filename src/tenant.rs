use std::sync::Arc;

use dashmap::DashMap;

use crate::config::Config;
use crate::engine::AvailabilityEngine;
use crate::error::TenantError;
use crate::intake::IntakeGuard;
use crate::limits::*;
use crate::store::{OccupancySource, RequestStore};
use crate::storefront::Storefront;
use crate::sweeper;

/// Manages per-business storefronts. Each business gets its own engine, intake
/// guard and sweeper; the store collaborators are shared.
pub struct BusinessManager {
    storefronts: DashMap<String, Arc<Storefront>>,
    occupancy: Arc<dyn OccupancySource>,
    requests: Arc<dyn RequestStore>,
    config: Config,
}

impl BusinessManager {
    pub fn new(config: Config, occupancy: Arc<dyn OccupancySource>, requests: Arc<dyn RequestStore>) -> Self {
        Self {
            storefronts: DashMap::new(),
            occupancy,
            requests,
            config,
        }
    }

    /// Get or lazily create the storefront for `business_id`. Must be called from
    /// within a Tokio runtime (the sweeper is spawned on creation).
    pub fn get_or_create(&self, business_id: &str) -> Result<Arc<Storefront>, TenantError> {
        let id = business_id.trim();
        if let Some(front) = self.storefronts.get(id) {
            return Ok(front.value().clone());
        }
        if id.is_empty() {
            return Err(TenantError::InvalidBusinessId("empty business id"));
        }
        if id.len() > MAX_BUSINESS_ID_LEN {
            return Err(TenantError::InvalidBusinessId("business id too long"));
        }
        if id.chars().any(char::is_control) {
            return Err(TenantError::InvalidBusinessId("control characters in business id"));
        }
        if self.storefronts.len() >= MAX_BUSINESSES {
            return Err(TenantError::LimitExceeded("too many businesses"));
        }

        let front = self
            .storefronts
            .entry(id.to_string())
            .or_insert_with(|| {
                let guard = Arc::new(IntakeGuard::new(self.config.intake));
                tokio::spawn(sweeper::run_sweeper(Arc::downgrade(&guard), self.config.sweep_interval));
                tracing::info!(business = %id, "storefront created");
                Arc::new(Storefront::new(
                    id,
                    AvailabilityEngine::new(self.config.availability),
                    guard,
                    self.occupancy.clone(),
                    self.requests.clone(),
                ))
            })
            .clone();
        metrics::gauge!(crate::observability::BUSINESSES_ACTIVE).set(self.storefronts.len() as f64);
        Ok(front)
    }

    pub fn get(&self, business_id: &str) -> Option<Arc<Storefront>> {
        self.storefronts.get(business_id.trim()).map(|f| f.value().clone())
    }

    /// Drop a business. Its sweeper exits on the next tick once the last
    /// outstanding handle is gone.
    pub fn remove(&self, business_id: &str) -> bool {
        let removed = self.storefronts.remove(business_id.trim()).is_some();
        if removed {
            metrics::gauge!(crate::observability::BUSINESSES_ACTIVE).set(self.storefronts.len() as f64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.storefronts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storefronts.is_empty()
    }
}
