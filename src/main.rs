use std::io::Write;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use slotkeeper::config::Config;
use slotkeeper::engine::BusinessSchedule;
use slotkeeper::model::{LocalInstant, OccupancyRecord, local_now};
use slotkeeper::recurrence::upcoming_occurrences;
use slotkeeper::store::MemoryStore;
use slotkeeper::tenant::BusinessManager;

/// A business as loaded from disk: its schedule, known occupancy, and an optional
/// evaluation instant.
#[derive(Deserialize)]
struct Snapshot {
    business_id: String,
    #[serde(flatten)]
    schedule: BusinessSchedule,
    #[serde(default)]
    occupancy: Vec<OccupancyRecord>,
    #[serde(default)]
    now: Option<LocalInstant>,
    #[serde(default = "default_upcoming_limit")]
    upcoming_limit: usize,
}

fn default_upcoming_limit() -> usize {
    5
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = Config::from_env();
    let metrics = if config.metrics {
        slotkeeper::observability::install_recorder()
    } else {
        None
    };

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: slotkeeper <snapshot.json>")?;
    let raw = std::fs::read_to_string(&path)?;
    let mut snapshot: Snapshot = serde_json::from_str(&raw)?;
    let now = snapshot.now.unwrap_or_else(local_now);

    for record in &mut snapshot.occupancy {
        if record.business_id.is_empty() {
            record.business_id = snapshot.business_id.clone();
        }
    }

    info!("slotkeeper evaluating {path}");
    info!("  business: {}", snapshot.business_id);
    info!("  now: {now}");
    info!("  horizon_days: {}", config.availability.horizon_days);

    let store = Arc::new(MemoryStore::new());
    store.insert_occupancy(&snapshot.business_id, std::mem::take(&mut snapshot.occupancy));
    let manager = BusinessManager::new(config, store.clone(), store);
    let storefront = manager.get_or_create(&snapshot.business_id)?;

    let results = storefront
        .catalog_availability(&snapshot.schedule, now)
        .await;
    let upcoming = upcoming_occurrences(snapshot.schedule.slots(), now, snapshot.upcoming_limit);

    let mut out = std::io::stdout().lock();
    for result in &results {
        writeln!(out, "{}", serde_json::to_string(result)?)?;
    }
    writeln!(out, "{}", serde_json::json!({ "upcoming": upcoming }))?;
    out.flush()?;

    info!(
        bookable = results.iter().filter(|r| r.bookable).count(),
        services = results.len(),
        "evaluation complete"
    );
    if let Some(handle) = metrics {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
