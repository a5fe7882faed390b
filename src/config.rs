use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use crate::engine::AvailabilityPolicy;
use crate::intake::IntakePolicy;

/// Runtime settings, read from `SLOTKEEPER_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub availability: AvailabilityPolicy,
    pub intake: IntakePolicy,
    /// How often each business's intake state is swept.
    pub sweep_interval: Duration,
    /// Install the Prometheus recorder and print its snapshot on exit.
    pub metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            availability: AvailabilityPolicy::default(),
            intake: IntakePolicy::default(),
            sweep_interval: Duration::from_secs(30),
            metrics: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        let intake = IntakePolicy {
            max_per_window: env_or("SLOTKEEPER_RATE_MAX", d.intake.max_per_window),
            rate_window: TimeDelta::seconds(env_or::<u32>("SLOTKEEPER_RATE_WINDOW_SECS", 60).into()),
            dedup_window: TimeDelta::seconds(env_or::<u32>("SLOTKEEPER_DEDUP_WINDOW_SECS", 300).into()),
            prefix_chars: env_or("SLOTKEEPER_DEDUP_PREFIX_CHARS", d.intake.prefix_chars),
            min_chars: env_or("SLOTKEEPER_DEDUP_MIN_CHARS", d.intake.min_chars),
        };
        Self {
            availability: AvailabilityPolicy {
                horizon_days: env_or("SLOTKEEPER_HORIZON_DAYS", d.availability.horizon_days),
                unlinked_services_bookable: env_or(
                    "SLOTKEEPER_UNLINKED_BOOKABLE",
                    d.availability.unlinked_services_bookable,
                ),
            },
            intake,
            sweep_interval: Duration::from_secs(env_or::<u64>("SLOTKEEPER_SWEEP_INTERVAL_SECS", 30).max(1)),
            metrics: env_or("SLOTKEEPER_METRICS", d.metrics),
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
