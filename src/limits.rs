//! Hard limits. Policy knobs live in `config`; these bound memory and scan cost.

/// Longest look-ahead an availability scan may walk.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Rate windows are kept for at most this many distinct requesters per business.
pub const MAX_TRACKED_REQUESTERS: usize = 100_000;

pub const MAX_REQUESTER_KEY_LEN: usize = 254;

pub const MAX_DESCRIPTION_LEN: usize = 1200;

pub const MAX_BUSINESSES: usize = 10_000;

pub const MAX_BUSINESS_ID_LEN: usize = 200;

/// Upper bound on configured admissions per window.
pub const MAX_ADMISSIONS_PER_WINDOW: usize = 10_000;
