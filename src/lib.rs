pub mod config;
pub mod engine;
pub mod error;
pub mod intake;
pub mod limits;
pub mod model;
pub mod observability;
pub mod occupancy;
pub mod recurrence;
pub mod store;
pub mod storefront;
pub mod sweeper;
pub mod tenant;
