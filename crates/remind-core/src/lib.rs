//! # remind-core
//!
//! Core types, traits, and abstractions for the remind backend.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other remind crates depend on: the reminder and
//! notification models, repository traits over persistence, capability
//! traits over the external AI / places / speech collaborators, the
//! shared error type, and the default constants the scheduling core is
//! built on.

pub mod defaults;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use geo::{haversine_meters, validate_coordinates};
pub use models::*;
pub use temporal::{
    ceil_to_hour, day_name_to_index, is_valid_fixed_time, normalize_schedule_days,
    notification_fire_time, parse_fixed_time, weekday_index,
};
pub use traits::*;
