//! # remind-places
//!
//! Places-lookup capability for the remind backend. The Google backend
//! runs the two-phase strategy (distance-ranked nearest match, then a
//! radius-bounded query) and returns at most one best-matching place.

pub mod google;
pub mod mock;

pub use google::{GooglePlacesBackend, PlacesConfig, DEFAULT_PLACES_BASE_URL};
pub use mock::MockPlacesBackend;
