//! Mock places backend for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use remind_core::{Error, Place, PlacesBackend, Result};

/// Mock [`PlacesBackend`] returning a canned place (or failure).
#[derive(Clone, Default)]
pub struct MockPlacesBackend {
    place: Option<Place>,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPlacesBackend {
    /// Mock that resolves no place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that always resolves the given place.
    pub fn with_place(place: Place) -> Self {
        Self {
            place: Some(place),
            ..Self::default()
        }
    }

    /// Mock whose lookups always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Keywords of all lookups performed.
    pub fn lookups(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of lookups performed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PlacesBackend for MockPlacesBackend {
    async fn find_nearest_by_keyword(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_m: f64,
        keyword: &str,
    ) -> Result<Option<Place>> {
        self.calls.lock().unwrap().push(keyword.to_string());
        if self.fail {
            return Err(Error::Places("mock lookup failure".into()));
        }
        Ok(self.place.clone())
    }
}
