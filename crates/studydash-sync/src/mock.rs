//! In-memory [`DashboardApi`] for tests.
//!
//! Records every load and save, and can inject latency and failures.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use studydash_core::{DashboardDocument, Error, Result};

use crate::transport::DashboardApi;

#[derive(Default)]
struct MockState {
    stored: DashboardDocument,
    saves: Vec<DashboardDocument>,
    loads: usize,
    failing_saves: u32,
    failing_loads: u32,
    load_latency: Duration,
    save_latency: Duration,
    saves_in_flight: usize,
    max_saves_in_flight: usize,
}

#[derive(Default)]
pub struct MockDashboardApi {
    state: Mutex<MockState>,
}

impl MockDashboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose server-side document starts as `doc`.
    pub fn with_document(doc: DashboardDocument) -> Self {
        let mock = Self::new();
        mock.set_document(doc);
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace what the next load returns.
    pub fn set_document(&self, doc: DashboardDocument) {
        self.state().stored = doc;
    }

    /// Current server-side document.
    pub fn stored(&self) -> DashboardDocument {
        self.state().stored.clone()
    }

    /// Every document saved so far, oldest first.
    pub fn saves(&self) -> Vec<DashboardDocument> {
        self.state().saves.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state().saves.len()
    }

    pub fn load_count(&self) -> usize {
        self.state().loads
    }

    /// Highest number of saves that were running at the same time.
    pub fn max_saves_in_flight(&self) -> usize {
        self.state().max_saves_in_flight
    }

    /// Make the next `n` saves fail with a 500.
    pub fn fail_next_saves(&self, n: u32) {
        self.state().failing_saves = n;
    }

    /// Make the next `n` loads fail with a 500.
    pub fn fail_next_loads(&self, n: u32) {
        self.state().failing_loads = n;
    }

    /// Latency applied to loads that start after this call.
    pub fn set_load_latency(&self, latency: Duration) {
        self.state().load_latency = latency;
    }

    /// Latency applied to saves that start after this call.
    pub fn set_save_latency(&self, latency: Duration) {
        self.state().save_latency = latency;
    }
}

#[async_trait]
impl DashboardApi for MockDashboardApi {
    async fn load(&self) -> Result<DashboardDocument> {
        // Snapshot at call time so a slow load returns what was stored when
        // it started.
        let (latency, result) = {
            let mut state = self.state();
            state.loads += 1;
            let result = if state.failing_loads > 0 {
                state.failing_loads -= 1;
                Err(Error::Api {
                    status: 500,
                    message: "Failed to load data".to_string(),
                })
            } else {
                Ok(state.stored.clone())
            };
            (state.load_latency, result)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn save(&self, doc: &DashboardDocument) -> Result<()> {
        let latency = {
            let mut state = self.state();
            state.saves_in_flight += 1;
            state.max_saves_in_flight = state.max_saves_in_flight.max(state.saves_in_flight);
            state.save_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        state.saves_in_flight -= 1;
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(Error::Api {
                status: 500,
                message: "Failed to save data".to_string(),
            });
        }
        state.stored = doc.clone();
        state.saves.push(doc.clone());
        Ok(())
    }
}
