//! Reusable fixtures for tracking facade integration tests.
//!
//! Every fixture wires a real `TrackingFacade` to a `FakeProvider` and a
//! `RecordingObserver`. The facade runs on the test's tokio runtime.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::sync::Arc;

use locus_core::location::testing::{FakeProvider, RecordingObserver};
use locus_core::location::{AuthorizationStatus, TrackingConfig, TrackingFacade};

/// A facade together with the doubles it is wired to.
pub struct Harness {
    pub facade: TrackingFacade,
    pub provider: FakeProvider,
    pub observer: Arc<RecordingObserver>,
}

/// Creates a facade with services enabled and an observer registered.
pub fn harness() -> Harness {
    harness_with(FakeProvider::new())
}

/// Creates a facade whose provider reports the given initial status.
pub fn harness_with_status(status: AuthorizationStatus) -> Harness {
    harness_with(FakeProvider::new().with_status(status))
}

/// Creates a facade around the given provider with an observer registered.
pub fn harness_with(provider: FakeProvider) -> Harness {
    let facade = TrackingFacade::new(provider.clone(), TrackingConfig::default())
        .expect("should create tracking facade");
    let observer = Arc::new(RecordingObserver::new());
    facade.set_observer(&observer);

    Harness {
        facade,
        provider,
        observer,
    }
}

impl Harness {
    /// Waits until every event queued so far has been applied.
    ///
    /// Snapshot requests travel through the same queue as provider events,
    /// so once one is answered all earlier events have been handled.
    pub async fn settle(&self) {
        let _ = self.facade.recorded_locations().await;
    }
}
