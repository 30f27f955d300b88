//! Location tracking module for Locus.
//!
//! Wraps a platform location provider behind a small facade with:
//! - Lifecycle controls (start, pause, resume, stop, one-shot request)
//! - An in-memory buffer of the locations observed in the current session
//! - Relaying of location batches and authorization changes to one observer
//!
//! # Architecture
//!
//! ```text
//! Caller
//!     │  start / pause / resume / stop
//!     ▼
//! TrackingFacade ──────► tracking actor (single writer)
//!                              │            ▲
//!                              ▼            │ ProviderEvents
//!                        LocationProvider ──┘
//!                              │
//!                              ▼
//!                        TrackingObserver (weak)
//! ```
//!
//! All facade state lives on one actor task. Control calls, snapshot queries
//! and provider callbacks are messages on the same queue, so they are applied
//! in the order they were issued.
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use locus_core::location::testing::{FakeProvider, RecordingObserver};
//! use locus_core::location::{TrackingConfig, TrackingFacade};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let provider = FakeProvider::new();
//! let facade = TrackingFacade::new(provider.clone(), TrackingConfig::default()).unwrap();
//!
//! let observer = Arc::new(RecordingObserver::new());
//! facade.set_observer(&observer);
//!
//! facade.start_tracking().await;
//! assert!(facade.recorded_locations().await.is_empty());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod observer;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{DesiredAccuracy, TrackingConfig};
pub use error::{ProviderError, ProviderErrorKind, TrackingError, TrackingResult};
pub use facade::TrackingFacade;
pub use observer::TrackingObserver;
pub use provider::{LocationProvider, ProviderDelegate, ProviderEvents};
pub use types::{AuthorizationStatus, Location, TrackingState};
