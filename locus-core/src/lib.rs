//! Locus Core Library
//!
//! Core functionality for Locus - a location tracking facade.
//! This crate mediates between caller intent and a platform location
//! provider, buffers observed locations and relays provider callbacks to a
//! single registered observer.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod location;

pub use location::{
    AuthorizationStatus, Location, LocationProvider, ProviderDelegate, ProviderEvents,
    TrackingConfig, TrackingError, TrackingFacade, TrackingObserver, TrackingResult,
    TrackingState,
};
