//! Flutter-Rust bridge wrapper for locus-core.
//!
//! This crate is the thin layer the Flutter build system links through
//! Cargokit. It re-exports `locus-core` and adds the host-facing API: a
//! provider the host platform drives and an observer the host drains.

pub mod api;
mod events;
mod platform;

pub use events::{LocationFix, TrackingEvent};
pub use locus_core::*;
pub use platform::ProviderCommand;
