//! Endpoint handlers, one module per route family.
//!
//! CPU-bound or blocking work (detectors, classifier and generator calls,
//! PDF parsing) runs on the blocking pool via `spawn_blocking`.

pub mod analysis;
pub mod health;
pub mod predict;
pub mod reports;
pub mod sugar;
