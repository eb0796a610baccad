//! reachcheck-engine - Listing reconciliation engine
//!
//! Collects one small business's listing from independent map/search
//! providers, normalizes the heterogeneous representations into canonical
//! comparable forms, computes field-level agreement with a preserved
//! evidentiary trail, and emits an immutable diagnostic report.
//!
//! Rendering (HTML/PDF), HTTP serving, and the map/search UI live outside
//! this crate; the serialized [`models::DiagnosticReport`] is the contract
//! with those collaborators.

pub mod annotator;
pub mod compare;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod snapshot;

pub use pipeline::Pipeline;
pub use reachcheck_common::{Error, Result};
