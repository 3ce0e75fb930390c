//! Canvas LMS integration layer
//!
//! Everything that talks to or reasons about Canvas lives here: the
//! retrying HTTP client, the typed payloads the gateway cares about,
//! cross-course aggregation, and study guide generation.

pub mod aggregator;
pub mod client;
pub mod study_guide;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::CanvasClient;
