//! Temporal reachability engine.
//!
//! Answers "from each of these places, at each of these times, what can be
//! reached within a travel budget?" over a network of walking links and
//! scheduled transit, and aggregates the answers per location.

pub mod domain;
pub mod engine;
pub mod network;
pub mod reachability;
pub mod sample;
