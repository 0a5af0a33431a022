//! # aw-collect
//!
//! The collection pipeline: one collector per Azure object kind, shared
//! fan-out scaffolding, and the orchestrator that wires every collector
//! into a static DAG and merges their outputs into one record stream.

pub mod collectors;
pub mod orchestrator;
mod support;

pub use support::RecordStream;
