//! # aw-core
//!
//! Core data model and stream machinery for Azure Warden.
//!
//! This crate defines the tagged record envelope emitted to the graph
//! importer, the raw Azure wire types those records wrap, and the four
//! stream combinators the collection pipeline is built from.

pub mod azure;
pub mod constants;
pub mod models;
pub mod pipeline;
pub mod record;

pub use record::{Kind, Record};
