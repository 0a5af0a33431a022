//! Record payloads.
//!
//! Every emitted record wraps either a raw wire object enriched with its
//! tenancy or parentage, or a relationship keyed by its parent id.

mod directory;
mod resource;

pub use directory::*;
pub use resource::*;
