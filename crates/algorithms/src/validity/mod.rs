//! Geometry validity filtering
//!
//! - [`ValidAreaPolicy`]: per-class minimum feature area
//! - [`GeometryValidityFilter`]: flags null, degenerate, undersized or
//!   unclassified polygons

mod filter;
mod policy;

pub use filter::{Finding, GeometryValidityFilter, InvalidReason, MIN_FEATURE_AREA};
pub use policy::ValidAreaPolicy;
