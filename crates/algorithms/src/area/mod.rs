//! Bloom area statistics
//!
//! Polygon areas are summed per class of a [`ShapeProfile`] and reported in
//! km² rounded to one decimal (ties to even).

mod aggregator;
mod measurements;
mod profile;

pub use aggregator::{AreaAggregator, AreaReport};
pub use measurements::{round_km2, AreaMetric, M2_PER_KM2};
pub use profile::{ShapeProfile, WEEK_DAYS};
