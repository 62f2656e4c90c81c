//! # BAWS Algorithms
//!
//! Processing engine for curated algal bloom maps.
//!
//! ## Modules
//!
//! - **validity**: per-class minimum area, detection of spurious polygons
//! - **area**: bloom area per class for daily and weekly products
//! - **composite**: date windows, daily map selection, weekly bloom-day counts
//! - **editing**: class reassignment and file helpers used while curating
//!
//! Everything runs single-threaded and synchronously; I/O goes through the
//! collaborator traits of `baws_core::io`.

pub mod area;
pub mod composite;
pub mod editing;
pub mod validity;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::area::{AreaAggregator, AreaMetric, AreaReport, ShapeProfile};
    pub use crate::composite::{
        CompositeParams, DateWindow, FileSelection, FileSetSelector, RasterCompositor,
        SelectionParams, WeeklyComposite,
    };
    pub use crate::editing::{assign_class, class_geometry_ids};
    pub use crate::validity::{GeometryValidityFilter, InvalidReason, ValidAreaPolicy};
    pub use baws_core::prelude::*;
}
