//! Weekly bloom compositing
//!
//! - [`DateWindow`]: the days a composite covers
//! - [`FileSetSelector`]: picks archive and production daily maps for a window
//! - [`RasterCompositor`]: counts bloom days per cell over the selected maps

mod compositor;
mod selection;
mod window;

pub use compositor::{
    bloom_indicator, weekly_output_path, BloomDayAccumulator, CompositeParams, RasterCompositor,
    WeeklyComposite, MAX_COMPOSITE_DAYS,
};
pub use selection::{FileSelection, FileSetSelector, SelectionParams};
pub use window::DateWindow;
