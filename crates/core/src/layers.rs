//! Read-only view of the host application's layer list
//!
//! The host GIS owns its project; this crate only receives a snapshot of
//! `{id, name, kind, source}` records through [`LayerCatalog`] and answers
//! lookups against it. Removing layers goes through [`LayerRemover`], which
//! reports per layer whether it was removed or already gone.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Suffix of the classified daily bloom rasters
pub const CYANO_TIFF_SUFFIX: &str = "cyano.tiff";

/// Kind of map layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Raster,
    Vector,
}

/// One layer as seen by the host
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub source: PathBuf,
}

/// Source of layer snapshots
pub trait LayerCatalog {
    fn list_layers(&self) -> Vec<LayerInfo>;

    /// First layer named exactly `name`
    fn find_layer(&self, name: &str) -> Option<LayerInfo> {
        self.list_layers().into_iter().find(|l| l.name == name)
    }

    /// Daily bloom rasters (`*cyano.tiff`)
    fn cyano_tiff_layers(&self) -> Vec<LayerInfo> {
        filter(self.list_layers(), |l| l.name.ends_with(CYANO_TIFF_SUFFIX))
    }

    /// Layers named `*.tif`
    fn tif_layers(&self) -> Vec<LayerInfo> {
        filter(self.list_layers(), |l| l.name.ends_with(".tif"))
    }

    /// Editable shape layers: everything that is not a `.tif` or a coastline
    fn shape_layers(&self) -> Vec<LayerInfo> {
        filter(self.list_layers(), is_shape_layer)
    }

    /// Shape layers holding bloom polygons, background ocean colour layers excluded
    fn bloom_shape_layers(&self) -> Vec<LayerInfo> {
        filter(self.list_layers(), |l| {
            is_shape_layer(l) && !l.name.contains("ocean_color")
        })
    }

    /// The shape layer being edited, when exactly one is shown
    fn active_shape_layer(&self) -> Option<LayerInfo> {
        let mut layers = self.shape_layers();
        if layers.len() == 1 {
            layers.pop()
        } else {
            None
        }
    }
}

fn is_shape_layer(layer: &LayerInfo) -> bool {
    !layer.name.ends_with(".tif") && !layer.name.contains("coastline")
}

fn filter(layers: Vec<LayerInfo>, pred: impl Fn(&LayerInfo) -> bool) -> Vec<LayerInfo> {
    layers.into_iter().filter(|l| pred(l)).collect()
}

/// Owned layer list captured from the host
#[derive(Debug, Clone, Default)]
pub struct LayerSnapshot {
    pub layers: Vec<LayerInfo>,
}

impl LayerSnapshot {
    pub fn new(layers: Vec<LayerInfo>) -> Self {
        Self { layers }
    }
}

impl LayerCatalog for LayerSnapshot {
    fn list_layers(&self) -> Vec<LayerInfo> {
        self.layers.clone()
    }
}

/// What happened to a layer removal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    AlreadyAbsent,
}

/// Removes layers from the host project
pub trait LayerRemover {
    fn remove_layer(&mut self, id: &str) -> Result<RemovalOutcome>;
}

/// Remove layers by name, one outcome per requested name.
///
/// Names missing from the catalog report [`RemovalOutcome::AlreadyAbsent`];
/// failures from the remover are returned as they are.
pub fn remove_layers_by_name<C, R>(
    catalog: &C,
    remover: &mut R,
    names: &[&str],
) -> Vec<(String, Result<RemovalOutcome>)>
where
    C: LayerCatalog + ?Sized,
    R: LayerRemover + ?Sized,
{
    names
        .iter()
        .map(|&name| {
            let outcome = match catalog.find_layer(name) {
                Some(layer) => remover.remove_layer(&layer.id),
                None => Ok(RemovalOutcome::AlreadyAbsent),
            };
            (name.to_string(), outcome)
        })
        .collect()
}

impl LayerRemover for LayerSnapshot {
    fn remove_layer(&mut self, id: &str) -> Result<RemovalOutcome> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() < before {
            Ok(RemovalOutcome::Removed)
        } else {
            Ok(RemovalOutcome::AlreadyAbsent)
        }
    }
}

/// Error for a layer the host refused to remove
pub fn removal_failed(layer: &str, reason: impl Into<String>) -> Error {
    Error::Layer {
        layer: layer.to_string(),
        reason: reason.into(),
    }
}
