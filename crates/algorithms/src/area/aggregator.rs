//! Class-partitioned bloom area

use baws_core::vector::FeatureCollection;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

use super::measurements::{round_km2, AreaMetric};
use super::profile::ShapeProfile;

/// Area per label in km², one decimal, in profile order with the combined
/// label last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaReport {
    entries: Vec<(String, f64)>,
}

impl AreaReport {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AreaReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Sums polygon area per class of a [`ShapeProfile`]
#[derive(Debug, Clone)]
pub struct AreaAggregator {
    profile: ShapeProfile,
}

impl AreaAggregator {
    pub fn new(profile: ShapeProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ShapeProfile {
        &self.profile
    }

    /// Area report for a loaded collection.
    ///
    /// Returns `None` when nothing is loaded. Areas are geodesic for lon/lat
    /// collections and planar otherwise. Each class entry is rounded on
    /// its own; the combined entry is summed over every feature of the
    /// profile's classes before rounding, so it never inherits the rounding
    /// of the class entries.
    pub fn aggregate(&self, collection: Option<&FeatureCollection>) -> Option<AreaReport> {
        let Some(collection) = collection else {
            warn!("No shapes loaded, area not calculated");
            return None;
        };

        let metric = AreaMetric::for_collection(collection);
        let mut per_class = vec![0.0; self.profile.labels.len()];
        for feature in collection.iter() {
            let Some(code) = feature.class_code() else {
                continue;
            };
            if let Some(slot) = self.profile.labels.iter().position(|(c, _)| *c == code) {
                per_class[slot] += metric.feature_area(feature.geometry.as_ref());
            }
        }
        let combined: f64 = per_class.iter().sum();

        let mut entries: Vec<(String, f64)> = self
            .profile
            .labels
            .iter()
            .zip(&per_class)
            .map(|((_, label), &m2)| (label.clone(), round_km2(m2)))
            .collect();
        entries.push((self.profile.combined_label.clone(), round_km2(combined)));

        debug!("Area over {} feature(s): {:?}", collection.len(), entries);
        Some(AreaReport { entries })
    }
}
