//! Classified vector features
//!
//! Bloom polygons are plain features whose `class` attribute holds the bloom
//! class code. The attribute may be missing or mistyped when a polygon was
//! drawn by hand without a class assignment, so it is kept as a loosely
//! typed [`AttributeValue`] and interpreted through [`Feature::class_code`].

mod reproject;

pub use reproject::{reproject_collection, reproject_geometry, TransverseMercator};

use crate::crs::CRS;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Name of the attribute field holding the bloom class code
pub const CLASS_FIELD: &str = "class";

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with geometry and a class code
    pub fn classified(geometry: Geometry<f64>, class: i64) -> Self {
        let mut feature = Self::new(geometry);
        feature.set_class(class);
        feature
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Set the class attribute
    pub fn set_class(&mut self, class: i64) {
        self.set_property(CLASS_FIELD, AttributeValue::Int(class));
    }

    /// The class code, if the class attribute is a well-formed integer.
    ///
    /// Floats, strings and nulls yield `None` even when they look numeric:
    /// they come from polygons that never received a proper class.
    pub fn class_code(&self) -> Option<i64> {
        match self.get_property(CLASS_FIELD) {
            Some(AttributeValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Ordered collection of features sharing one CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    /// CRS of every geometry in the collection, when known
    pub crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crs(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs: Some(crs),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Feature> {
        self.features.get_mut(index)
    }

    /// Remove the features at the given positions.
    ///
    /// Positions refer to the collection before removal; out-of-range and
    /// repeated positions are ignored. Returns the number of removed features.
    pub fn remove_features(&mut self, ids: &[usize]) -> usize {
        let doomed: BTreeSet<usize> = ids.iter().copied().filter(|&i| i < self.len()).collect();
        if doomed.is_empty() {
            return 0;
        }
        let mut index = 0;
        self.features.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        doomed.len()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
            crs: None,
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
