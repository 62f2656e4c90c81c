//! Detection of spurious bloom polygons
//!
//! Two independent checks flag features for removal:
//! - **Threshold**: `area < min_area[class]` for classes with a configured threshold
//! - **Integrity**: missing geometry, area below [`MIN_FEATURE_AREA`], or a
//!   class attribute that is not an integer
//!
//! Areas are geodesic for lon/lat collections and planar otherwise.
//! Feature identifiers are positions in the collection. Detection never
//! mutates; [`GeometryValidityFilter::remove_invalid`] applies the result.

use std::collections::BTreeSet;
use std::fmt;

use baws_core::vector::{Feature, FeatureCollection};
use tracing::info;

use super::policy::ValidAreaPolicy;
use crate::area::AreaMetric;

/// Hard floor in m² below which any polygon is degenerate
pub const MIN_FEATURE_AREA: f64 = 1.0;

/// Why a feature was flagged
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidReason {
    MissingGeometry,
    BelowFloor,
    MalformedClass,
    BelowClassThreshold { class: i64, threshold: f64 },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingGeometry => write!(f, "geometry is missing"),
            InvalidReason::BelowFloor => write!(f, "area below {}", MIN_FEATURE_AREA),
            InvalidReason::MalformedClass => write!(f, "class attribute is not an integer"),
            InvalidReason::BelowClassThreshold { class, threshold } => {
                write!(f, "area below {} for class {}", threshold, class)
            }
        }
    }
}

/// A flagged feature
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub id: usize,
    pub reason: InvalidReason,
    pub area: f64,
}

/// Validity checks over a classified feature collection
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryValidityFilter<'a> {
    policy: Option<&'a ValidAreaPolicy>,
}

impl<'a> GeometryValidityFilter<'a> {
    /// Filter without per-class thresholds; only integrity checks flag features
    pub fn new() -> Self {
        Self { policy: None }
    }

    pub fn with_policy(policy: &'a ValidAreaPolicy) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    /// Features below the minimum area of their class.
    ///
    /// Empty when no policy is configured. Features without geometry or
    /// without an integer class are left to [`Self::integrity_violations`].
    pub fn threshold_violations(&self, collection: &FeatureCollection) -> Vec<Finding> {
        let Some(policy) = self.policy else {
            return Vec::new();
        };
        let metric = AreaMetric::for_collection(collection);

        collection
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| {
                let geometry = feature.geometry.as_ref()?;
                let class = feature.class_code()?;
                let threshold = policy.threshold(class)?;
                let area = metric.area(geometry);
                (area < threshold).then_some(Finding {
                    id,
                    reason: InvalidReason::BelowClassThreshold { class, threshold },
                    area,
                })
            })
            .collect()
    }

    /// Features that are structurally unusable whatever the thresholds
    pub fn integrity_violations(&self, collection: &FeatureCollection) -> Vec<Finding> {
        let metric = AreaMetric::for_collection(collection);
        collection
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| {
                integrity_check(feature, metric).map(|(reason, area)| Finding { id, reason, area })
            })
            .collect()
    }

    /// All findings in feature order, integrity first for the same feature
    pub fn findings(&self, collection: &FeatureCollection) -> Vec<Finding> {
        let mut findings = self.integrity_violations(collection);
        findings.extend(self.threshold_violations(collection));
        findings.sort_by_key(|f| f.id);
        findings
    }

    /// Identifiers of invalid features, ascending and without duplicates
    pub fn invalid_ids(&self, collection: &FeatureCollection) -> Vec<usize> {
        let findings = self.findings(collection);
        for finding in &findings {
            info!(
                "Feature {} flagged invalid: {} (area {:.2} m²)",
                finding.id, finding.reason, finding.area
            );
        }

        let mut seen = BTreeSet::new();
        findings
            .into_iter()
            .map(|f| f.id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Remove every invalid feature; returns the number removed
    pub fn remove_invalid(&self, collection: &mut FeatureCollection) -> usize {
        let ids = self.invalid_ids(collection);
        if ids.is_empty() {
            return 0;
        }
        let removed = collection.remove_features(&ids);
        info!("Removed {} invalid feature(s)", removed);
        removed
    }
}

fn integrity_check(feature: &Feature, metric: AreaMetric) -> Option<(InvalidReason, f64)> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Some((InvalidReason::MissingGeometry, 0.0));
    };
    let area = metric.area(geometry);
    if area < MIN_FEATURE_AREA {
        return Some((InvalidReason::BelowFloor, area));
    }
    if feature.class_code().is_none() {
        return Some((InvalidReason::MalformedClass, area));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use baws_core::vector::AttributeValue;
    use baws_core::CRS;
    use geo::{Geometry, LineString, Polygon};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn square(side: f64) -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (side, 0.0), (side, side), (0.0, side), (0.0, 0.0),
            ]),
            vec![],
        ))
    }

    fn collection() -> FeatureCollection {
        let mut unclassified = Feature::new(square(10.0));
        unclassified.set_property("class", AttributeValue::Null);

        let mut float_class = Feature::new(square(100.0));
        float_class.set_property("class", AttributeValue::Float(2.0));

        vec![
            Feature::classified(square(1000.0), 2), // 1e6 m², valid
            Feature::classified(square(10.0), 2),   // 100 m², below class 2 threshold
            unclassified,                           // 0: class None
            Feature::empty(),                       // no geometry
            Feature::classified(square(0.5), 3),    // 0.25 m², below floor
            float_class,                            // class stored as float
            Feature::classified(square(10.0), 1),   // cloud, no threshold
        ]
        .into_iter()
        .collect()
    }

    fn policy() -> ValidAreaPolicy {
        ValidAreaPolicy::from_pairs([(2, 1000.0), (3, 1000.0)]).unwrap()
    }

    #[test]
    fn test_threshold_violations() {
        let policy = policy();
        let filter = GeometryValidityFilter::with_policy(&policy);
        let ids: Vec<_> = filter
            .threshold_violations(&collection())
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_no_policy_flags_nothing_by_threshold() {
        let filter = GeometryValidityFilter::new();
        assert!(filter.threshold_violations(&collection()).is_empty());
    }

    #[test]
    fn test_integrity_violations() {
        let filter = GeometryValidityFilter::new();
        let findings = filter.integrity_violations(&collection());
        let ids: Vec<_> = findings.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);
        assert_eq!(findings[0].reason, InvalidReason::MalformedClass);
        assert_eq!(findings[1].reason, InvalidReason::MissingGeometry);
        assert_eq!(findings[2].reason, InvalidReason::BelowFloor);
    }

    #[test]
    fn test_unclassified_small_feature_flagged_without_policy() {
        let mut feature = Feature::new(square(50f64.sqrt()));
        feature.set_property("class", AttributeValue::Null);
        let fc: FeatureCollection = vec![feature].into_iter().collect();

        let lenient = ValidAreaPolicy::from_pairs([(2, 0.0)]).unwrap();
        let filter = GeometryValidityFilter::with_policy(&lenient);
        assert_eq!(filter.invalid_ids(&fc), vec![0]);
        assert_eq!(GeometryValidityFilter::new().invalid_ids(&fc), vec![0]);
    }

    #[test]
    fn test_invalid_ids_union_without_duplicates() {
        let policy = policy();
        let filter = GeometryValidityFilter::with_policy(&policy);
        assert_eq!(filter.invalid_ids(&collection()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_remove_invalid_is_idempotent() {
        let policy = policy();
        let filter = GeometryValidityFilter::with_policy(&policy);
        let mut fc = collection();

        assert_eq!(filter.remove_invalid(&mut fc), 5);
        assert_eq!(fc.len(), 2);
        assert!(filter.invalid_ids(&fc).is_empty());
        assert_eq!(filter.remove_invalid(&mut fc), 0);
    }

    #[test]
    fn test_lonlat_thresholds_use_square_metres() {
        // 0.1° x 0.1° at 59N is about 6.4e7 m² but only 0.01 in degrees²
        let cell = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (17.0, 59.0), (17.1, 59.0), (17.1, 59.1), (17.0, 59.1), (17.0, 59.0),
            ]),
            vec![],
        ));
        let mut fc = FeatureCollection::with_crs(CRS::wgs84());
        fc.push(Feature::classified(cell, 2));

        let policy = ValidAreaPolicy::from_pairs([(2, 1.0e7)]).unwrap();
        let filter = GeometryValidityFilter::with_policy(&policy);
        assert!(filter.invalid_ids(&fc).is_empty());
        assert_eq!(filter.remove_invalid(&mut fc), 0);

        let strict = ValidAreaPolicy::from_pairs([(2, 1.0e8)]).unwrap();
        let findings = GeometryValidityFilter::with_policy(&strict).threshold_violations(&fc);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].area > 6.0e7);
    }

    #[test]
    fn test_flagged_features_logged_at_info() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let policy = policy();
        let ids = tracing::subscriber::with_default(subscriber, || {
            GeometryValidityFilter::with_policy(&policy).invalid_ids(&collection())
        });
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("Feature 1 flagged invalid: area below 1000 for class 2"));
        assert!(text.contains("Feature 3 flagged invalid: geometry is missing"));
        assert!(text.contains("Feature 5 flagged invalid: class attribute is not an integer"));
    }
}
