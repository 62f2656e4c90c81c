//! Class groupings for daily and weekly bloom products

use baws_core::class;
use baws_core::crs::CRS;
use baws_core::vector::FeatureCollection;

/// Longest weekly look-back, in days
pub const WEEK_DAYS: i64 = 7;

/// Which classes a bloom product reports on and how they are labelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProfile {
    /// `(class, label)` pairs, in report order
    pub labels: Vec<(i64, String)>,
    /// Label of the combined area over all classes of interest
    pub combined_label: String,
    /// Classes in drawing order, bottom layer first
    pub draw_priority: Vec<i64>,
    /// EPSG code of exported geometries
    pub export_epsg: u32,
}

impl ShapeProfile {
    /// Daily bloom maps: subsurface and surface accumulations
    pub fn daily() -> Self {
        Self {
            labels: vec![
                (class::SUBSURFACE, "subsurface_area".to_string()),
                (class::SURFACE, "surface_area".to_string()),
            ],
            combined_label: "daily_bloom_area".to_string(),
            draw_priority: vec![class::NO_DATA, class::SUBSURFACE, class::SURFACE, class::CLOUD],
            export_epsg: 4326,
        }
    }

    /// Weekly composites: one bucket per number of bloom days
    pub fn weekly() -> Self {
        Self {
            labels: (1..=WEEK_DAYS).map(|i| (i, format!("{}-day bloom", i))).collect(),
            combined_label: "weekly_bloom_area".to_string(),
            draw_priority: (1..=WEEK_DAYS).collect(),
            export_epsg: 4326,
        }
    }

    /// Profile by name (`daily` or `weekly`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "daily" | "day" => Some(Self::daily()),
            "weekly" | "week" => Some(Self::weekly()),
            _ => None,
        }
    }

    /// Classes of interest, in report order
    pub fn classes(&self) -> Vec<i64> {
        self.labels.iter().map(|(c, _)| *c).collect()
    }

    pub fn label(&self, class: i64) -> Option<&str> {
        self.labels
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, l)| l.as_str())
    }

    pub fn contains(&self, class: i64) -> bool {
        self.labels.iter().any(|(c, _)| *c == class)
    }

    pub fn export_crs(&self) -> CRS {
        CRS::from_epsg(self.export_epsg)
    }

    /// Feature positions in drawing order.
    ///
    /// Features are grouped by `draw_priority` so the last class ends up on
    /// top. Dummy polygons, unclassified features and classes outside the
    /// priority list are not drawn.
    pub fn draw_order(&self, collection: &FeatureCollection) -> Vec<usize> {
        let mut order = Vec::new();
        for &wanted in &self.draw_priority {
            if wanted == class::DUMMY {
                continue;
            }
            order.extend(
                collection
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.geometry.is_some() && f.class_code() == Some(wanted))
                    .map(|(i, _)| i),
            );
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baws_core::vector::Feature;
    use geo::{Geometry, Point};

    #[test]
    fn test_daily_profile() {
        let p = ShapeProfile::daily();
        assert_eq!(p.classes(), vec![2, 3]);
        assert_eq!(p.label(2), Some("subsurface_area"));
        assert_eq!(p.label(3), Some("surface_area"));
        assert_eq!(p.label(1), None);
        assert_eq!(p.combined_label, "daily_bloom_area");
        assert!(p.export_crs().is_geographic());
    }

    #[test]
    fn test_weekly_profile() {
        let p = ShapeProfile::weekly();
        assert_eq!(p.classes(), (1..=7).collect::<Vec<_>>());
        assert_eq!(p.label(5), Some("5-day bloom"));
        assert_eq!(p.combined_label, "weekly_bloom_area");
        assert!(ShapeProfile::from_name("Weekly").is_some());
        assert!(ShapeProfile::from_name("monthly").is_none());
    }

    #[test]
    fn test_draw_order() {
        let pt = || Geometry::Point(Point::new(0.0, 0.0));
        let fc: FeatureCollection = vec![
            Feature::classified(pt(), 1),
            Feature::classified(pt(), 3),
            Feature::classified(pt(), 0),
            Feature::classified(pt(), 2),
            Feature::classified(pt(), 4),
        ]
        .into_iter()
        .collect();

        assert_eq!(ShapeProfile::daily().draw_order(&fc), vec![4, 3, 1, 0]);
    }
}
