//! Per-class minimum valid area

use baws_core::io::text::{ReaderKind, TextData};
use baws_core::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Minimum feature area (CRS units squared, m² for projected grids) per class.
///
/// Polygons smaller than their class threshold are digitising noise; classes
/// without a threshold are never rejected on size by this table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidAreaPolicy {
    thresholds: BTreeMap<i64, f64>,
}

impl ValidAreaPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from `(class, min_area)` pairs.
    ///
    /// Thresholds must be finite and non-negative; a repeated class keeps
    /// its last threshold.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        let mut policy = Self::new();
        for (class, min_area) in pairs {
            policy.insert(class, min_area)?;
        }
        Ok(policy)
    }

    /// Load a `class,min_area` CSV table
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let Some(TextData::Table { headers, rows }) = ReaderKind::Table.read(path)? else {
            return Err(Error::format(&source, "expected a CSV table"));
        };

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::format(&source, format!("missing '{}' column", name)))
        };
        let class_col = column("class")?;
        let area_col = column("min_area")?;

        let mut policy = Self::new();
        for (i, row) in rows.iter().enumerate() {
            let cell = |col: usize| row.get(col).map(String::as_str).unwrap_or("");
            let bad = |name: &str, col: usize| {
                Error::format(&source, format!("row {}: bad {} '{}'", i + 1, name, cell(col)))
            };
            let class: i64 = cell(class_col).parse().map_err(|_| bad("class", class_col))?;
            let min_area: f64 = cell(area_col).parse().map_err(|_| bad("min_area", area_col))?;
            policy.insert(class, min_area)?;
        }
        Ok(policy)
    }

    /// Set the threshold for a class
    pub fn insert(&mut self, class: i64, min_area: f64) -> Result<()> {
        if !min_area.is_finite() || min_area < 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_area",
                value: min_area.to_string(),
                reason: format!("threshold for class {} must be finite and non-negative", class),
            });
        }
        self.thresholds.insert(class, min_area);
        Ok(())
    }

    /// Threshold for a class, if one is configured
    pub fn threshold(&self, class: i64) -> Option<f64> {
        self.thresholds.get(&class).copied()
    }

    /// Whether a feature of `class` with `area` falls below its threshold
    pub fn is_below(&self, class: i64, area: f64) -> bool {
        self.threshold(class).is_some_and(|min| area < min)
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.thresholds.iter().map(|(&c, &a)| (c, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup() {
        let policy = ValidAreaPolicy::from_pairs([(2, 1.0e6), (3, 5.0e5)]).unwrap();
        assert_eq!(policy.threshold(2), Some(1.0e6));
        assert_eq!(policy.threshold(1), None);
        assert!(policy.is_below(3, 4.0e5));
        assert!(!policy.is_below(3, 5.0e5));
        assert!(!policy.is_below(1, 0.0));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        assert!(ValidAreaPolicy::from_pairs([(2, -1.0)]).is_err());
        assert!(ValidAreaPolicy::from_pairs([(2, f64::NAN)]).is_err());
    }

    #[test]
    fn test_from_csv() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "class,min_area").unwrap();
        writeln!(file, "2,2000000").unwrap();
        writeln!(file, "3,1500000.5").unwrap();
        file.flush().unwrap();

        let policy = ValidAreaPolicy::from_csv(file.path()).unwrap();
        assert_eq!(policy.threshold(2), Some(2.0e6));
        assert_eq!(policy.threshold(3), Some(1_500_000.5));
        assert_eq!(policy.iter().count(), 2);
    }

    #[test]
    fn test_from_csv_bad_class() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "class,min_area").unwrap();
        writeln!(file, "surface,2000000").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            ValidAreaPolicy::from_csv(file.path()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_from_csv_bad_min_area_names_row() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "class,min_area").unwrap();
        writeln!(file, "2,2000000").unwrap();
        writeln!(file, "3,large").unwrap();
        file.flush().unwrap();

        let message = ValidAreaPolicy::from_csv(file.path()).unwrap_err().to_string();
        assert!(message.contains("row 2: bad min_area 'large'"), "{}", message);
    }
}
