//! TOML settings for the `baws` binary
//!
//! ```toml
//! current_date = "2019-07-03"
//! window_days = 7
//! archive_dir = "/data/manuell_algtolkning"
//! production_dir = "/data/production/2019"
//! thresholds_csv = "valid_area.csv"   # optional
//!
//! [naming]
//! day_prefix = "cyano_daymap"
//! day_marker = "_daymap_"
//! week_marker = "_weekmap_"
//!
//! [[valid_area]]
//! class = 2
//! min_area = 2000000.0
//! ```

use anyhow::{bail, Context, Result};
use baws_algorithms::composite::{CompositeParams, DateWindow, SelectionParams};
use baws_algorithms::validity::ValidAreaPolicy;
use baws_core::io::Compression;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Current working date, quoted `YYYY-MM-DD`
    pub current_date: NaiveDate,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    pub archive_dir: PathBuf,
    pub production_dir: PathBuf,
    #[serde(default)]
    pub naming: Naming,
    /// `class,min_area` table, applied before `valid_area` entries
    #[serde(default)]
    pub thresholds_csv: Option<PathBuf>,
    #[serde(default)]
    pub valid_area: Vec<ValidAreaEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Naming {
    pub day_prefix: String,
    pub extension: String,
    pub date_format: String,
    pub day_marker: String,
    pub week_marker: String,
    pub compression: String,
}

impl Default for Naming {
    fn default() -> Self {
        let selection = SelectionParams::default();
        let composite = CompositeParams::default();
        Self {
            day_prefix: selection.day_prefix,
            extension: selection.extension,
            date_format: selection.date_format,
            day_marker: composite.day_marker,
            week_marker: composite.week_marker,
            compression: "lzw".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidAreaEntry {
    pub class: i64,
    pub min_area: f64,
}

fn default_window_days() -> u32 {
    7
}

impl Settings {
    /// Read, parse and validate a settings file.
    ///
    /// Relative paths in the file are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

        if let Some(base) = path.parent() {
            settings.resolve_paths(base);
        }
        settings.validate()?;
        Ok(settings)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.archive_dir);
        resolve(&mut self.production_dir);
        if let Some(csv) = self.thresholds_csv.as_mut() {
            resolve(csv);
        }
    }

    /// Check every setting, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(1..=255).contains(&self.window_days) {
            errors.push(format!("window_days must be 1..=255, got {}", self.window_days));
        }
        let n = &self.naming;
        for (name, value) in [
            ("naming.day_prefix", &n.day_prefix),
            ("naming.day_marker", &n.day_marker),
            ("naming.week_marker", &n.week_marker),
            ("naming.date_format", &n.date_format),
        ] {
            if value.is_empty() {
                errors.push(format!("{} must not be empty", name));
            }
        }
        if n.day_marker == n.week_marker {
            errors.push("naming.day_marker and naming.week_marker must differ".to_string());
        }
        if Compression::from_name(&n.compression).is_none() {
            errors.push(format!(
                "naming.compression must be none, lzw or deflate, got '{}'",
                n.compression
            ));
        }
        for entry in &self.valid_area {
            if !entry.min_area.is_finite() || entry.min_area < 0.0 {
                errors.push(format!(
                    "valid_area for class {} must be a non-negative number, got {}",
                    entry.class, entry.min_area
                ));
            }
        }

        if !errors.is_empty() {
            let list = errors
                .iter()
                .map(|e| format!("  - {}", e))
                .collect::<Vec<_>>()
                .join("\n");
            bail!("Invalid settings:\n{}", list);
        }
        Ok(())
    }

    pub fn window(&self) -> Result<DateWindow> {
        DateWindow::ending_on(self.current_date, self.window_days).context("Invalid date window")
    }

    pub fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            archive_dir: self.archive_dir.clone(),
            production_dir: self.production_dir.clone(),
            day_prefix: self.naming.day_prefix.clone(),
            extension: self.naming.extension.clone(),
            date_format: self.naming.date_format.clone(),
        }
    }

    pub fn composite_params(&self) -> CompositeParams {
        CompositeParams {
            day_marker: self.naming.day_marker.clone(),
            week_marker: self.naming.week_marker.clone(),
            compression: Compression::from_name(&self.naming.compression)
                .unwrap_or(Compression::Lzw),
            ..CompositeParams::default()
        }
    }

    /// Thresholds from the CSV table, then the inline entries
    pub fn valid_area_policy(&self) -> Result<ValidAreaPolicy> {
        let mut policy = match &self.thresholds_csv {
            Some(path) => ValidAreaPolicy::from_csv(path)
                .with_context(|| format!("Failed to load thresholds from {}", path.display()))?,
            None => ValidAreaPolicy::new(),
        };
        for entry in &self.valid_area {
            policy
                .insert(entry.class, entry.min_area)
                .context("Invalid valid_area entry")?;
        }
        Ok(policy)
    }

    /// Date token of the current working date as used in file names
    pub fn date_token(&self) -> String {
        self.current_date.format(&self.naming.date_format).to_string()
    }
}
