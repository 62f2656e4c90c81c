//! Selection of the daily rasters that make up a weekly composite
//!
//! Earlier days come from the manual interpretation archive. The current
//! working date is always taken from the production directory, even when
//! the archive holds an older copy of it.

use std::path::{Path, PathBuf};

use baws_core::io::{FileLister, FileQuery};
use baws_core::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::window::DateWindow;

/// Where daily rasters live and how they are named
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionParams {
    /// Manually curated daily maps
    pub archive_dir: PathBuf,
    /// Output of the current production run
    pub production_dir: PathBuf,
    /// Common prefix of daily raster names, followed by `_{date}`
    pub day_prefix: String,
    pub extension: String,
    /// `chrono` format of the date token in file names
    pub date_format: String,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::new(),
            production_dir: PathBuf::new(),
            day_prefix: "cyano_daymap".to_string(),
            extension: ".tiff".to_string(),
            date_format: "%Y%m%d".to_string(),
        }
    }
}

/// Files chosen for one window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSelection {
    /// Ordered files to composite; the production file, if any, is last
    pub files: Vec<PathBuf>,
    /// The production file for the current working date
    pub current: Option<PathBuf>,
    /// Window dates without any matching file
    pub missing: Vec<NaiveDate>,
}

impl FileSelection {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether every date of the window is covered
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Builds the ordered file list for a composite
pub struct FileSetSelector<'a, L: FileLister + ?Sized> {
    lister: &'a L,
    params: &'a SelectionParams,
}

impl<'a, L: FileLister + ?Sized> FileSetSelector<'a, L> {
    pub fn new(lister: &'a L, params: &'a SelectionParams) -> Self {
        Self { lister, params }
    }

    /// Select the files for `window`.
    ///
    /// Days without a file are skipped and reported in
    /// [`FileSelection::missing`]; listing errors propagate.
    pub fn select(&self, window: &DateWindow) -> Result<FileSelection> {
        let p = self.params;
        let tokens = window.tokens(&p.date_format);
        let current_token = window.current().format(&p.date_format).to_string();

        let archive_query = FileQuery::new(p.day_prefix.as_str(), p.extension.as_str())
            .with_any_of(tokens.iter().cloned());
        let mut files: Vec<PathBuf> = Vec::new();
        for path in self.lister.list(&p.archive_dir, &archive_query)? {
            if file_name(&path).contains(&current_token) {
                debug!("Skipping archived copy of current date: {}", path.display());
            } else {
                files.push(path);
            }
        }

        let production_query =
            FileQuery::new(format!("{}_{}", p.day_prefix, current_token), p.extension.as_str());
        let produced = self.lister.list(&p.production_dir, &production_query)?;
        if produced.len() > 1 {
            warn!(
                "{} production files for {}, using {}",
                produced.len(),
                current_token,
                produced[0].display()
            );
        }
        let current = produced.into_iter().next();
        if let Some(path) = &current {
            files.push(path.clone());
        }

        let missing: Vec<NaiveDate> = window
            .dates()
            .iter()
            .zip(&tokens)
            .filter(|(_, token)| !files.iter().any(|f| file_name(f).contains(token.as_str())))
            .map(|(date, _)| *date)
            .collect();

        for date in &missing {
            info!("No daily map for {}, day skipped", date);
        }
        info!(
            "Selected {} of {} daily map(s) for window ending {}",
            files.len(),
            window.len(),
            window.current()
        );

        Ok(FileSelection {
            files,
            current,
            missing,
        })
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}
