//! Helpers for curating classified polygon layers and their files

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use baws_core::vector::FeatureCollection;
use baws_core::Result;
use tracing::info;

/// Features to drop when clearing `classes`: those with one of the classes
/// and those without geometry
pub fn class_geometry_ids(collection: &FeatureCollection, classes: &[i64]) -> Vec<usize> {
    collection
        .iter()
        .enumerate()
        .filter(|(_, f)| {
            f.geometry.is_none() || f.class_code().is_some_and(|c| classes.contains(&c))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Set `class` on the selected features; returns how many were changed
pub fn assign_class(collection: &mut FeatureCollection, ids: &[usize], class: i64) -> usize {
    let selected: BTreeSet<usize> = ids.iter().copied().collect();
    let mut changed = 0;
    for id in selected {
        if let Some(feature) = collection.get_mut(id) {
            feature.set_class(class);
            changed += 1;
        }
    }
    if changed > 0 {
        info!("Class {} assigned to {} feature(s)", class, changed);
    }
    changed
}

/// `{dir}/{prefix}{date_token}{suffix}`
pub fn shape_output_path(dir: &Path, prefix: &str, date_token: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}{}", prefix, date_token, suffix))
}

/// Files ordered by size, largest first; equal sizes keep their input order
pub fn size_hierarchy(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sized = files
        .iter()
        .map(|f| -> Result<(u64, PathBuf)> { Ok((fs::metadata(f)?.len(), f.clone())) })
        .collect::<Result<Vec<_>>>()?;
    sized.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(sized.into_iter().map(|(_, f)| f).collect())
}

/// Split items into those at even and at odd positions
pub fn interleaved_sets<T: Clone>(items: &[T]) -> (Vec<T>, Vec<T>) {
    let even = items.iter().step_by(2).cloned().collect();
    let odd = items.iter().skip(1).step_by(2).cloned().collect();
    (even, odd)
}
