//! Plain-text readers selected by tag
//!
//! Callers name the reader they want with a short tag (`"grid"`, `"table"`);
//! the tag is resolved once through [`ReaderKind::from_tag`] and the resulting
//! kind decides how the file is parsed.

use crate::error::{Error, Result};
use ndarray::Array2;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Tag → reader lookup table
const READER_TAGS: &[(&str, ReaderKind)] = &[
    ("grid", ReaderKind::Grid),
    ("matrix", ReaderKind::Grid),
    ("table", ReaderKind::Table),
    ("csv", ReaderKind::Table),
];

/// Available text readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    /// Whitespace separated numbers, one grid row per line
    Grid,
    /// Comma separated table with a header row
    Table,
    /// Unknown tag; reading yields nothing
    Unsupported,
}

/// Parsed text content
#[derive(Debug, Clone, PartialEq)]
pub enum TextData {
    Grid(Array2<f64>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl ReaderKind {
    /// Resolve a reader tag (case-insensitive); unknown tags map to `Unsupported`
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        READER_TAGS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|&(_, kind)| kind)
            .unwrap_or(ReaderKind::Unsupported)
    }

    /// Read a file with this reader
    pub fn read<P: AsRef<Path>>(self, path: P) -> Result<Option<TextData>> {
        let path = path.as_ref();
        match self {
            ReaderKind::Grid => {
                let text = fs::read_to_string(path)?;
                parse_grid(&text, &path.display().to_string()).map(|g| Some(TextData::Grid(g)))
            }
            ReaderKind::Table => read_table(path).map(Some),
            ReaderKind::Unsupported => {
                warn!("No reader for {}: unrecognised data type", path.display());
                Ok(None)
            }
        }
    }
}

/// Parse whitespace separated numbers into a grid; blank lines and `#` comments are skipped
pub fn parse_grid(text: &str, source: &str) -> Result<Array2<f64>> {
    let mut cols = None;
    let mut values = Vec::new();
    let mut rows = 0;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    Error::format(source, format!("line {}: '{}' is not a number", lineno + 1, tok))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(Error::format(
                    source,
                    format!("line {}: expected {} values, found {}", lineno + 1, n, row.len()),
                ))
            }
            Some(_) => {}
        }
        values.extend(row);
        rows += 1;
    }

    let cols = cols.unwrap_or(0);
    Array2::from_shape_vec((rows, cols), values).map_err(|e| Error::format(source, e.to_string()))
}

fn read_table(path: &Path) -> Result<TextData> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
    Ok(TextData::Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tag_lookup() {
        assert_eq!(ReaderKind::from_tag("grid"), ReaderKind::Grid);
        assert_eq!(ReaderKind::from_tag(" CSV "), ReaderKind::Table);
        assert_eq!(ReaderKind::from_tag("shapefile"), ReaderKind::Unsupported);
    }

    #[test]
    fn test_parse_grid() {
        let grid = parse_grid("# header\n1 2 3\n\n4 5 6\n", "test").unwrap();
        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid[(1, 2)], 6.0);
    }

    #[test]
    fn test_parse_grid_ragged_rows() {
        assert!(matches!(parse_grid("1 2\n3\n", "test"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_read_table_and_unsupported() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "class, min_area").unwrap();
        writeln!(file, "2, 1000000").unwrap();
        file.flush().unwrap();

        match ReaderKind::Table.read(file.path()).unwrap() {
            Some(TextData::Table { headers, rows }) => {
                assert_eq!(headers, vec!["class", "min_area"]);
                assert_eq!(rows, vec![vec!["2".to_string(), "1000000".to_string()]]);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(ReaderKind::Unsupported.read(file.path()).unwrap(), None);
    }
}
