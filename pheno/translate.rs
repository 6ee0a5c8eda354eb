//! Identifier translation between the sample-list namespace and the `.fam` namespace.
//!
//! The mapping file is tab-separated with a header row followed by one
//! `source<TAB>target` pair per line. Columns after the second are ignored.

use std::io::Read;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use log::{debug, warn};
use thiserror::Error;

use crate::io::{IoError, open_text};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("failed to parse mapping file '{}': {source}", .path.display())]
    Parse { path: PathBuf, source: csv::Error },
    #[error(
        "mapping file '{}' line {line}: expected a source ID and a target ID, found {found} column(s)",
        .path.display()
    )]
    MalformedRow {
        path: PathBuf,
        line: u64,
        found: usize,
    },
}

/// Lookup from source-namespace identifiers to target-namespace identifiers.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: AHashMap<String, String>,
}

impl TranslationTable {
    /// Builds a table from `(source, target)` pairs. A repeated source ID keeps the
    /// target from its last occurrence.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut entries = AHashMap::new();
        let mut overwritten = 0usize;
        for (source, target) in pairs {
            if entries.insert(source.into(), target.into()).is_some() {
                overwritten += 1;
            }
        }

        if overwritten > 0 {
            warn!("{overwritten} source ID(s) appeared more than once in the mapping; the last occurrence was kept");
        }

        Self { entries }
    }

    #[inline]
    pub fn translate(&self, source_id: &str) -> Option<&str> {
        self.entries.get(source_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for TranslationTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(source, target)| other.translate(source) == Some(target.as_str()))
    }
}

impl Eq for TranslationTable {}

/// Reads the tab-separated mapping file at `path`, skipping its header row.
pub fn read_translation_table(path: &Path) -> Result<TranslationTable, TranslateError> {
    let reader = open_text(path)?;
    let table = parse_translation_table(reader, path)?;
    debug!(
        "Loaded {} ID translations from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

fn parse_translation_table<R: Read>(
    reader: R,
    path: &Path,
) -> Result<TranslationTable, TranslateError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut pairs = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|source| TranslateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let (Some(source_id), Some(target_id)) = (record.get(0), record.get(1)) else {
            return Err(TranslateError::MalformedRow {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |pos| pos.line()),
                found: record.len(),
            });
        };
        pairs.push((source_id.to_string(), target_id.to_string()));
    }

    Ok(TranslationTable::from_pairs(pairs))
}
