//! Builds the per-individual phenotype lookup from the case and control lists.
//!
//! Both lists hold source-namespace identifiers, one per row, optionally CSV-quoted.
//! Every listed identifier must translate; an unmapped one means the lists and the
//! mapping file disagree, and the run stops.

use std::io::Read;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use log::{debug, warn};
use thiserror::Error;

use crate::io::{IoError, open_text};
use crate::translate::TranslationTable;
use crate::types::{ListKind, PhenotypeCode, PhenotypeCoding};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("failed to parse {list} list '{}': {source}", .path.display())]
    Parse {
        list: ListKind,
        path: PathBuf,
        source: csv::Error,
    },
    #[error("{list} ID '{id}' (line {line}) has no entry in the ID mapping")]
    UnknownIdentifier { id: String, list: ListKind, line: u64 },
}

/// One identifier from a case or control list, with the line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedId {
    pub id: String,
    pub line: u64,
}

impl ListedId {
    pub fn new(id: impl Into<String>, line: u64) -> Self {
        Self {
            id: id.into(),
            line,
        }
    }
}

/// Lookup from target-namespace identifiers to phenotype codes.
///
/// Keys are raw bytes so `.fam` IDs are matched exactly as they appear on disk,
/// whatever their encoding.
#[derive(Debug, Clone, Default)]
pub struct PhenotypeTable {
    entries: AHashMap<Vec<u8>, PhenotypeCode>,
}

impl PhenotypeTable {
    #[inline]
    pub fn get(&self, individual_id: impl AsRef<[u8]>) -> Option<PhenotypeCode> {
        self.entries.get(individual_id.as_ref()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of individuals assigned `code`.
    pub fn count(&self, code: PhenotypeCode) -> usize {
        self.entries.values().filter(|&&value| value == code).count()
    }
}

/// Reads a case or control list. The first CSV field of each non-empty row is the ID.
pub fn read_id_list(path: &Path, list: ListKind) -> Result<Vec<ListedId>, ClassifyError> {
    let reader = open_text(path)?;
    let ids = parse_id_list(reader, path, list)?;
    debug!("Read {} {list} ID(s) from {}", ids.len(), path.display());
    Ok(ids)
}

fn parse_id_list<R: Read>(
    reader: R,
    path: &Path,
    list: ListKind,
) -> Result<Vec<ListedId>, ClassifyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut ids = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|source| ClassifyError::Parse {
            list,
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(id) = record.get(0) {
            let line = record.position().map_or(0, |pos| pos.line());
            ids.push(ListedId::new(id, line));
        }
    }
    Ok(ids)
}

/// Translates every listed ID and assigns it the code `coding` prescribes for its list.
///
/// Cases are applied before controls, so an individual present in both lists ends up
/// with the control code.
pub fn build_phenotype_table(
    cases: &[ListedId],
    controls: &[ListedId],
    translation: &TranslationTable,
    coding: PhenotypeCoding,
) -> Result<PhenotypeTable, ClassifyError> {
    let mut entries = AHashMap::with_capacity(cases.len() + controls.len());
    let mut overlapping = 0usize;

    for (list, ids) in [(ListKind::Cases, cases), (ListKind::Controls, controls)] {
        let code = coding.code_for(list);
        for listed in ids {
            let target = translation.translate(&listed.id).ok_or_else(|| {
                ClassifyError::UnknownIdentifier {
                    id: listed.id.clone(),
                    list,
                    line: listed.line,
                }
            })?;
            if let Some(previous) = entries.insert(target.as_bytes().to_vec(), code) {
                if list == ListKind::Controls && previous != code {
                    overlapping += 1;
                    debug!("{target} is listed as both case and control; keeping the control code");
                }
            }
        }
    }

    if overlapping > 0 {
        warn!("{overlapping} individual(s) appear in both the case and control lists; the control code was kept");
    }

    Ok(PhenotypeTable { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation() -> TranslationTable {
        TranslationTable::from_pairs([("A1", "B1"), ("A2", "B2"), ("A3", "B3")])
    }

    fn listed(ids: &[&str]) -> Vec<ListedId> {
        ids.iter()
            .enumerate()
            .map(|(idx, id)| ListedId::new(*id, idx as u64 + 1))
            .collect()
    }

    #[test]
    fn keys_are_target_namespace_ids() {
        let table = build_phenotype_table(
            &listed(&["A1"]),
            &listed(&["A2"]),
            &translation(),
            PhenotypeCoding::Legacy,
        )
        .expect("all IDs translate");

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("B1"), Some(PhenotypeCode::Unaffected));
        assert_eq!(table.get("B2"), Some(PhenotypeCode::Affected));
        assert_eq!(table.get("A1"), None);
        assert_eq!(table.get("B3"), None);
    }

    #[test]
    fn control_assignment_wins_for_overlapping_ids() {
        let table = build_phenotype_table(
            &listed(&["A1", "A3"]),
            &listed(&["A3"]),
            &translation(),
            PhenotypeCoding::Legacy,
        )
        .expect("all IDs translate");

        assert_eq!(table.get("B3"), Some(PhenotypeCode::Affected));
        assert_eq!(table.count(PhenotypeCode::Unaffected), 1);
        assert_eq!(table.count(PhenotypeCode::Affected), 1);
    }

    #[test]
    fn overlap_resolves_to_control_under_conventional_coding_too() {
        let table = build_phenotype_table(
            &listed(&["A1"]),
            &listed(&["A1"]),
            &translation(),
            PhenotypeCoding::Conventional,
        )
        .expect("all IDs translate");

        assert_eq!(table.get("B1"), Some(PhenotypeCode::Unaffected));
    }

    #[test]
    fn unknown_identifier_is_reported_with_its_list_and_line() {
        let err = build_phenotype_table(
            &listed(&["A1"]),
            &listed(&["A2", "A9"]),
            &translation(),
            PhenotypeCoding::Legacy,
        )
        .expect_err("A9 is not mapped");

        match err {
            ClassifyError::UnknownIdentifier { id, list, line } => {
                assert_eq!(id, "A9");
                assert_eq!(list, ListKind::Controls);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_message_names_the_identifier() {
        let err = build_phenotype_table(
            &listed(&["ghost"]),
            &[],
            &translation(),
            PhenotypeCoding::Legacy,
        )
        .expect_err("ghost is not mapped");
        let message = err.to_string();
        assert!(message.contains("'ghost'"), "message was: {message}");
        assert!(message.starts_with("case ID"), "message was: {message}");
    }

    #[test]
    fn id_lists_take_the_first_field_and_unquote_it() {
        let ids = parse_id_list(
            "A1\n\"A2\"\nA3,extra\n\nA4\n".as_bytes(),
            Path::new("cases.IDs"),
            ListKind::Cases,
        )
        .expect("valid list");

        let names: Vec<&str> = ids.iter().map(|listed| listed.id.as_str()).collect();
        assert_eq!(names, ["A1", "A2", "A3", "A4"]);
        assert_eq!(ids[0].line, 1);
        assert_eq!(ids[3].line, 5);
    }

    #[test]
    fn empty_lists_produce_an_empty_table() {
        let table = build_phenotype_table(&[], &[], &translation(), PhenotypeCoding::Legacy)
            .expect("nothing to translate");
        assert!(table.is_empty());
    }
}
