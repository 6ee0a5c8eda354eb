// ========================================================================================
//
//                              The record annotator
//
// ========================================================================================
//
// Streams `.fam` lines through the phenotype lookup. Each line is split on whitespace,
// its individual ID (the first field) is looked up, and the phenotype field (the sixth)
// is replaced by the matching code or by the missing sentinel. Lines are produced one
// at a time, in input order, and nothing but running counts survives between them.
//
// Records are handled as bytes. IDs are opaque tokens and are never decoded, so a
// `.fam` written in Latin-1 or any other encoding passes through unchanged.

use std::io::{self, Write};

use log::debug;
use thiserror::Error;

use crate::classify::PhenotypeTable;
use crate::types::PhenotypeCode;

/// Minimum number of whitespace-delimited fields in a record.
pub const MIN_RECORD_FIELDS: usize = 6;

const ID_FIELD: usize = 0;
const PHENOTYPE_FIELD: usize = 5;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("failed to read record on line {line}: {source}")]
    Read { line: u64, source: io::Error },
    #[error("failed to write annotated record for line {line}: {source}")]
    Write { line: u64, source: io::Error },
    #[error(
        "line {line}: expected at least {min} whitespace-delimited fields, found {found}",
        min = MIN_RECORD_FIELDS
    )]
    MalformedRecord { line: u64, found: usize },
}

/// Per-code tallies of the records written so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub records: u64,
    pub unaffected: u64,
    pub affected: u64,
    pub missing: u64,
}

impl AnnotationSummary {
    fn record(&mut self, code: PhenotypeCode) {
        self.records += 1;
        match code {
            PhenotypeCode::Unaffected => self.unaffected += 1,
            PhenotypeCode::Affected => self.affected += 1,
            PhenotypeCode::Missing => self.missing += 1,
        }
    }
}

/// Rewrites the phenotype field of a single record.
///
/// Returns the space-joined output line together with the code that was written, or
/// the number of fields found when the line is too short to be a record.
pub fn annotate_line(
    line: &[u8],
    table: &PhenotypeTable,
) -> Result<(Vec<u8>, PhenotypeCode), usize> {
    let mut fields: Vec<&[u8]> = line
        .split(|byte| byte.is_ascii_whitespace())
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < MIN_RECORD_FIELDS {
        return Err(fields.len());
    }

    let code = table
        .get(fields[ID_FIELD])
        .unwrap_or(PhenotypeCode::Missing);
    fields[PHENOTYPE_FIELD] = code.token().as_bytes();

    Ok((fields.join(&b' '), code))
}

/// A lazy, single-pass iterator of annotated lines.
///
/// Yields one item per input line. The first error ends the stream.
pub struct Annotator<'t, L> {
    lines: L,
    table: &'t PhenotypeTable,
    line_no: u64,
    summary: AnnotationSummary,
    failed: bool,
}

/// Wraps a sequence of raw `.fam` lines, without their terminators, into an [`Annotator`].
pub fn annotate<L>(lines: L, table: &PhenotypeTable) -> Annotator<'_, L::IntoIter>
where
    L: IntoIterator<Item = io::Result<Vec<u8>>>,
{
    Annotator {
        lines: lines.into_iter(),
        table,
        line_no: 0,
        summary: AnnotationSummary::default(),
        failed: false,
    }
}

impl<L> Annotator<'_, L> {
    /// Counts for the lines yielded so far.
    pub fn summary(&self) -> AnnotationSummary {
        self.summary
    }
}

impl<L> Iterator for Annotator<'_, L>
where
    L: Iterator<Item = io::Result<Vec<u8>>>,
{
    type Item = Result<Vec<u8>, AnnotateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let raw = self.lines.next()?;
        self.line_no += 1;
        let line = self.line_no;

        let result = raw
            .map_err(|source| AnnotateError::Read { line, source })
            .and_then(|record| {
                annotate_line(&record, self.table)
                    .map_err(|found| AnnotateError::MalformedRecord { line, found })
            });

        match result {
            Ok((annotated, code)) => {
                self.summary.record(code);
                Some(Ok(annotated))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Drains `annotator` into `writer`, one newline-terminated line per record.
pub fn write_annotated<L, W>(
    mut annotator: Annotator<'_, L>,
    writer: &mut W,
) -> Result<AnnotationSummary, AnnotateError>
where
    L: Iterator<Item = io::Result<Vec<u8>>>,
    W: Write,
{
    while let Some(annotated) = annotator.next() {
        let annotated = annotated?;
        writer
            .write_all(&annotated)
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|source| AnnotateError::Write {
                line: annotator.line_no,
                source,
            })?;
    }

    let summary = annotator.summary();
    debug!(
        "Annotated {} record(s): {} unaffected, {} affected, {} missing",
        summary.records, summary.unaffected, summary.affected, summary.missing
    );
    Ok(summary)
}
