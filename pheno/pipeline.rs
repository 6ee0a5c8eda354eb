// ========================================================================================
//
//                              The run orchestrator
//
// ========================================================================================
//
// Drives one conversion from start to finish:
//
// 1.  Confirm every input exists before reading any of them.
// 2.  Build the translation table, then the phenotype table. Both are complete before
//     a single record is written.
// 3.  Stream the `.fam` file through the annotator into a staged output file, and move
//     that file into place only when the whole pass succeeded.

use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::annotate::{AnnotateError, AnnotationSummary, annotate, write_annotated};
use crate::classify::{ClassifyError, build_phenotype_table, read_id_list};
use crate::config::RunConfig;
use crate::io::{AtomicOutput, IoError, open_text};
use crate::translate::{TranslateError, read_translation_table};
use crate::types::{ListKind, PhenotypeCode};

pub const EXIT_USAGE: i32 = 2;
pub const EXIT_IO: i32 = 3;
pub const EXIT_UNKNOWN_IDENTIFIER: i32 = 4;
pub const EXIT_MALFORMED_INPUT: i32 = 5;

/// The four files a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Fam,
    Cases,
    Controls,
    Mapping,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fam => f.write_str(".fam"),
            Self::Cases => f.write_str("case list"),
            Self::Controls => f.write_str("control list"),
            Self::Mapping => f.write_str("ID mapping"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{role} file '{}' does not exist or is not a regular file", .path.display())]
    MissingInput { role: InputRole, path: PathBuf },
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("while annotating '{}': {source}", .path.display())]
    Annotate {
        path: PathBuf,
        source: AnnotateError,
    },
    #[error(transparent)]
    Io(#[from] IoError),
}

impl PipelineError {
    /// The process exit status this failure maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInput { .. } | Self::Io(_) => EXIT_IO,
            Self::Translate(TranslateError::Io(_)) | Self::Classify(ClassifyError::Io(_)) => {
                EXIT_IO
            }
            Self::Translate(TranslateError::Parse { source, .. })
            | Self::Classify(ClassifyError::Parse { source, .. }) => {
                if source.is_io_error() {
                    EXIT_IO
                } else {
                    EXIT_MALFORMED_INPUT
                }
            }
            Self::Translate(TranslateError::MalformedRow { .. }) => EXIT_MALFORMED_INPUT,
            Self::Classify(ClassifyError::UnknownIdentifier { .. }) => EXIT_UNKNOWN_IDENTIFIER,
            Self::Annotate { source, .. } => match source {
                AnnotateError::MalformedRecord { .. } => EXIT_MALFORMED_INPUT,
                AnnotateError::Read { .. } | AnnotateError::Write { .. } => EXIT_IO,
            },
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub translations: usize,
    pub listed_cases: usize,
    pub listed_controls: usize,
    pub classified_unaffected: usize,
    pub classified_affected: usize,
    pub annotation: AnnotationSummary,
}

/// Runs the full conversion described by `config`.
pub fn run(config: &RunConfig) -> Result<RunSummary, PipelineError> {
    check_inputs(config)?;

    info!("Loading ID mapping from {}", config.mapping.display());
    let translation = read_translation_table(&config.mapping)?;

    let cases = read_id_list(&config.cases, ListKind::Cases)?;
    let controls = read_id_list(&config.controls, ListKind::Controls)?;
    info!(
        "Classifying {} case and {} control ID(s) with {} coding",
        cases.len(),
        controls.len(),
        config.coding
    );
    let phenotypes = build_phenotype_table(&cases, &controls, &translation, config.coding)?;

    info!(
        "Annotating {} into {}",
        config.fam.display(),
        config.output.display()
    );
    let fam = open_text(&config.fam)?;
    let mut output = AtomicOutput::create(&config.output)?;
    debug!(
        "Staging output for {} beside its destination",
        output.destination().display()
    );
    let annotation = write_annotated(annotate(fam.split(b'\n'), &phenotypes), &mut output).map_err(
        |source| PipelineError::Annotate {
            path: config.fam.clone(),
            source,
        },
    )?;
    let output = output.commit()?;

    Ok(RunSummary {
        output,
        translations: translation.len(),
        listed_cases: cases.len(),
        listed_controls: controls.len(),
        classified_unaffected: phenotypes.count(PhenotypeCode::Unaffected),
        classified_affected: phenotypes.count(PhenotypeCode::Affected),
        annotation,
    })
}

fn check_inputs(config: &RunConfig) -> Result<(), PipelineError> {
    let inputs: [(InputRole, &Path); 4] = [
        (InputRole::Mapping, config.mapping.as_path()),
        (InputRole::Cases, config.cases.as_path()),
        (InputRole::Controls, config.controls.as_path()),
        (InputRole::Fam, config.fam.as_path()),
    ];

    for (role, path) in inputs {
        if !path.is_file() {
            return Err(PipelineError::MissingInput {
                role,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}
