// ========================================================================================
//
//                         Text inputs and all-or-nothing outputs
//
// ========================================================================================
//
// Every file the tool touches goes through this module. Inputs are opened as buffered
// text sources whose errors remember the offending path. The annotated `.fam` is
// staged in a temporary file beside its destination and only renamed into place once
// the whole pass has succeeded, so a failed run never leaves a truncated file behind.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

const STAGING_PREFIX: &str = ".phenofam-";
const STAGING_SUFFIX: &str = ".partial";
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot open '{}': {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot stage output for '{}': {source}", .path.display())]
    Stage { path: PathBuf, source: io::Error },
    #[error("failed writing '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("cannot move finished output into place at '{}': {source}", .path.display())]
    Persist { path: PathBuf, source: io::Error },
}

/// Opens a text file for buffered, line-oriented reading.
pub fn open_text(path: &Path) -> Result<BufReader<File>, IoError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| IoError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// An output file that only appears at its destination once [`AtomicOutput::commit`]
/// is called. Dropping it uncommitted deletes the staged data.
#[derive(Debug)]
pub struct AtomicOutput {
    destination: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicOutput {
    /// Stages a new output for `destination`, creating its parent directory if needed.
    ///
    /// The committed file gets the permissions of the file it replaces, or those of a
    /// freshly created file when there is none.
    pub fn create(destination: &Path) -> Result<Self, IoError> {
        let stage_error = |source: io::Error| IoError::Stage {
            path: destination.to_path_buf(),
            source,
        };

        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(stage_error)?;
                parent
            }
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(STAGING_SUFFIX);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Same request `File::create` makes; the process umask still applies.
            builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
        }
        let staged = builder.tempfile_in(directory).map_err(stage_error)?;

        if let Ok(existing) = fs::metadata(destination) {
            staged
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(stage_error)?;
        }

        Ok(Self {
            destination: destination.to_path_buf(),
            writer: BufWriter::new(staged),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flushes the staged data and renames it over the destination.
    pub fn commit(self) -> Result<PathBuf, IoError> {
        let Self {
            destination,
            writer,
        } = self;

        let staged = writer.into_inner().map_err(|err| IoError::Write {
            path: destination.clone(),
            source: err.into_error(),
        })?;
        staged.as_file().sync_all().map_err(|source| IoError::Write {
            path: destination.clone(),
            source,
        })?;
        staged
            .persist(&destination)
            .map_err(|err| IoError::Persist {
                path: destination.clone(),
                source: err.error,
            })?;

        Ok(destination)
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
