//! Run configuration.
//!
//! Every input and output location has a built-in default matching the historical
//! file layout (`cases.IDs`, `controls.IDs`, `dbGap2ngID.mapping` in the working
//! directory). Defaults can be overridden by a TOML file and then by command-line
//! flags; both are expressed as [`Settings`] layered onto a [`RunConfig`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::types::PhenotypeCoding;

pub const DEFAULT_CASES_FILE: &str = "cases.IDs";
pub const DEFAULT_CONTROLS_FILE: &str = "controls.IDs";
pub const DEFAULT_MAPPING_FILE: &str = "dbGap2ngID.mapping";

/// Extension given to the annotated copy when no output path is configured.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "pheno.fam";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// A partial set of overrides. Unset fields leave the underlying value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub cases: Option<PathBuf>,
    pub controls: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub coding: Option<PhenotypeCoding>,
}

impl Settings {
    /// Loads overrides from a TOML file.
    ///
    /// ```toml
    /// cases = "lists/cases.IDs"
    /// controls = "lists/controls.IDs"
    /// mapping = "dbGap2ngID.mapping"
    /// output = "cohort.pheno.fam"
    /// coding = "legacy"
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved locations and options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub fam: PathBuf,
    pub cases: PathBuf,
    pub controls: PathBuf,
    pub mapping: PathBuf,
    pub output: PathBuf,
    pub coding: PhenotypeCoding,
}

impl RunConfig {
    /// Built-in defaults for annotating `fam`.
    pub fn new(fam: impl Into<PathBuf>) -> Self {
        let fam = fam.into();
        let output = default_output_path(&fam);
        Self {
            fam,
            cases: PathBuf::from(DEFAULT_CASES_FILE),
            controls: PathBuf::from(DEFAULT_CONTROLS_FILE),
            mapping: PathBuf::from(DEFAULT_MAPPING_FILE),
            output,
            coding: PhenotypeCoding::default(),
        }
    }

    /// Overlays every field `settings` sets.
    pub fn apply(mut self, settings: &Settings) -> Self {
        if let Some(cases) = &settings.cases {
            self.cases = cases.clone();
        }
        if let Some(controls) = &settings.controls {
            self.controls = controls.clone();
        }
        if let Some(mapping) = &settings.mapping {
            self.mapping = mapping.clone();
        }
        if let Some(output) = &settings.output {
            self.output = output.clone();
        }
        if let Some(coding) = settings.coding {
            self.coding = coding;
        }
        self
    }
}

/// `cohort.fam` becomes `cohort.pheno.fam`, next to the input.
pub fn default_output_path(fam: &Path) -> PathBuf {
    fam.with_extension(DEFAULT_OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_historical_layout() {
        let config = RunConfig::new("data/cohort.fam");
        assert_eq!(config.cases, PathBuf::from("cases.IDs"));
        assert_eq!(config.controls, PathBuf::from("controls.IDs"));
        assert_eq!(config.mapping, PathBuf::from("dbGap2ngID.mapping"));
        assert_eq!(config.output, PathBuf::from("data/cohort.pheno.fam"));
        assert_eq!(config.coding, PhenotypeCoding::Legacy);
    }

    #[test]
    fn output_default_handles_extensionless_input() {
        assert_eq!(
            default_output_path(Path::new("cohort")),
            PathBuf::from("cohort.pheno.fam")
        );
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let from_file = Settings {
            cases: Some(PathBuf::from("file_cases.txt")),
            mapping: Some(PathBuf::from("file.mapping")),
            coding: Some(PhenotypeCoding::Conventional),
            ..Settings::default()
        };
        let from_cli = Settings {
            cases: Some(PathBuf::from("cli_cases.txt")),
            ..Settings::default()
        };

        let config = RunConfig::new("cohort.fam")
            .apply(&from_file)
            .apply(&from_cli);

        assert_eq!(config.cases, PathBuf::from("cli_cases.txt"));
        assert_eq!(config.mapping, PathBuf::from("file.mapping"));
        assert_eq!(config.controls, PathBuf::from(DEFAULT_CONTROLS_FILE));
        assert_eq!(config.coding, PhenotypeCoding::Conventional);
    }

    #[test]
    fn settings_load_from_toml() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("phenofam.toml");
        fs::write(
            &path,
            "controls = \"ctrl.txt\"\noutput = \"out.fam\"\ncoding = \"conventional\"\n",
        )
        .expect("write config");

        let settings = Settings::load(&path).expect("valid config");
        assert_eq!(settings.controls, Some(PathBuf::from("ctrl.txt")));
        assert_eq!(settings.output, Some(PathBuf::from("out.fam")));
        assert_eq!(settings.coding, Some(PhenotypeCoding::Conventional));
        assert_eq!(settings.cases, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("phenofam.toml");
        fs::write(&path, "case_file = \"x\"\n").expect("write config");

        let err = Settings::load(&path).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_coding_is_rejected() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("phenofam.toml");
        fs::write(&path, "coding = \"inverted\"\n").expect("write config");

        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
