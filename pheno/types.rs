// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// Types shared between the translate, classify, annotate and pipeline modules.

use serde::Deserialize;
use std::fmt;

/// A PLINK phenotype code, as written into the sixth column of a `.fam` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhenotypeCode {
    Missing,
    Unaffected,
    Affected,
}

impl PhenotypeCode {
    /// The literal token PLINK expects for this code.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Missing => "-9",
            Self::Unaffected => "1",
            Self::Affected => "2",
        }
    }
}

impl fmt::Display for PhenotypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Which of the two sample lists an identifier was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Cases,
    Controls,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cases => f.write_str("case"),
            Self::Controls => f.write_str("control"),
        }
    }
}

/// How membership in the case and control lists is turned into phenotype codes.
///
/// `Legacy` reproduces the historical behaviour of this conversion, in which
/// listed cases are written as unaffected (`1`) and listed controls as affected
/// (`2`). `Conventional` writes cases as affected and controls as unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhenotypeCoding {
    #[default]
    Legacy,
    Conventional,
}

impl PhenotypeCoding {
    pub const fn code_for(self, list: ListKind) -> PhenotypeCode {
        match (self, list) {
            (Self::Legacy, ListKind::Cases) => PhenotypeCode::Unaffected,
            (Self::Legacy, ListKind::Controls) => PhenotypeCode::Affected,
            (Self::Conventional, ListKind::Cases) => PhenotypeCode::Affected,
            (Self::Conventional, ListKind::Controls) => PhenotypeCode::Unaffected,
        }
    }
}

impl fmt::Display for PhenotypeCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Conventional => f.write_str("conventional"),
        }
    }
}
