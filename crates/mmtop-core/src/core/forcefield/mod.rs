//! # Force Field Module
//!
//! Force fields tleap can be asked to source. Protein force fields come from a fixed
//! allow-list keyed by their GROMACS names; small-molecule ligands use GAFF or GAFF2.
//! Nucleic-acid parameters are always sourced with fixed defaults.

use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Leap scripts sourced for nucleic acids regardless of the protein force field.
pub const NUCLEIC_ACID_LEAPRCS: [&str; 2] = ["leaprc.DNA.bsc1", "leaprc.RNA.OL3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProteinForcefield {
    Amber03,
    Amber94,
    Amber96,
    Amber99,
    Amber99Sb,
    #[default]
    Amber99SbIldn,
    Amber14Sb,
}

static PROTEIN_FORCEFIELDS: Map<&'static str, ProteinForcefield> = phf_map! {
    "amber03" => ProteinForcefield::Amber03,
    "amber94" => ProteinForcefield::Amber94,
    "amber96" => ProteinForcefield::Amber96,
    "amber99" => ProteinForcefield::Amber99,
    "amber99sb" => ProteinForcefield::Amber99Sb,
    "amber99sb-ildn" => ProteinForcefield::Amber99SbIldn,
    "amber14sb" => ProteinForcefield::Amber14Sb,
};

impl ProteinForcefield {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Amber03 => "amber03",
            Self::Amber94 => "amber94",
            Self::Amber96 => "amber96",
            Self::Amber99 => "amber99",
            Self::Amber99Sb => "amber99sb",
            Self::Amber99SbIldn => "amber99sb-ildn",
            Self::Amber14Sb => "amber14sb",
        }
    }

    /// The leap script that loads this force field.
    pub fn leaprc(&self) -> &'static str {
        match self {
            Self::Amber03 => "oldff/leaprc.ff03",
            Self::Amber94 => "oldff/leaprc.ff94",
            Self::Amber96 => "oldff/leaprc.ff96",
            Self::Amber99 => "oldff/leaprc.ff99",
            Self::Amber99Sb => "oldff/leaprc.ff99SB",
            Self::Amber99SbIldn => "oldff/leaprc.ffSBildn",
            Self::Amber14Sb => "leaprc.protein.ff14SB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LigandForcefield {
    #[default]
    Gaff,
    Gaff2,
}

impl LigandForcefield {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaff => "gaff",
            Self::Gaff2 => "gaff2",
        }
    }

    pub fn leaprc(&self) -> String {
        format!("leaprc.{}", self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} force field '{name}'")]
pub struct UnknownForcefieldError {
    pub kind: &'static str,
    pub name: String,
}

impl FromStr for ProteinForcefield {
    type Err = UnknownForcefieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROTEIN_FORCEFIELDS
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| UnknownForcefieldError {
                kind: "protein",
                name: s.to_string(),
            })
    }
}

impl FromStr for LigandForcefield {
    type Err = UnknownForcefieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gaff" => Ok(Self::Gaff),
            "gaff2" => Ok(Self::Gaff2),
            _ => Err(UnknownForcefieldError {
                kind: "ligand",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProteinForcefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for LigandForcefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
