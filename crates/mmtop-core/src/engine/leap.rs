//! tleap script generation and the Amber tool calls around it.

use super::tools::ToolInvocation;
use crate::core::forcefield::{LigandForcefield, NUCLEIC_ACID_LEAPRCS, ProteinForcefield};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// PB radii set requested in every generated script.
pub const PB_RADII: &str = "mbondi2";

/// A topology file together with its matching coordinate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyPair {
    pub prmtop: PathBuf,
    pub inpcrd: PathBuf,
}

/// One line of a tleap script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeapDirective {
    Source(String),
    SetPbRadii(String),
    LoadMol2 { var: String, path: PathBuf },
    Check { var: String },
    LoadAmberParams(PathBuf),
    LoadPdb { var: String, path: PathBuf },
    SaveAmberParm { var: String, topology: TopologyPair },
    Quit,
}

impl fmt::Display for LeapDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(file) => write!(f, "source {}", file),
            Self::SetPbRadii(radii) => write!(f, "set default PBRadii {}", radii),
            Self::LoadMol2 { var, path } => write!(f, "{} = loadmol2 {}", var, path.display()),
            Self::Check { var } => write!(f, "check {}", var),
            Self::LoadAmberParams(path) => write!(f, "loadamberparams {}", path.display()),
            Self::LoadPdb { var, path } => write!(f, "{} = loadpdb {}", var, path.display()),
            Self::SaveAmberParm { var, topology } => write!(
                f,
                "saveamberparm {} {} {}",
                var,
                topology.prmtop.display(),
                topology.inpcrd.display()
            ),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// Accumulates directives and renders them one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeapScript {
    directives: Vec<LeapDirective>,
}

impl LeapScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a script that sources the force fields and selects the PB radii.
    pub fn with_forcefields(protein: ProteinForcefield, ligand: LigandForcefield) -> Self {
        let mut script = Self::new();
        script.push(LeapDirective::Source(protein.leaprc().to_string()));
        for leaprc in NUCLEIC_ACID_LEAPRCS {
            script.push(LeapDirective::Source(leaprc.to_string()));
        }
        script.push(LeapDirective::Source(ligand.leaprc()));
        script.push(LeapDirective::SetPbRadii(PB_RADII.to_string()));
        script
    }

    pub fn push(&mut self, directive: LeapDirective) -> &mut Self {
        self.directives.push(directive);
        self
    }

    /// Loads a small-molecule ligand and its parameter modifications into `var`.
    pub fn load_small_molecule(&mut self, var: &str, mol2: &Path, frcmod: &Path) -> &mut Self {
        self.push(LeapDirective::LoadMol2 {
            var: var.to_string(),
            path: mol2.to_path_buf(),
        })
        .push(LeapDirective::Check {
            var: var.to_string(),
        })
        .push(LeapDirective::LoadAmberParams(frcmod.to_path_buf()))
    }

    pub fn load_pdb(&mut self, var: &str, pdb: &Path) -> &mut Self {
        self.push(LeapDirective::LoadPdb {
            var: var.to_string(),
            path: pdb.to_path_buf(),
        })
    }

    pub fn save_topology(&mut self, var: &str, topology: &TopologyPair) -> &mut Self {
        self.push(LeapDirective::SaveAmberParm {
            var: var.to_string(),
            topology: topology.clone(),
        })
    }

    pub fn quit(&mut self) -> &mut Self {
        self.push(LeapDirective::Quit)
    }

    pub fn render(&self) -> String {
        self.directives
            .iter()
            .map(|directive| format!("{}\n", directive))
            .collect()
    }

    pub fn write_to_path(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}

/// Runs tleap on a script file.
pub fn tleap_invocation(tleap: &Path, script: &Path) -> ToolInvocation {
    ToolInvocation::new(
        "tleap",
        tleap,
        format!("building topologies from {}", script.display()),
    )
    .arg("-f")
    .path_arg(script)
}

/// Derives missing GAFF parameters for a mol2 ligand.
pub fn parmchk2_invocation(parmchk2: &Path, mol2: &Path, frcmod: &Path) -> ToolInvocation {
    ToolInvocation::new(
        "parmchk2",
        parmchk2,
        format!("deriving parameters for {}", mol2.display()),
    )
    .arg("-i")
    .path_arg(mol2)
    .arg("-f")
    .arg("mol2")
    .arg("-o")
    .path_arg(frcmod)
}
