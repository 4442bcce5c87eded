use crate::core::forcefield::{LigandForcefield, ProteinForcefield, UnknownForcefieldError};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Cutoff used when interface listing is requested without an explicit distance.
pub const DEFAULT_INTERFACE_CUTOFF: f64 = 4.0;
/// Prefix prepended to every file the pipeline writes.
pub const DEFAULT_PREFIX: &str = "_GMXMMPBSA_";
/// Log file collecting the output of every external tool.
pub const DEFAULT_TOOL_LOG: &str = "make_top.log";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    UnknownForcefield(#[from] UnknownForcefieldError),

    #[error("Invalid residue specifier '{0}' (expected 'chain:number', e.g. 'A:25')")]
    InvalidResidueSpecifier(String),

    #[error("Invalid interface residue mode '{0}' (expected a flag or 'within <cutoff>')")]
    InvalidInterfaceMode(String),

    #[error("Invalid mutation side '{0}' (expected 'receptor' or 'ligand')")]
    InvalidMutationSide(String),

    #[error("Mutation is only possible if the ligand is protein-like (a mol2 ligand was supplied)")]
    NonProteinLigandMutation,

    #[error("Could not find the '{0}' executable on PATH")]
    ToolNotFound(&'static str),
}

/// Identifies a residue by chain and sequence number, written as `chain:number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResidueSpecifier {
    pub chain_id: char,
    pub residue_number: isize,
}

impl FromStr for ResidueSpecifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidResidueSpecifier(s.to_string());
        let (chain, number) = s.trim().split_once(':').ok_or_else(invalid)?;

        let mut chars = chain.trim().chars();
        let chain_id = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(invalid()),
        };
        let residue_number = number.trim().parse().map_err(|_| invalid())?;

        Ok(Self {
            chain_id,
            residue_number,
        })
    }
}

impl fmt::Display for ResidueSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.residue_number)
    }
}

/// Which component, besides the complex, receives the alanine mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationSide {
    #[default]
    #[serde(alias = "rec")]
    Receptor,
    #[serde(alias = "lig")]
    Ligand,
}

impl FromStr for MutationSide {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rec" | "receptor" => Ok(Self::Receptor),
            "lig" | "ligand" => Ok(Self::Ligand),
            _ => Err(ConfigError::InvalidMutationSide(s.to_string())),
        }
    }
}

impl fmt::Display for MutationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Receptor => "receptor",
            Self::Ligand => "ligand",
        })
    }
}

/// Whether interface residues are listed, and within which cutoff.
///
/// Parsed from `within <cutoff>`; any other value, including an empty one, disables listing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InterfaceMode {
    #[default]
    Disabled,
    Within(f64),
}

impl InterfaceMode {
    /// The cutoff in Angstroms; the default cutoff is retained when listing is disabled.
    pub fn cutoff(&self) -> f64 {
        match self {
            Self::Disabled => DEFAULT_INTERFACE_CUTOFF,
            Self::Within(cutoff) => *cutoff,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Within(_))
    }
}

impl FromStr for InterfaceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidInterfaceMode(s.to_string());
        let mut parts = s.split_whitespace();

        if parts.next() != Some("within") {
            return Ok(Self::Disabled);
        }
        // Words after the cutoff are ignored.
        let cutoff: f64 = parts
            .next()
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        if !cutoff.is_finite() || cutoff < 0.0 {
            return Err(invalid());
        }
        Ok(Self::Within(cutoff))
    }
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Within(cutoff) => write!(f, "within {}", cutoff),
        }
    }
}

/// Locations of the external programs the pipeline drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub gmx: PathBuf,
    pub tleap: PathBuf,
    /// Only needed to parameterize a mol2 ligand.
    pub parmchk2: Option<PathBuf>,
}

impl ToolPaths {
    pub fn new(gmx: PathBuf, tleap: PathBuf, parmchk2: Option<PathBuf>) -> Self {
        Self {
            gmx,
            tleap,
            parmchk2,
        }
    }

    /// Uses the configured paths and looks the remaining programs up on `PATH`.
    ///
    /// GROMACS is found as `gmx`, then `gmx_mpi`. A missing `parmchk2` is not an error here;
    /// [`PipelineConfig::validate`] rejects it once a mol2 ligand makes it necessary.
    pub fn resolve(
        gmx: Option<PathBuf>,
        tleap: Option<PathBuf>,
        parmchk2: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let gmx = match gmx {
            Some(path) => path,
            None => which::which("gmx")
                .or_else(|_| which::which("gmx_mpi"))
                .map_err(|_| ConfigError::ToolNotFound("gmx"))?,
        };
        let tleap = match tleap {
            Some(path) => path,
            None => which::which("tleap").map_err(|_| ConfigError::ToolNotFound("tleap"))?,
        };
        let parmchk2 = parmchk2.or_else(|| which::which("parmchk2").ok());
        Ok(Self::new(gmx, tleap, parmchk2))
    }
}

/// GROMACS inputs describing the simulated complex.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexInputs {
    /// Run input file (`.tpr`) used as the trjconv structure reference.
    pub structure: PathBuf,
    /// Index file containing the receptor and ligand groups.
    pub index: PathBuf,
    pub trajectories: Vec<PathBuf>,
    pub receptor_group: String,
    pub ligand_group: String,
}

/// GROMACS inputs for a receptor or ligand simulated on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInputs {
    pub structure: PathBuf,
    pub index: Option<PathBuf>,
    pub trajectories: Vec<PathBuf>,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlanineScanConfig {
    pub mutant_residue: Option<ResidueSpecifier>,
    pub side: MutationSide,
    /// Separately simulated mutant structures; only their presence matters (stability warning).
    pub mutant_receptor_structure: Option<PathBuf>,
    pub mutant_ligand_structure: Option<PathBuf>,
}

/// Immutable description of one preparation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub prefix: String,
    pub output_dir: PathBuf,
    pub stability: bool,
    pub solvated_trajectory: bool,
    pub complex: ComplexInputs,
    pub receptor: Option<ComponentInputs>,
    pub ligand: Option<ComponentInputs>,
    /// Small-molecule ligand structure; its presence makes the ligand non-protein.
    pub ligand_mol2: Option<PathBuf>,
    pub protein_forcefield: String,
    pub ligand_forcefield: String,
    pub alanine_scan: Option<AlanineScanConfig>,
    pub interface_mode: InterfaceMode,
    pub tools: ToolPaths,
    pub tool_log: PathBuf,
}

impl PipelineConfig {
    /// Resolves the configured force fields against the allow-lists.
    ///
    /// The ligand force field is only enforced when a mol2 ligand is present; otherwise an
    /// unrecognized name falls back to the default GAFF.
    pub fn resolve_forcefields(&self) -> Result<(ProteinForcefield, LigandForcefield), ConfigError> {
        let protein: ProteinForcefield = self.protein_forcefield.parse()?;
        let ligand = match self.ligand_forcefield.parse::<LigandForcefield>() {
            Ok(ff) => ff,
            Err(err) if self.ligand_mol2.is_some() => return Err(err.into()),
            Err(_) => {
                warn!(
                    ligand_forcefield = %self.ligand_forcefield,
                    "Unrecognized ligand force field ignored (no mol2 ligand); using gaff"
                );
                LigandForcefield::default()
            }
        };
        Ok((protein, ligand))
    }

    /// Checks every constraint that can be decided before a process is spawned.
    pub fn validate(&self) -> Result<(ProteinForcefield, LigandForcefield), ConfigError> {
        let forcefields = self.resolve_forcefields()?;

        if self.ligand_mol2.is_some() && self.tools.parmchk2.is_none() {
            return Err(ConfigError::ToolNotFound("parmchk2"));
        }
        if self.complex.trajectories.is_empty() {
            return Err(ConfigError::MissingParameter("complex.trajectories"));
        }
        if let Some(scan) = &self.alanine_scan {
            if scan.mutant_residue.is_none() {
                return Err(ConfigError::MissingParameter("alanine-scan.mutant-residue"));
            }
            if !self.stability && scan.side == MutationSide::Ligand && self.ligand_mol2.is_some() {
                return Err(ConfigError::NonProteinLigandMutation);
            }
        }
        for (parameter, component) in [
            ("receptor.trajectories", &self.receptor),
            ("ligand.trajectories", &self.ligand),
        ] {
            if component.as_ref().is_some_and(|c| c.trajectories.is_empty()) {
                return Err(ConfigError::MissingParameter(parameter));
            }
        }

        Ok(forcefields)
    }

    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.prefix, suffix))
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    prefix: Option<String>,
    output_dir: Option<PathBuf>,
    stability: bool,
    solvated_trajectory: bool,
    complex: Option<ComplexInputs>,
    receptor: Option<ComponentInputs>,
    ligand: Option<ComponentInputs>,
    ligand_mol2: Option<PathBuf>,
    protein_forcefield: Option<String>,
    ligand_forcefield: Option<String>,
    alanine_scan: Option<AlanineScanConfig>,
    interface_mode: InterfaceMode,
    tools: Option<ToolPaths>,
    tool_log: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
    pub fn stability(mut self, stability: bool) -> Self {
        self.stability = stability;
        self
    }
    pub fn solvated_trajectory(mut self, solvated: bool) -> Self {
        self.solvated_trajectory = solvated;
        self
    }
    pub fn complex(mut self, complex: ComplexInputs) -> Self {
        self.complex = Some(complex);
        self
    }
    pub fn receptor(mut self, receptor: Option<ComponentInputs>) -> Self {
        self.receptor = receptor;
        self
    }
    pub fn ligand(mut self, ligand: Option<ComponentInputs>) -> Self {
        self.ligand = ligand;
        self
    }
    pub fn ligand_mol2(mut self, mol2: Option<PathBuf>) -> Self {
        self.ligand_mol2 = mol2;
        self
    }
    pub fn protein_forcefield(mut self, name: impl Into<String>) -> Self {
        self.protein_forcefield = Some(name.into());
        self
    }
    pub fn ligand_forcefield(mut self, name: impl Into<String>) -> Self {
        self.ligand_forcefield = Some(name.into());
        self
    }
    pub fn alanine_scan(mut self, scan: Option<AlanineScanConfig>) -> Self {
        self.alanine_scan = scan;
        self
    }
    pub fn interface_mode(mut self, mode: InterfaceMode) -> Self {
        self.interface_mode = mode;
        self
    }
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Some(tools);
        self
    }
    pub fn tool_log(mut self, path: PathBuf) -> Self {
        self.tool_log = Some(path);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        Ok(PipelineConfig {
            prefix: self.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            stability: self.stability,
            solvated_trajectory: self.solvated_trajectory,
            complex: self.complex.ok_or(ConfigError::MissingParameter("complex"))?,
            receptor: self.receptor,
            ligand: self.ligand,
            ligand_mol2: self.ligand_mol2,
            protein_forcefield: self
                .protein_forcefield
                .ok_or(ConfigError::MissingParameter("protein_forcefield"))?,
            ligand_forcefield: self
                .ligand_forcefield
                .unwrap_or_else(|| LigandForcefield::default().name().to_string()),
            alanine_scan: self.alanine_scan,
            interface_mode: self.interface_mode,
            tools: self.tools.ok_or(ConfigError::MissingParameter("tools"))?,
            tool_log: self
                .tool_log
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL_LOG)),
        })
    }
}
