use crate::cli::PrepareArgs;
use crate::error::{CliError, Result};
use mmtop::engine::config::{
    self as core_config, AlanineScanConfig, ComplexInputs, ComponentInputs, InterfaceMode,
    MutationSide, PipelineConfig, PipelineConfigBuilder, ResidueSpecifier, ToolPaths,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialGeneralConfig {
    prefix: Option<String>,
    output_dir: Option<PathBuf>,
    stability: Option<bool>,
    solvated_trajectory: Option<bool>,
    tool_log: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialComplexConfig {
    structure: Option<PathBuf>,
    index: Option<PathBuf>,
    #[serde(default)]
    trajectories: Vec<PathBuf>,
    receptor_group: Option<String>,
    ligand_group: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialComponentConfig {
    structure: Option<PathBuf>,
    index: Option<PathBuf>,
    #[serde(default)]
    trajectories: Vec<PathBuf>,
    group: Option<String>,
    /// Only meaningful in the `[ligand]` section.
    mol2: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialForcefieldConfig {
    protein: Option<String>,
    ligand: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialAlanineScanConfig {
    enabled: Option<bool>,
    mutant_residue: Option<String>,
    side: Option<String>,
    mutant_receptor: Option<PathBuf>,
    mutant_ligand: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDecompositionConfig {
    print_residues: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialToolsConfig {
    gmx: Option<PathBuf>,
    tleap: Option<PathBuf>,
    parmchk2: Option<PathBuf>,
}

/// The `prepare` configuration as read from TOML, before CLI overrides are applied.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialPrepareConfig {
    #[serde(default)]
    general: PartialGeneralConfig,
    #[serde(default)]
    complex: PartialComplexConfig,
    #[serde(default)]
    receptor: PartialComponentConfig,
    #[serde(default)]
    ligand: PartialComponentConfig,
    #[serde(default)]
    forcefield: PartialForcefieldConfig,
    #[serde(default)]
    alanine_scan: PartialAlanineScanConfig,
    #[serde(default)]
    decomposition: PartialDecompositionConfig,
    #[serde(default)]
    tools: PartialToolsConfig,
}

impl PartialPrepareConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Layers the CLI arguments over the file values and builds the core configuration.
    ///
    /// Precedence, lowest first: built-in defaults, the config file, `-S` values, explicit
    /// flags. Executables not configured anywhere are looked up on `PATH`.
    pub fn merge_with_cli(mut self, args: &PrepareArgs) -> Result<PipelineConfig> {
        self.apply_set_values(&args.set_values)?;
        self.apply_flags(args);
        debug!("Merged prepare configuration: {:?}", self);

        let complex = self.complex_inputs()?;
        let receptor = component_inputs(self.receptor.clone(), "receptor.group")?;
        let ligand_mol2 = self.ligand.mol2.take();
        let ligand = component_inputs(self.ligand.clone(), "ligand.group")?;
        let interface_mode = match &self.decomposition.print_residues {
            Some(mode) => mode.parse::<InterfaceMode>()?,
            None => InterfaceMode::Disabled,
        };
        let alanine_scan = self.alanine_scan_config()?;
        let tools = resolve_tools(&self.tools)?;

        let mut builder = PipelineConfigBuilder::new()
            .stability(self.general.stability.unwrap_or(false))
            .solvated_trajectory(self.general.solvated_trajectory.unwrap_or(false))
            .complex(complex)
            .receptor(receptor)
            .ligand(ligand)
            .ligand_mol2(ligand_mol2)
            .alanine_scan(alanine_scan)
            .interface_mode(interface_mode)
            .tools(tools);

        if let Some(prefix) = self.general.prefix {
            builder = builder.prefix(prefix);
        }
        if let Some(dir) = self.general.output_dir {
            builder = builder.output_dir(dir);
        }
        if let Some(log) = self.general.tool_log {
            builder = builder.tool_log(log);
        }
        if let Some(protein) = self.forcefield.protein {
            builder = builder.protein_forcefield(protein);
        }
        if let Some(ligand) = self.forcefield.ligand {
            builder = builder.ligand_forcefield(ligand);
        }

        Ok(builder.build()?)
    }

    fn apply_flags(&mut self, args: &PrepareArgs) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }
        fn set_list(target: &mut Vec<PathBuf>, value: &[PathBuf]) {
            if !value.is_empty() {
                *target = value.to_vec();
            }
        }

        let general = &mut self.general;
        set(&mut general.prefix, &args.prefix);
        set(&mut general.output_dir, &args.output_dir);
        if args.stability {
            general.stability = Some(true);
        }
        if args.solvated_trajectory {
            general.solvated_trajectory = Some(true);
        }

        let complex = &mut self.complex;
        set(&mut complex.structure, &args.complex_structure);
        set(&mut complex.index, &args.complex_index);
        set_list(&mut complex.trajectories, &args.complex_trajectories);
        if let [receptor, ligand] = args.complex_groups.as_slice() {
            complex.receptor_group = Some(receptor.clone());
            complex.ligand_group = Some(ligand.clone());
        }

        for (section, structure, index, group, trajectories) in [
            (
                &mut self.receptor,
                &args.receptor_structure,
                &args.receptor_index,
                &args.receptor_group,
                &args.receptor_trajectories,
            ),
            (
                &mut self.ligand,
                &args.ligand_structure,
                &args.ligand_index,
                &args.ligand_group,
                &args.ligand_trajectories,
            ),
        ] {
            set(&mut section.structure, structure);
            set(&mut section.index, index);
            set(&mut section.group, group);
            set_list(&mut section.trajectories, trajectories);
        }
        set(&mut self.ligand.mol2, &args.ligand_mol2);

        set(&mut self.forcefield.protein, &args.protein_forcefield);
        set(&mut self.forcefield.ligand, &args.ligand_forcefield);

        let scan = &mut self.alanine_scan;
        if args.alanine_scan {
            scan.enabled = Some(true);
        }
        set(&mut scan.mutant_residue, &args.mutant_residue);
        set(&mut scan.side, &args.mutant_side);

        set(
            &mut self.decomposition.print_residues,
            &args.print_residues,
        );
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for pair in set_values {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                CliError::Argument(format!(
                    "Invalid format for --set argument: '{}'. Expected KEY=VALUE.",
                    pair
                ))
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "general.prefix" => self.general.prefix = Some(value.to_string()),
                "general.output-dir" => self.general.output_dir = Some(value.into()),
                "general.stability" => self.general.stability = Some(parse_value(key, value)?),
                "general.solvated-trajectory" => {
                    self.general.solvated_trajectory = Some(parse_value(key, value)?)
                }
                "general.tool-log" => self.general.tool_log = Some(value.into()),
                "complex.receptor-group" => self.complex.receptor_group = Some(value.to_string()),
                "complex.ligand-group" => self.complex.ligand_group = Some(value.to_string()),
                "receptor.group" => self.receptor.group = Some(value.to_string()),
                "ligand.group" => self.ligand.group = Some(value.to_string()),
                "ligand.mol2" => self.ligand.mol2 = Some(value.into()),
                "forcefield.protein" => self.forcefield.protein = Some(value.to_string()),
                "forcefield.ligand" => self.forcefield.ligand = Some(value.to_string()),
                "alanine-scan.enabled" => {
                    self.alanine_scan.enabled = Some(parse_value(key, value)?)
                }
                "alanine-scan.mutant-residue" => {
                    self.alanine_scan.mutant_residue = Some(value.to_string())
                }
                "alanine-scan.side" => self.alanine_scan.side = Some(value.to_string()),
                "decomposition.print-residues" => {
                    self.decomposition.print_residues = Some(value.to_string())
                }
                "tools.gmx" => self.tools.gmx = Some(value.into()),
                "tools.tleap" => self.tools.tleap = Some(value.into()),
                "tools.parmchk2" => self.tools.parmchk2 = Some(value.into()),
                _ => {
                    return Err(CliError::Argument(format!(
                        "Unknown or unsupported key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn complex_inputs(&self) -> Result<ComplexInputs> {
        let complex = &self.complex;
        Ok(ComplexInputs {
            structure: required(&complex.structure, "complex.structure")?,
            index: required(&complex.index, "complex.index")?,
            trajectories: complex.trajectories.clone(),
            receptor_group: required(&complex.receptor_group, "complex.receptor-group")?,
            ligand_group: required(&complex.ligand_group, "complex.ligand-group")?,
        })
    }

    fn alanine_scan_config(&self) -> Result<Option<AlanineScanConfig>> {
        let scan = &self.alanine_scan;
        if !scan.enabled.unwrap_or(false) {
            return Ok(None);
        }
        let mutant_residue = scan
            .mutant_residue
            .as_deref()
            .map(ResidueSpecifier::from_str)
            .transpose()?;
        let side = match &scan.side {
            Some(side) => side.parse::<MutationSide>()?,
            None => MutationSide::default(),
        };

        Ok(Some(AlanineScanConfig {
            mutant_residue,
            side,
            mutant_receptor_structure: scan.mutant_receptor.clone(),
            mutant_ligand_structure: scan.mutant_ligand.clone(),
        }))
    }
}

/// A separately simulated receptor or ligand exists only when its structure is given.
fn component_inputs(
    section: PartialComponentConfig,
    group_key: &'static str,
) -> Result<Option<ComponentInputs>> {
    let Some(structure) = section.structure else {
        return Ok(None);
    };
    Ok(Some(ComponentInputs {
        structure,
        index: section.index,
        trajectories: section.trajectories,
        group: required(&section.group, group_key)?,
    }))
}

fn required<T: Clone>(value: &Option<T>, key: &'static str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| core_config::ConfigError::MissingParameter(key).into())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Argument(format!("Invalid value for {}: '{}'", key, value)))
}

fn resolve_tools(tools: &PartialToolsConfig) -> Result<ToolPaths> {
    Ok(ToolPaths::resolve(
        tools.gmx.clone(),
        tools.tleap.clone(),
        tools.parmchk2.clone(),
    )?)
}
