use crate::core::forcefield::{LigandForcefield, ProteinForcefield};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{ComplexInputs, ConfigError, MutationSide, PipelineConfig};
use crate::engine::error::EngineError;
use crate::engine::gromacs::{self, COMPLEX_GROUP, TrajectorySelection};
use crate::engine::interface::{InterfaceResidues, find_interface_residues};
use crate::engine::leap::{self, LeapScript, TopologyPair};
use crate::engine::mutation::mutate_to_alanine;
use crate::engine::normalize::normalize_structure;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tools::{ToolRunner, run_checked};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Topology/coordinate pairs written by tleap. `None` marks a pair that was not produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyOutputs {
    pub complex: Option<TopologyPair>,
    pub receptor: Option<TopologyPair>,
    pub ligand: Option<TopologyPair>,
    pub mutant_complex: Option<TopologyPair>,
    pub mutant_receptor: Option<TopologyPair>,
    pub mutant_ligand: Option<TopologyPair>,
}

/// Every file a preparation run leaves behind for the energy calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineArtifacts {
    pub complex_index: PathBuf,
    pub complex_structure: PathBuf,
    pub receptor_structure: Option<PathBuf>,
    pub ligand_structure: Option<PathBuf>,
    pub mutant_complex_structure: Option<PathBuf>,
    pub mutant_receptor_structure: Option<PathBuf>,
    pub mutant_ligand_structure: Option<PathBuf>,
    pub ligand_frcmod: Option<PathBuf>,
    /// Trajectories the energy calculation should read: the cleaned copies when the
    /// inputs were solvated, the original files otherwise.
    pub complex_trajectories: Vec<PathBuf>,
    pub receptor_trajectories: Vec<PathBuf>,
    pub ligand_trajectories: Vec<PathBuf>,
    pub interface_residues: Option<InterfaceResidues>,
    pub topologies: TopologyOutputs,
}

/// Raw snapshots and auxiliary files produced by the GROMACS and parmchk2 calls.
struct ExtractedInputs {
    complex_index: PathBuf,
    complex: PathBuf,
    receptor: Option<PathBuf>,
    ligand: Option<PathBuf>,
    receptor_template: Option<PathBuf>,
    ligand_frcmod: Option<PathBuf>,
    complex_trajectories: Vec<PathBuf>,
    receptor_trajectories: Vec<PathBuf>,
    ligand_trajectories: Vec<PathBuf>,
}

/// Normalized structures and the files they were saved to.
struct PreparedStructures {
    complex: MolecularSystem,
    receptor: Option<MolecularSystem>,
    ligand: Option<MolecularSystem>,
    complex_path: PathBuf,
    receptor_path: Option<PathBuf>,
    ligand_path: Option<PathBuf>,
}

#[derive(Default)]
struct MutantStructures {
    complex: Option<PathBuf>,
    receptor: Option<PathBuf>,
    ligand: Option<PathBuf>,
}

#[instrument(skip_all, name = "prepare_workflow")]
pub fn run(
    config: &PipelineConfig,
    runner: &impl ToolRunner,
    reporter: &ProgressReporter,
) -> Result<PipelineArtifacts, EngineError> {
    // === Phase 0: Validation ===
    let (protein_ff, ligand_ff) = config.validate()?;
    fs::create_dir_all(&config.output_dir)?;
    info!(
        protein_forcefield = %protein_ff,
        ligand_forcefield = ligand_ff.name(),
        stability = config.stability,
        "Starting topology preparation."
    );

    // === Phase 1: Snapshot extraction ===
    let extracted = extract_inputs(config, runner, reporter)?;

    // === Phase 2: Normalization ===
    let prepared = normalize_snapshots(config, &extracted, reporter)?;

    // === Phase 3: Alanine scanning (optional) ===
    let mutants = build_mutants(config, &prepared, reporter)?;

    // === Phase 4: Interface residues (optional) ===
    let interface_residues = if config.interface_mode.is_enabled() {
        Some(detect_interface(config, &extracted, &prepared, reporter)?)
    } else {
        None
    };

    // === Phase 5: Topology assembly ===
    let topologies = assemble_topologies(
        config,
        runner,
        reporter,
        (protein_ff, ligand_ff),
        &extracted,
        &prepared,
        &mutants,
    )?;

    info!("Topology preparation complete.");
    Ok(PipelineArtifacts {
        complex_index: extracted.complex_index,
        complex_structure: prepared.complex_path,
        receptor_structure: prepared.receptor_path,
        ligand_structure: prepared.ligand_path,
        mutant_complex_structure: mutants.complex,
        mutant_receptor_structure: mutants.receptor,
        mutant_ligand_structure: mutants.ligand,
        ligand_frcmod: extracted.ligand_frcmod,
        complex_trajectories: extracted.complex_trajectories,
        receptor_trajectories: extracted.receptor_trajectories,
        ligand_trajectories: extracted.ligand_trajectories,
        interface_residues,
        topologies,
    })
}

fn extract_inputs(
    config: &PipelineConfig,
    runner: &impl ToolRunner,
    reporter: &ProgressReporter,
) -> Result<ExtractedInputs, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Extracting Snapshots",
    });
    let gmx = config.tools.gmx.as_path();
    let complex = &config.complex;

    let complex_index = config.output_path("COM_index.ndx");
    run_checked(
        runner,
        &gromacs::merge_index(
            gmx,
            &complex.index,
            &complex.receptor_group,
            &complex.ligand_group,
            &complex_index,
        ),
    )?;

    let complex_pdb = config.output_path("COM.pdb");
    let whole_complex = complex_selection(complex, &complex_index, COMPLEX_GROUP)?;
    run_checked(runner, &gromacs::extract_snapshot(gmx, whole_complex, &complex_pdb))?;
    let complex_trajectories = clean_trajectories(
        config,
        runner,
        reporter,
        "COM",
        &complex.trajectories,
        whole_complex,
    )?;

    let ligand_frcmod = match &config.ligand_mol2 {
        Some(mol2) => {
            let stem = mol2
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "ligand".to_string());
            let frcmod = config.output_path(&format!("{}.frcmod", stem));
            let parmchk2 = config
                .tools
                .parmchk2
                .as_deref()
                .ok_or(ConfigError::ToolNotFound("parmchk2"))?;
            run_checked(runner, &leap::parmchk2_invocation(parmchk2, mol2, &frcmod))?;
            Some(frcmod)
        }
        None => None,
    };

    // In stability mode the receptor residue count still comes from the complex.
    let receptor_template = if config.stability && config.interface_mode.is_enabled() {
        let path = config.output_path("rec_temp.pdb");
        let selection = complex_selection(complex, &complex_index, &complex.receptor_group)?;
        run_checked(runner, &gromacs::extract_snapshot(gmx, selection, &path))?;
        Some(path)
    } else {
        None
    };

    if config.stability {
        warn_ignored_inputs(config);
        reporter.report(Progress::PhaseFinish);
        return Ok(ExtractedInputs {
            complex_index,
            complex: complex_pdb,
            receptor: None,
            ligand: None,
            receptor_template,
            ligand_frcmod,
            complex_trajectories,
            receptor_trajectories: Vec::new(),
            ligand_trajectories: Vec::new(),
        });
    }

    let receptor_pdb = config.output_path("REC.pdb");
    let receptor_trajectories = match &config.receptor {
        Some(receptor) => {
            let selection = TrajectorySelection {
                trajectory: first_trajectory(&receptor.trajectories, "receptor.trajectories")?,
                structure: &receptor.structure,
                index: receptor.index.as_deref(),
                group: &receptor.group,
            };
            run_checked(runner, &gromacs::extract_snapshot(gmx, selection, &receptor_pdb))?;
            clean_trajectories(config, runner, reporter, "REC", &receptor.trajectories, selection)?
        }
        None => {
            info!("Using receptor structure from complex to make amber topology");
            run_checked(
                runner,
                &gromacs::extract_snapshot(
                    gmx,
                    complex_selection(complex, &complex_index, &complex.receptor_group)?,
                    &receptor_pdb,
                ),
            )?;
            Vec::new()
        }
    };

    let ligand_pdb = config.output_path("LIG.pdb");
    let ligand_trajectories = match &config.ligand {
        Some(ligand) => {
            let selection = TrajectorySelection {
                trajectory: first_trajectory(&ligand.trajectories, "ligand.trajectories")?,
                structure: &ligand.structure,
                index: ligand.index.as_deref(),
                group: &ligand.group,
            };
            // The ligand run input already holds only the ligand; the snapshot is taken
            // without an index file.
            let snapshot = TrajectorySelection {
                index: None,
                ..selection
            };
            run_checked(runner, &gromacs::extract_snapshot(gmx, snapshot, &ligand_pdb))?;
            clean_trajectories(config, runner, reporter, "LIG", &ligand.trajectories, selection)?
        }
        None => {
            info!("Using ligand structure from complex to make amber topology");
            run_checked(
                runner,
                &gromacs::extract_snapshot(
                    gmx,
                    complex_selection(complex, &complex_index, &complex.ligand_group)?,
                    &ligand_pdb,
                ),
            )?;
            Vec::new()
        }
    };

    reporter.report(Progress::PhaseFinish);
    Ok(ExtractedInputs {
        complex_index,
        complex: complex_pdb,
        receptor: Some(receptor_pdb),
        ligand: Some(ligand_pdb),
        receptor_template,
        ligand_frcmod,
        complex_trajectories,
        receptor_trajectories,
        ligand_trajectories,
    })
}

/// Selects `group` from the first complex trajectory through the merged index.
fn complex_selection<'a>(
    complex: &'a ComplexInputs,
    merged_index: &'a Path,
    group: &'a str,
) -> Result<TrajectorySelection<'a>, ConfigError> {
    Ok(TrajectorySelection {
        trajectory: first_trajectory(&complex.trajectories, "complex.trajectories")?,
        structure: &complex.structure,
        index: Some(merged_index),
        group,
    })
}

fn first_trajectory<'a>(
    trajectories: &'a [PathBuf],
    parameter: &'static str,
) -> Result<&'a Path, ConfigError> {
    trajectories
        .first()
        .map(PathBuf::as_path)
        .ok_or(ConfigError::MissingParameter(parameter))
}

/// Strips solvent from every trajectory when the inputs are solvated.
fn clean_trajectories(
    config: &PipelineConfig,
    runner: &impl ToolRunner,
    reporter: &ProgressReporter,
    tag: &str,
    trajectories: &[PathBuf],
    selection: TrajectorySelection<'_>,
) -> Result<Vec<PathBuf>, EngineError> {
    if !config.solvated_trajectory {
        return Ok(trajectories.to_vec());
    }

    info!(component = tag, count = trajectories.len(), "Cleaning trajectories");
    reporter.report(Progress::TaskStart {
        total_steps: trajectories.len() as u64,
    });
    let mut cleaned = Vec::with_capacity(trajectories.len());
    for (i, trajectory) in trajectories.iter().enumerate() {
        let output = config.output_path(&format!("{}_traj_{}.xtc", tag, i));
        let selection = TrajectorySelection {
            trajectory,
            ..selection
        };
        run_checked(
            runner,
            &gromacs::clean_trajectory(&config.tools.gmx, selection, &output),
        )?;
        cleaned.push(output);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(cleaned)
}

fn warn_ignored_inputs(config: &PipelineConfig) {
    if config.receptor.is_some() || config.ligand.is_some() {
        warn!(
            "Stability mode does not need receptor or ligand inputs; the supplied ones are ignored."
        );
    }
    if let Some(scan) = &config.alanine_scan {
        if scan.mutant_receptor_structure.is_some() || scan.mutant_ligand_structure.is_some() {
            warn!(
                "Stability mode does not need mutant receptor or ligand inputs; the supplied ones are ignored."
            );
        }
    }
}

fn read_structure(path: &Path) -> Result<MolecularSystem, EngineError> {
    PdbFile::read_from_path(path)
        .map(|(system, _)| system)
        .map_err(|source| EngineError::Structure {
            path: path.to_path_buf(),
            source,
        })
}

fn write_structure(system: &MolecularSystem, path: &Path) -> Result<(), EngineError> {
    PdbFile::write_system_to_path(system, path).map_err(|source| EngineError::Structure {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a raw snapshot, normalizes it and saves it to `fixed`.
fn prepare_structure(raw: &Path, fixed: PathBuf) -> Result<(MolecularSystem, PathBuf), EngineError> {
    let mut system = read_structure(raw)?;
    let report = normalize_structure(&mut system);
    info!(
        structure = %fixed.display(),
        histidines = report.histidines_renamed,
        disulfides = report.disulfide_residues,
        hydrogens = report.hydrogens_removed,
        atoms = report.atoms_renamed,
        "Normalized snapshot"
    );
    write_structure(&system, &fixed)?;
    Ok((system, fixed))
}

fn normalize_snapshots(
    config: &PipelineConfig,
    extracted: &ExtractedInputs,
    reporter: &ProgressReporter,
) -> Result<PreparedStructures, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Normalizing Structures",
    });

    let (complex, complex_path) =
        prepare_structure(&extracted.complex, config.output_path("COM_FIXED.pdb"))?;
    let receptor = extracted
        .receptor
        .as_deref()
        .map(|raw| prepare_structure(raw, config.output_path("REC_FIXED.pdb")))
        .transpose()?;
    let ligand = extracted
        .ligand
        .as_deref()
        .map(|raw| prepare_structure(raw, config.output_path("LIG_FIXED.pdb")))
        .transpose()?;

    reporter.report(Progress::PhaseFinish);
    let (receptor, receptor_path) = receptor.unzip();
    let (ligand, ligand_path) = ligand.unzip();
    Ok(PreparedStructures {
        complex,
        receptor,
        ligand,
        complex_path,
        receptor_path,
        ligand_path,
    })
}

fn mutate_and_save(
    config: &PipelineConfig,
    wild_type: &MolecularSystem,
    suffix: &str,
) -> Result<PathBuf, EngineError> {
    let target = config
        .alanine_scan
        .as_ref()
        .and_then(|scan| scan.mutant_residue.as_ref());
    let mut mutant = wild_type.clone();
    mutate_to_alanine(&mut mutant, target)?;
    let path = config.output_path(suffix);
    write_structure(&mutant, &path)?;
    Ok(path)
}

fn build_mutants(
    config: &PipelineConfig,
    prepared: &PreparedStructures,
    reporter: &ProgressReporter,
) -> Result<MutantStructures, EngineError> {
    let Some(scan) = &config.alanine_scan else {
        return Ok(MutantStructures::default());
    };
    reporter.report(Progress::PhaseStart {
        name: "Alanine Scanning",
    });

    let mut mutants = MutantStructures {
        complex: Some(mutate_and_save(config, &prepared.complex, "MUT_COM_FIXED.pdb")?),
        ..Default::default()
    };
    if !config.stability {
        match scan.side {
            MutationSide::Receptor => {
                if let Some(receptor) = &prepared.receptor {
                    mutants.receptor = Some(mutate_and_save(config, receptor, "MUT_REC_FIXED.pdb")?);
                }
            }
            MutationSide::Ligand => {
                if let Some(ligand) = &prepared.ligand {
                    mutants.ligand = Some(mutate_and_save(config, ligand, "MUT_LIG_FIXED.pdb")?);
                }
            }
        }
    }

    reporter.report(Progress::PhaseFinish);
    Ok(mutants)
}

fn detect_interface(
    config: &PipelineConfig,
    extracted: &ExtractedInputs,
    prepared: &PreparedStructures,
    reporter: &ProgressReporter,
) -> Result<InterfaceResidues, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Finding Interface Residues",
    });

    let receptor_residue_count = match &extracted.receptor_template {
        Some(path) => read_structure(path)?.residue_count(),
        None => prepared
            .receptor
            .as_ref()
            .map_or(0, MolecularSystem::residue_count),
    };
    let cutoff = config.interface_mode.cutoff();
    let residues = find_interface_residues(&prepared.complex, receptor_residue_count, cutoff);
    info!(cutoff, residues = %residues, "Interface residues");
    reporter.message(format!("Interface residues within {} Å: {}", cutoff, residues));

    reporter.report(Progress::PhaseFinish);
    Ok(residues)
}

fn topology_pair(config: &PipelineConfig, stem: &str) -> TopologyPair {
    TopologyPair {
        prmtop: config.output_path(&format!("{}.prmtop", stem)),
        inpcrd: config.output_path(&format!("{}.inpcrd", stem)),
    }
}

fn leap_script(
    config: &PipelineConfig,
    forcefields: (ProteinForcefield, LigandForcefield),
    extracted: &ExtractedInputs,
) -> LeapScript {
    let mut script = LeapScript::with_forcefields(forcefields.0, forcefields.1);
    if let (Some(mol2), Some(frcmod)) = (&config.ligand_mol2, &extracted.ligand_frcmod) {
        script.load_small_molecule("LIG", mol2, frcmod);
    }
    script
}

fn run_leap(
    config: &PipelineConfig,
    runner: &impl ToolRunner,
    script: &LeapScript,
    file_name: &str,
) -> Result<(), EngineError> {
    let path = config.output_path(file_name);
    script.write_to_path(&path)?;
    run_checked(runner, &leap::tleap_invocation(&config.tools.tleap, &path))?;
    Ok(())
}

fn assemble_topologies(
    config: &PipelineConfig,
    runner: &impl ToolRunner,
    reporter: &ProgressReporter,
    forcefields: (ProteinForcefield, LigandForcefield),
    extracted: &ExtractedInputs,
    prepared: &PreparedStructures,
    mutants: &MutantStructures,
) -> Result<TopologyOutputs, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Building Topologies",
    });
    let mut outputs = TopologyOutputs::default();

    let mut script = leap_script(config, forcefields, extracted);
    if let (Some(receptor), Some(ligand)) = (&prepared.receptor_path, &prepared.ligand_path) {
        let receptor_pair = topology_pair(config, "REC");
        let ligand_pair = topology_pair(config, "LIG");
        script
            .load_pdb("REC", receptor)
            .save_topology("REC", &receptor_pair);
        if config.ligand_mol2.is_none() {
            script.load_pdb("LIG", ligand);
        }
        script.save_topology("LIG", &ligand_pair);
        outputs.receptor = Some(receptor_pair);
        outputs.ligand = Some(ligand_pair);
    }
    let complex_pair = topology_pair(config, "COM");
    script
        .load_pdb("complex", &prepared.complex_path)
        .save_topology("complex", &complex_pair)
        .quit();
    run_leap(config, runner, &script, "leap.in")?;
    outputs.complex = Some(complex_pair);

    if let Some(mutant_complex) = &mutants.complex {
        let mut script = leap_script(config, forcefields, extracted);
        if let Some(mutant_receptor) = &mutants.receptor {
            let pair = topology_pair(config, "MUT_REC");
            script
                .load_pdb("mut_rec", mutant_receptor)
                .save_topology("mut_rec", &pair);
            outputs.mutant_receptor = Some(pair);
        }
        if let Some(mutant_ligand) = &mutants.ligand {
            let pair = topology_pair(config, "MUT_LIG");
            script
                .load_pdb("mut_lig", mutant_ligand)
                .save_topology("mut_lig", &pair);
            outputs.mutant_ligand = Some(pair);
        }
        let pair = topology_pair(config, "MUT_COM");
        script
            .load_pdb("mut_com", mutant_complex)
            .save_topology("mut_com", &pair)
            .quit();
        run_leap(config, runner, &script, "mut_leap.in")?;
        outputs.mutant_complex = Some(pair);
    }

    reporter.report(Progress::PhaseFinish);
    Ok(outputs)
}
