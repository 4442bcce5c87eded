use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mmtop - Prepare Amber topologies from GROMACS simulations for MM-PBSA/MM-GBSA calculations.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract, normalize and mutate snapshots, then build the Amber topologies with tleap.
    Prepare(PrepareArgs),
}

/// Arguments for the `prepare` subcommand.
///
/// Every option overrides the matching key of the configuration file.
#[derive(Args, Debug, Default)]
pub struct PrepareArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- General ---
    /// Prefix of every generated file.
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Directory receiving the generated files.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Prepare only the complex (stability calculation).
    #[arg(long)]
    pub stability: bool,

    /// Strip solvent from the input trajectories before use.
    #[arg(long)]
    pub solvated_trajectory: bool,

    // --- Complex ---
    /// Complex run input file (.tpr).
    #[arg(long = "cs", value_name = "TPR")]
    pub complex_structure: Option<PathBuf>,

    /// Complex index file (.ndx).
    #[arg(long = "ci", value_name = "NDX")]
    pub complex_index: Option<PathBuf>,

    /// Receptor and ligand group names or numbers in the complex index.
    #[arg(long = "cg", num_args = 2, value_names = ["RECEPTOR", "LIGAND"])]
    pub complex_groups: Vec<String>,

    /// Complex trajectories.
    #[arg(long = "ct", num_args = 1.., value_name = "TRAJ")]
    pub complex_trajectories: Vec<PathBuf>,

    // --- Receptor ---
    /// Receptor run input file (.tpr), when simulated on its own.
    #[arg(long = "rs", value_name = "TPR")]
    pub receptor_structure: Option<PathBuf>,

    /// Receptor index file (.ndx).
    #[arg(long = "ri", value_name = "NDX")]
    pub receptor_index: Option<PathBuf>,

    /// Receptor group in the receptor index.
    #[arg(long = "rg", value_name = "GROUP")]
    pub receptor_group: Option<String>,

    /// Receptor trajectories.
    #[arg(long = "rt", num_args = 1.., value_name = "TRAJ")]
    pub receptor_trajectories: Vec<PathBuf>,

    // --- Ligand ---
    /// Ligand run input file (.tpr), when simulated on its own.
    #[arg(long = "ls", value_name = "TPR")]
    pub ligand_structure: Option<PathBuf>,

    /// Ligand index file (.ndx).
    #[arg(long = "li", value_name = "NDX")]
    pub ligand_index: Option<PathBuf>,

    /// Ligand group in the ligand index.
    #[arg(long = "lg", value_name = "GROUP")]
    pub ligand_group: Option<String>,

    /// Ligand trajectories.
    #[arg(long = "lt", num_args = 1.., value_name = "TRAJ")]
    pub ligand_trajectories: Vec<PathBuf>,

    /// Small-molecule ligand structure (.mol2); parameters are derived with parmchk2.
    #[arg(long = "lm", value_name = "MOL2")]
    pub ligand_mol2: Option<PathBuf>,

    // --- Force fields ---
    /// Protein force field (e.g., 'amber99sb-ildn', 'amber14sb').
    #[arg(long, value_name = "NAME")]
    pub protein_forcefield: Option<String>,

    /// Ligand force field ('gaff' or 'gaff2').
    #[arg(long, value_name = "NAME")]
    pub ligand_forcefield: Option<String>,

    // --- Alanine scanning ---
    /// Build alanine mutant topologies.
    #[arg(long)]
    pub alanine_scan: bool,

    /// Residue to mutate, written as CHAIN:NUMBER (e.g., 'A:25').
    #[arg(long, value_name = "CHAIN:NUMBER")]
    pub mutant_residue: Option<String>,

    /// Side carrying the mutated residue ('receptor' or 'ligand').
    #[arg(long = "mutant", value_name = "SIDE")]
    pub mutant_side: Option<String>,

    // --- Decomposition ---
    /// Interface residue listing, e.g. 'within 5'.
    #[arg(long = "print-res", value_name = "MODE")]
    pub print_residues: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S general.prefix=run1_
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_arguments_parse_gromacs_style_flags() {
        let cli = Cli::parse_from([
            "mmtop", "-vv", "prepare", "--cs", "md.tpr", "--ci", "index.ndx", "--cg", "1", "13",
            "--ct", "md_0.xtc", "md_1.xtc", "--lm", "lig.mol2", "--print-res", "within 5",
            "-S", "general.prefix=run_",
        ]);

        assert_eq!(cli.verbose, 2);
        let Commands::Prepare(args) = cli.command;
        assert_eq!(args.complex_structure, Some(PathBuf::from("md.tpr")));
        assert_eq!(args.complex_groups, vec!["1", "13"]);
        assert_eq!(
            args.complex_trajectories,
            vec![PathBuf::from("md_0.xtc"), PathBuf::from("md_1.xtc")]
        );
        assert_eq!(args.ligand_mol2, Some(PathBuf::from("lig.mol2")));
        assert_eq!(args.print_residues.as_deref(), Some("within 5"));
        assert_eq!(args.set_values, vec!["general.prefix=run_"]);
        assert!(!args.stability);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["mmtop", "-q", "-v", "prepare"]);
        assert!(result.is_err());
    }

    #[test]
    fn complex_groups_require_two_values() {
        let result = Cli::try_parse_from(["mmtop", "prepare", "--cg", "1"]);
        assert!(result.is_err());
    }
}
