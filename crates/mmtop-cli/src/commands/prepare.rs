use crate::cli::PrepareArgs;
use crate::config::PartialPrepareConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mmtop::engine::leap::TopologyPair;
use mmtop::engine::progress::ProgressReporter;
use mmtop::engine::tools::SystemToolRunner;
use mmtop::workflows::prepare::{self, PipelineArtifacts};
use std::fmt::Write as _;
use tracing::info;

pub fn run(args: PrepareArgs, quiet: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            PartialPrepareConfig::from_file(path)?
        }
        None => PartialPrepareConfig::default(),
    };
    let config = partial_config.merge_with_cli(&args)?;
    info!(
        prefix = %config.prefix,
        output_dir = %config.output_dir.display(),
        stability = config.stability,
        "Configuration resolved"
    );

    std::fs::create_dir_all(&config.output_dir)?;
    let runner = SystemToolRunner::new(config.output_dir.join(&config.tool_log));

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let artifacts = prepare::run(&config, &runner, &reporter)?;

    if !quiet {
        print!("{}", summarize(&artifacts));
    }
    Ok(())
}

fn summarize(artifacts: &PipelineArtifacts) -> String {
    let mut out = String::from("\n--- Generated Topologies ---\n");
    let topologies = &artifacts.topologies;
    for (label, pair) in [
        ("Complex", &topologies.complex),
        ("Receptor", &topologies.receptor),
        ("Ligand", &topologies.ligand),
        ("Mutant complex", &topologies.mutant_complex),
        ("Mutant receptor", &topologies.mutant_receptor),
        ("Mutant ligand", &topologies.mutant_ligand),
    ] {
        if let Some(TopologyPair { prmtop, inpcrd }) = pair {
            let _ = writeln!(
                out,
                "  {:<16} {} / {}",
                label,
                prmtop.display(),
                inpcrd.display()
            );
        }
    }

    let _ = writeln!(out, "  {:<16} {}", "Complex index", artifacts.complex_index.display());
    if let Some(frcmod) = &artifacts.ligand_frcmod {
        let _ = writeln!(out, "  {:<16} {}", "Ligand frcmod", frcmod.display());
    }
    if !artifacts.complex_trajectories.is_empty() {
        let _ = writeln!(
            out,
            "  {:<16} {} file(s)",
            "Trajectories",
            artifacts.complex_trajectories.len()
        );
    }
    if let Some(residues) = &artifacts.interface_residues {
        let _ = writeln!(out, "\nInterface residues: {}", residues);
    }
    out
}
