//! Builders for the GROMACS calls that produce raw snapshots.
//!
//! Every function only describes the call; running it is left to a
//! [`ToolRunner`](super::tools::ToolRunner).

use super::tools::ToolInvocation;
use std::path::Path;

/// Name given to the receptor group in the merged complex index.
pub const RECEPTOR_GROUP: &str = "GMXMMPBSA_REC";
/// Name given to the ligand group in the merged complex index.
pub const LIGAND_GROUP: &str = "GMXMMPBSA_LIG";
/// Group make_ndx creates from `RECEPTOR_GROUP | LIGAND_GROUP`.
pub const COMPLEX_GROUP: &str = "GMXMMPBSA_REC_GMXMMPBSA_LIG";

/// Renames the receptor and ligand groups of `complex_index` and adds their union.
pub fn merge_index(
    gmx: &Path,
    complex_index: &Path,
    receptor_group: &str,
    ligand_group: &str,
    output: &Path,
) -> ToolInvocation {
    ToolInvocation::new(
        "gmx make_ndx",
        gmx,
        format!("merging groups of {}", complex_index.display()),
    )
    .arg("make_ndx")
    .arg("-n")
    .path_arg(complex_index)
    .arg("-o")
    .path_arg(output)
    .stdin(format!(
        "name {r} {rec}\n name {l} {lig}\n {r} | {l}\n q\n",
        r = receptor_group,
        l = ligand_group,
        rec = RECEPTOR_GROUP,
        lig = LIGAND_GROUP,
    ))
}

/// Input files and selection for one trjconv call.
#[derive(Debug, Clone, Copy)]
pub struct TrajectorySelection<'a> {
    pub trajectory: &'a Path,
    pub structure: &'a Path,
    pub index: Option<&'a Path>,
    pub group: &'a str,
}

/// Writes the first frame of the selected group as a PDB snapshot.
pub fn extract_snapshot(gmx: &Path, selection: TrajectorySelection<'_>, output: &Path) -> ToolInvocation {
    let invocation = ToolInvocation::new(
        "gmx trjconv",
        gmx,
        format!(
            "saving group {} of {} as {}",
            selection.group,
            selection.structure.display(),
            output.display()
        ),
    )
    .arg("trjconv")
    .arg("-f")
    .path_arg(selection.trajectory)
    .arg("-s")
    .path_arg(selection.structure)
    .arg("-o")
    .path_arg(output);

    with_index(invocation, selection.index)
        .arg("-b")
        .arg("0")
        .arg("-e")
        .arg("0")
        .stdin(format!("{}\n", selection.group))
}

/// Writes the whole trajectory restricted to the selected group, dropping solvent.
pub fn clean_trajectory(gmx: &Path, selection: TrajectorySelection<'_>, output: &Path) -> ToolInvocation {
    let invocation = ToolInvocation::new(
        "gmx trjconv",
        gmx,
        format!(
            "cleaning trajectory {} into {}",
            selection.trajectory.display(),
            output.display()
        ),
    )
    .arg("trjconv")
    .arg("-f")
    .path_arg(selection.trajectory)
    .arg("-s")
    .path_arg(selection.structure)
    .arg("-o")
    .path_arg(output);

    with_index(invocation, selection.index).stdin(format!("{}\n", selection.group))
}

fn with_index(invocation: ToolInvocation, index: Option<&Path>) -> ToolInvocation {
    match index {
        Some(index) => invocation.arg("-n").path_arg(index),
        None => invocation,
    }
}
