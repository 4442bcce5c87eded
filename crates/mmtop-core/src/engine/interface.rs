use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::distance_squared;
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// 1-based residue indices (in file order) found at a receptor/ligand interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceResidues(BTreeSet<usize>);

impl InterfaceResidues {
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for InterfaceResidues {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ascending, comma-separated, without spaces: `3,7,12`.
impl fmt::Display for InterfaceResidues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", index)?;
            first = false;
        }
        Ok(())
    }
}

/// Finds receptor and ligand residues that come within `cutoff` Å of each other.
///
/// The first `receptor_residue_count` residues of `complex` (in file order) are the
/// receptor and the rest are the ligand. A receptor/ligand residue pair is at the
/// interface when any atom of one lies within `cutoff` of any atom of the other; both
/// residues are then reported. Distances equal to the cutoff count as contacts.
pub fn find_interface_residues(
    complex: &MolecularSystem,
    receptor_residue_count: usize,
    cutoff: f64,
) -> InterfaceResidues {
    let residue_positions: Vec<Vec<Point3<f64>>> = complex
        .residues_iter()
        .map(|(residue_id, _)| {
            complex
                .residue_atoms(residue_id)
                .map(|(_, atom)| atom.position)
                .collect()
        })
        .collect();

    if receptor_residue_count > residue_positions.len() {
        warn!(
            receptor_residue_count,
            complex_residues = residue_positions.len(),
            "Receptor has more residues than the complex; no ligand residues to compare"
        );
    }
    let split = receptor_residue_count.min(residue_positions.len());
    let (receptor, ligand) = residue_positions.split_at(split);
    let cutoff_sq = cutoff * cutoff;

    let mut interface = BTreeSet::new();
    for (i, receptor_atoms) in receptor.iter().enumerate() {
        for (j, ligand_atoms) in ligand.iter().enumerate() {
            let in_contact = receptor_atoms.iter().any(|a| {
                ligand_atoms
                    .iter()
                    .any(|b| distance_squared(a, b) <= cutoff_sq)
            });
            if in_contact {
                interface.insert(i + 1);
                interface.insert(split + j + 1);
            }
        }
    }

    debug!(count = interface.len(), cutoff, "Found interface residues");
    InterfaceResidues(interface)
}
