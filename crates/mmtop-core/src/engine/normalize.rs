//! Renaming rules that reconcile GROMACS snapshots with Amber residue and atom names.
//!
//! The passes must run in a fixed order: histidine and cysteine naming both depend on
//! the hydrogens and bonds present in the raw snapshot, hydrogens are stripped after
//! them, and atom naming runs last. [`normalize_structure`] applies that order.

use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::{is_cysteine, is_histidine, terminal_oxygen_rename};
use std::collections::BTreeSet;
use tracing::debug;

/// Counts of the changes made by [`normalize_structure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizationReport {
    pub histidines_renamed: usize,
    pub disulfide_residues: usize,
    pub hydrogens_removed: usize,
    pub atoms_renamed: usize,
}

/// Names histidines after the hydrogens present on their ring nitrogens.
///
/// `HD1` and `HE2` give `HIP`, `HD1` alone gives `HID` and `HE2` alone gives `HIE`; a
/// histidine with neither keeps its name. Only atoms that are hydrogens count.
///
/// # Return
///
/// The number of residues whose name changed.
pub fn normalize_histidines(system: &mut MolecularSystem) -> usize {
    let mut renames: Vec<(ResidueId, &'static str)> = Vec::new();

    for (residue_id, residue) in system.residues_iter() {
        if !is_histidine(&residue.name) {
            continue;
        }

        let (mut has_hd1, mut has_he2) = (false, false);
        for (_, atom) in system.residue_atoms(residue_id) {
            if !atom.is_hydrogen() {
                continue;
            }
            match atom.name.as_str() {
                "HD1" => has_hd1 = true,
                "HE2" => has_he2 = true,
                _ => {}
            }
        }

        let protonation_name = match (has_hd1, has_he2) {
            (true, true) => "HIP",
            (true, false) => "HID",
            (false, true) => "HIE",
            (false, false) => continue,
        };
        if residue.name != protonation_name {
            renames.push((residue_id, protonation_name));
        }
    }

    for &(residue_id, name) in &renames {
        if let Some(residue) = system.residue_mut(residue_id) {
            residue.name = name.to_string();
        }
    }
    renames.len()
}

/// Renames cysteines joined by a disulfide bond to `CYX`.
///
/// Every atom whose name contains `SG` in a cysteine-family residue is checked; a bonded
/// partner in a different cysteine-family residue marks both residues. Bonds within a
/// residue are ignored.
///
/// # Return
///
/// The number of residues marked as disulfide-bonded.
pub fn normalize_disulfides(system: &mut MolecularSystem) -> usize {
    let mut marked: BTreeSet<ResidueId> = BTreeSet::new();

    for (residue_id, residue) in system.residues_iter() {
        if !is_cysteine(&residue.name) {
            continue;
        }
        for (atom_id, atom) in system.residue_atoms(residue_id) {
            if !atom.name.contains("SG") {
                continue;
            }
            for &partner_id in system.get_bonded_neighbors(atom_id).unwrap_or_default() {
                let Some(partner) = system.atom(partner_id) else {
                    continue;
                };
                if partner.residue_id == residue_id {
                    continue;
                }
                let partner_is_cysteine = system
                    .residue(partner.residue_id)
                    .is_some_and(|r| is_cysteine(&r.name));
                if partner_is_cysteine {
                    marked.insert(residue_id);
                    marked.insert(partner.residue_id);
                }
            }
        }
    }

    for &residue_id in &marked {
        if let Some(residue) = system.residue_mut(residue_id) {
            residue.name = "CYX".to_string();
        }
    }
    marked.len()
}

/// Removes every hydrogen together with its bonds.
///
/// # Return
///
/// The number of atoms removed.
pub fn strip_hydrogens(system: &mut MolecularSystem) -> usize {
    let hydrogens: Vec<AtomId> = system
        .atoms_iter()
        .filter(|(_, atom)| atom.is_hydrogen())
        .map(|(id, _)| id)
        .collect();
    system.remove_atoms(hydrogens)
}

/// Converts GROMACS atom names to their Amber equivalents.
///
/// `CD` becomes `CD1` in isoleucine; `OC1` becomes `O` and `OC2` becomes `OXT` in every
/// residue.
///
/// # Return
///
/// The number of atoms renamed.
pub fn normalize_atom_naming(system: &mut MolecularSystem) -> usize {
    let mut renames: Vec<(AtomId, &'static str)> = Vec::new();

    for (residue_id, residue) in system.residues_iter() {
        let is_isoleucine = residue.name == "ILE";
        for (atom_id, atom) in system.residue_atoms(residue_id) {
            if is_isoleucine && atom.name == "CD" {
                renames.push((atom_id, "CD1"));
            } else if let Some(amber_name) = terminal_oxygen_rename(&atom.name) {
                renames.push((atom_id, amber_name));
            }
        }
    }

    for &(atom_id, name) in &renames {
        if let Some(atom) = system.atom_mut(atom_id) {
            atom.name = name.to_string();
        }
    }
    renames.len()
}

/// Runs every normalization pass in the required order.
pub fn normalize_structure(system: &mut MolecularSystem) -> NormalizationReport {
    let report = NormalizationReport {
        histidines_renamed: normalize_histidines(system),
        disulfide_residues: normalize_disulfides(system),
        hydrogens_removed: strip_hydrogens(system),
        atoms_renamed: normalize_atom_naming(system),
    };
    debug!(?report, "Normalized structure");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::BondOrigin;
    use nalgebra::Point3;

    fn add_residue(
        system: &mut MolecularSystem,
        chain: char,
        number: isize,
        name: &str,
        atoms: &[&str],
    ) -> (ResidueId, Vec<AtomId>) {
        let chain_id = system.add_chain(chain);
        let residue_id = system.add_residue(chain_id, number, name).unwrap();
        let atom_ids = atoms
            .iter()
            .enumerate()
            .map(|(i, atom_name)| {
                let position = Point3::new(number as f64 * 10.0, i as f64 * 5.0, 0.0);
                system
                    .add_atom_to_residue(residue_id, Atom::new(atom_name, residue_id, position))
                    .unwrap()
            })
            .collect();
        (residue_id, atom_ids)
    }

    fn residue_names(system: &MolecularSystem) -> Vec<String> {
        system
            .residues_iter()
            .map(|(_, r)| r.name.clone())
            .collect()
    }

    fn atom_names(system: &MolecularSystem) -> Vec<String> {
        system
            .residues_iter()
            .flat_map(|(id, _)| system.residue_atoms(id).map(|(_, a)| a.name.clone()))
            .collect()
    }

    #[test]
    fn histidines_are_named_after_ring_hydrogens() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "HIS", &["ND1", "HD1", "NE2", "HE2"]);
        add_residue(&mut system, 'A', 2, "HIS", &["ND1", "HD1", "NE2"]);
        add_residue(&mut system, 'A', 3, "HID", &["ND1", "NE2", "HE2"]);
        add_residue(&mut system, 'A', 4, "HIE", &["ND1", "NE2"]);

        let renamed = normalize_histidines(&mut system);

        assert_eq!(residue_names(&system), vec!["HIP", "HID", "HIE", "HIE"]);
        assert_eq!(renamed, 3);
    }

    #[test]
    fn histidine_normalization_is_idempotent() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "HIS", &["ND1", "HD1", "NE2", "HE2"]);
        add_residue(&mut system, 'A', 2, "HIP", &["ND1", "NE2", "HE2"]);
        add_residue(&mut system, 'A', 3, "HIS", &["ND1", "NE2"]);

        normalize_histidines(&mut system);
        let once = residue_names(&system);
        let second_pass = normalize_histidines(&mut system);

        assert_eq!(residue_names(&system), once);
        assert_eq!(second_pass, 0);
    }

    #[test]
    fn ring_hydrogen_names_outside_histidines_are_ignored() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "ASP", &["OD1", "HD1"]);
        assert_eq!(normalize_histidines(&mut system), 0);
        assert_eq!(residue_names(&system), vec!["ASP"]);
    }

    #[test]
    fn non_hydrogen_atoms_named_like_ring_hydrogens_do_not_count() {
        let mut system = MolecularSystem::new();
        let (residue_id, _) = add_residue(&mut system, 'A', 1, "HIS", &["ND1"]);
        system
            .add_atom_to_residue(
                residue_id,
                Atom::with_element("HD1", "C", residue_id, Point3::origin()),
            )
            .unwrap();

        assert_eq!(normalize_histidines(&mut system), 0);
        assert_eq!(residue_names(&system), vec!["HIS"]);
    }

    fn disulfide_scenario() -> (MolecularSystem, [ResidueId; 5]) {
        let mut system = MolecularSystem::new();
        let (r1, _) = add_residue(&mut system, 'A', 1, "ALA", &["N", "CA", "C", "O", "CB"]);
        let (r2, r2_atoms) = add_residue(&mut system, 'A', 2, "CYS", &["N", "CA", "CB", "SG"]);
        let (r3, r3_atoms) = add_residue(&mut system, 'A', 3, "CYS", &["N", "CA", "CB", "SG"]);
        let (r4, _) = add_residue(&mut system, 'A', 4, "GLY", &["N", "CA", "C", "O"]);
        let (r5, r5_atoms) = add_residue(&mut system, 'B', 1, "CYS", &["N", "CA", "CB", "SG"]);

        system
            .add_bond(r2_atoms[3], r5_atoms[3], BondOrigin::Conect)
            .unwrap();
        for atoms in [&r2_atoms, &r3_atoms, &r5_atoms] {
            system.add_bond(atoms[2], atoms[3], BondOrigin::Conect).unwrap();
        }
        (system, [r1, r2, r3, r4, r5])
    }

    #[test]
    fn bridged_cysteines_become_cyx_and_free_cysteine_stays() {
        let (mut system, [r1, r2, r3, r4, r5]) = disulfide_scenario();

        let marked = normalize_disulfides(&mut system);

        assert_eq!(marked, 2);
        assert_eq!(system.residue(r1).unwrap().name, "ALA");
        assert_eq!(system.residue(r2).unwrap().name, "CYX");
        assert_eq!(system.residue(r3).unwrap().name, "CYS");
        assert_eq!(system.residue(r4).unwrap().name, "GLY");
        assert_eq!(system.residue(r5).unwrap().name, "CYX");
    }

    #[test]
    fn sulfur_bonded_to_non_cysteine_is_not_a_disulfide() {
        let mut system = MolecularSystem::new();
        let (cys, cys_atoms) = add_residue(&mut system, 'A', 1, "CYS", &["CB", "SG"]);
        let (_, lig_atoms) = add_residue(&mut system, 'B', 1, "LIG", &["S1"]);
        system
            .add_bond(cys_atoms[1], lig_atoms[0], BondOrigin::Conect)
            .unwrap();

        assert_eq!(normalize_disulfides(&mut system), 0);
        assert_eq!(system.residue(cys).unwrap().name, "CYS");
    }

    #[test]
    fn deprotonated_cysteine_partner_is_recognized() {
        let mut system = MolecularSystem::new();
        let (a, a_atoms) = add_residue(&mut system, 'A', 1, "CYM", &["SG"]);
        let (b, b_atoms) = add_residue(&mut system, 'A', 9, "CYS", &["SG"]);
        system
            .add_bond(a_atoms[0], b_atoms[0], BondOrigin::Perceived)
            .unwrap();

        normalize_disulfides(&mut system);

        assert_eq!(system.residue(a).unwrap().name, "CYX");
        assert_eq!(system.residue(b).unwrap().name, "CYX");
    }

    #[test]
    fn strip_hydrogens_removes_atoms_and_their_bonds() {
        let mut system = MolecularSystem::new();
        let (residue_id, atoms) = add_residue(&mut system, 'A', 1, "SER", &["OG", "HG", "CB"]);
        system.add_bond(atoms[0], atoms[1], BondOrigin::Conect).unwrap();
        system.add_bond(atoms[0], atoms[2], BondOrigin::Conect).unwrap();

        let removed = strip_hydrogens(&mut system);

        assert_eq!(removed, 1);
        assert_eq!(system.residue(residue_id).unwrap().atoms().len(), 2);
        assert_eq!(system.bonds().len(), 1);
        assert_eq!(system.get_bonded_neighbors(atoms[0]).unwrap(), &[atoms[2]]);
    }

    #[test]
    fn atom_naming_converts_isoleucine_and_terminal_oxygens() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "ILE", &["N", "CA", "CD", "C", "O"]);
        add_residue(&mut system, 'A', 2, "PRO", &["N", "CD", "C", "OC1", "OC2"]);

        let renamed = normalize_atom_naming(&mut system);

        assert_eq!(renamed, 3);
        assert_eq!(
            atom_names(&system),
            vec!["N", "CA", "CD1", "C", "O", "N", "CD", "C", "O", "OXT"]
        );
    }

    #[test]
    fn full_normalization_sees_hydrogens_before_stripping_them() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "HIS", &["ND1", "HD1", "NE2", "HE2"]);
        add_residue(&mut system, 'A', 2, "ILE", &["CD", "HD11", "OC1", "OC2"]);

        let report = normalize_structure(&mut system);

        assert_eq!(
            report,
            NormalizationReport {
                histidines_renamed: 1,
                disulfide_residues: 0,
                hydrogens_removed: 3,
                atoms_renamed: 3,
            }
        );
        assert_eq!(residue_names(&system), vec!["HIP", "ILE"]);
        assert_eq!(atom_names(&system), vec!["ND1", "NE2", "CD1", "O", "OXT"]);
    }

    #[test]
    fn clean_structure_is_unchanged_by_full_normalization() {
        let mut system = MolecularSystem::new();
        add_residue(&mut system, 'A', 1, "ALA", &["N", "CA", "C", "O", "CB"]);
        add_residue(&mut system, 'A', 2, "LEU", &["N", "CA", "C", "O", "CB", "CG", "CD1", "CD2"]);
        add_residue(&mut system, 'A', 3, "GLY", &["N", "CA", "C", "O", "OXT"]);
        let residues_before = residue_names(&system);
        let atoms_before = atom_names(&system);

        let report = normalize_structure(&mut system);

        assert_eq!(report, NormalizationReport::default());
        assert_eq!(residue_names(&system), residues_before);
        assert_eq!(atom_names(&system), atoms_before);
    }
}
