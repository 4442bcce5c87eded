use phf::{Map, Set, phf_map, phf_set};

/// Residue names of the histidine family, in any protonation state.
static HISTIDINE_NAMES: Set<&'static str> = phf_set! { "HIS", "HIE", "HID", "HIP" };

/// Residue names of the cysteine family: neutral, disulfide-bonded and deprotonated.
static CYSTEINE_NAMES: Set<&'static str> = phf_set! { "CYS", "CYX", "CYM" };

/// Atoms an alanine-truncated residue keeps.
static ALANINE_RETAINED_ATOMS: Set<&'static str> = phf_set! { "CB", "C", "CA", "N", "O" };

/// GROMACS terminal oxygen names and their Amber counterparts.
static TERMINAL_OXYGEN_RENAMES: Map<&'static str, &'static str> = phf_map! {
    "OC1" => "O",
    "OC2" => "OXT",
};

static ATOMIC_NUMBERS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "D" => 1, "He" => 2, "Li" => 3, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15, "S" => 16,
    "Cl" => 17, "K" => 19, "Ca" => 20, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28,
    "Cu" => 29, "Zn" => 30, "Se" => 34, "Br" => 35, "Rb" => 37, "Cd" => 48, "I" => 53,
    "Cs" => 55, "Hg" => 80,
};

// Single-bond covalent radii in Angstroms (Cordero et al., 2008).
static COVALENT_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 0.31, "D" => 0.31, "B" => 0.84, "C" => 0.76, "N" => 0.71, "O" => 0.66,
    "F" => 0.57, "Si" => 1.11, "P" => 1.07, "S" => 1.05, "Cl" => 1.02, "Se" => 1.20,
    "Br" => 1.20, "I" => 1.39,
};

pub fn is_histidine(residue_name: &str) -> bool {
    HISTIDINE_NAMES.contains(residue_name.trim())
}

pub fn is_cysteine(residue_name: &str) -> bool {
    CYSTEINE_NAMES.contains(residue_name.trim())
}

pub fn is_alanine_retained_atom(atom_name: &str) -> bool {
    ALANINE_RETAINED_ATOMS.contains(atom_name.trim())
}

/// Returns the Amber name for a GROMACS terminal oxygen, if `atom_name` is one.
pub fn terminal_oxygen_rename(atom_name: &str) -> Option<&'static str> {
    TERMINAL_OXYGEN_RENAMES.get(atom_name.trim()).copied()
}

/// Looks up the atomic number of an element symbol written in "Cl" case.
pub fn atomic_number_for_symbol(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol).copied()
}

/// Looks up the covalent radius of an element symbol written in "Cl" case.
///
/// Elements without an entry (metal ions, noble gases) never take part in
/// distance-based bond perception.
pub fn covalent_radius(symbol: &str) -> Option<f64> {
    COVALENT_RADII.get(symbol).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_families_are_recognized() {
        for name in ["HIS", "HIE", "HID", "HIP"] {
            assert!(is_histidine(name));
        }
        for name in ["CYS", "CYX", "CYM"] {
            assert!(is_cysteine(name));
        }
        assert!(!is_histidine("HSD"));
        assert!(!is_cysteine("CYN"));
        assert!(is_histidine(" HIS "));
    }

    #[test]
    fn alanine_retained_atoms_are_backbone_plus_cb() {
        for name in ["N", "CA", "C", "O", "CB"] {
            assert!(is_alanine_retained_atom(name));
        }
        for name in ["CG", "OXT", "H", "HA", "SG"] {
            assert!(!is_alanine_retained_atom(name));
        }
    }

    #[test]
    fn terminal_oxygens_map_to_amber_names() {
        assert_eq!(terminal_oxygen_rename("OC1"), Some("O"));
        assert_eq!(terminal_oxygen_rename("OC2"), Some("OXT"));
        assert_eq!(terminal_oxygen_rename("O"), None);
    }

    #[test]
    fn atomic_numbers_and_radii_use_normalized_symbols() {
        assert_eq!(atomic_number_for_symbol("H"), Some(1));
        assert_eq!(atomic_number_for_symbol("Cl"), Some(17));
        assert_eq!(atomic_number_for_symbol("CL"), None);
        assert_eq!(covalent_radius("S"), Some(1.05));
        assert_eq!(covalent_radius("Na"), None);
    }
}
