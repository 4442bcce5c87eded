use super::ids::ResidueId;
use crate::core::utils::identifiers::atomic_number_for_symbol;
use nalgebra::Point3;

/// Atomic number shared by every hydrogen isotope written to PDB files.
pub const HYDROGEN_ATOMIC_NUMBER: u8 = 1;

/// Represents an atom in a prepared snapshot.
///
/// Besides its name and coordinates, an atom remembers the element information needed
/// by the normalizer (hydrogen detection) and the columns that are echoed back when the
/// snapshot is written again.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "HD1", "OC1").
    pub name: String,
    /// The serial number read from the source file.
    pub serial: usize,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The element symbol as written in the element column, or inferred from the name.
    pub element: String,
    /// The atomic number derived from the element (0 when unknown).
    pub atomic_number: u8,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Occupancy column, echoed back on write.
    pub occupancy: f64,
    /// Temperature factor column, echoed back on write.
    pub temp_factor: f64,
}

impl Atom {
    /// Creates a new `Atom`, inferring the element from its name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        let element = element_from_atom_name(name);
        Self::with_element(name, &element, residue_id, position)
    }

    /// Creates a new `Atom` with an explicit element symbol.
    pub fn with_element(
        name: &str,
        element: &str,
        residue_id: ResidueId,
        position: Point3<f64>,
    ) -> Self {
        let element = normalize_element_symbol(element);
        Self {
            name: name.to_string(),
            serial: 0,
            residue_id,
            atomic_number: atomic_number_for_symbol(&element).unwrap_or(0),
            element,
            position,
            occupancy: 1.0,
            temp_factor: 0.0,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == HYDROGEN_ATOMIC_NUMBER
    }
}

/// Infers an element symbol from a PDB atom name.
///
/// GROMACS writes hydrogens with leading digits (e.g. "1HB"), so digits are skipped
/// before the first letter. Two-letter symbols are only accepted for the handful of
/// elements that actually appear in biomolecular snapshots; everything else falls back
/// to the first letter, which is what makes "CA" a carbon rather than calcium.
pub fn element_from_atom_name(name: &str) -> String {
    let letters: String = name
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_alphabetic())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let upper = letters.to_ascii_uppercase();

    for two_letter in ["CL", "BR", "NA", "MG", "ZN", "FE", "MN", "CU", "CO", "NI"] {
        if upper.starts_with(two_letter) && upper.len() == two_letter.len() {
            return normalize_element_symbol(two_letter);
        }
    }

    upper
        .chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_default()
}

fn normalize_element_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => {
            let mut normalized = first.to_ascii_uppercase().to_string();
            normalized.push_str(&chars.as_str().to_ascii_lowercase());
            normalized
        }
        None => String::new(),
    }
}
