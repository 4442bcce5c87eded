use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use super::topology::{Bond, BondOrigin};
use crate::core::utils::geometry::distance;
use crate::core::utils::identifiers::covalent_radius;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, HashSet};

/// Slack added to the sum of covalent radii when perceiving bonds, in Angstroms.
const BOND_PERCEPTION_TOLERANCE: f64 = 0.45;
/// Pairs closer than this are treated as overlapping duplicates, never as bonds.
const BOND_PERCEPTION_MIN_DISTANCE: f64 = 0.4;

/// Represents a complete molecular snapshot with atoms, residues, chains, and bonds.
///
/// Residues are kept in the order they were read so that 1-based residue indices match
/// the indices used by downstream MM-PBSA tooling. Bond connectivity is stored both as a
/// flat list and as an adjacency index that is kept consistent on every removal.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms using a slot map for efficient ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for efficient ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains using a slot map for efficient ID management.
    chains: SlotMap<ChainId, Chain>,
    /// Residues in file order.
    residue_order: Vec<ResidueId>,
    /// List of all bonds in the system.
    bonds: Vec<Bond>,
    /// Lookup map for the first residue with a given chain and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns an iterator over all atoms in the system, in storage order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    /// Returns the number of atoms in the system.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves a mutable reference to a residue by its ID.
    pub fn residue_mut(&mut self, id: ResidueId) -> Option<&mut Residue> {
        self.residues.get_mut(id)
    }

    /// Returns an iterator over all residues in file order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(ResidueId, &Residue)` pairs.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residue_order
            .iter()
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    /// Returns the number of residues in the system.
    pub fn residue_count(&self) -> usize {
        self.residue_order.len()
    }

    /// Returns an iterator over the atoms of a residue, in file order.
    ///
    /// Yields nothing when the residue does not exist.
    pub fn residue_atoms(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .map(|residue| residue.atoms())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Retrieves an immutable reference to a chain by its ID.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns a slice of all bonds in the system.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds the first residue, in file order, with the given chain identifier and number.
    ///
    /// # Arguments
    ///
    /// * `chain` - The single-character chain identifier.
    /// * `residue_number` - The residue sequence number from the source file.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if such a residue exists, otherwise `None`.
    pub fn find_residue(&self, chain: char, residue_number: isize) -> Option<ResidueId> {
        let chain_id = self.find_chain_by_id(chain)?;
        self.residue_id_map
            .get(&(chain_id, residue_number))
            .copied()
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        *self
            .chain_id_map
            .entry(id)
            .or_insert_with(|| self.chains.insert(Chain::new(id)))
    }

    /// Appends a new residue to a chain.
    ///
    /// Unlike chains, residues are never merged: a snapshot may legitimately repeat a
    /// chain/number pair (for example a ligand numbered from 1 again), and each occurrence
    /// keeps its own position in the residue order.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (the chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Option<ResidueId> {
        self.add_residue_with_insertion(chain_id, residue_number, None, name)
    }

    /// Appends a new residue carrying a PDB insertion code.
    pub fn add_residue_with_insertion(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Option<ResidueId> {
        if !self.chains.contains_key(chain_id) {
            return None;
        }

        let residue_id = self.residues.insert(Residue::new(
            residue_number,
            insertion_code,
            name,
            chain_id,
        ));
        self.residue_order.push(residue_id);
        self.residue_id_map
            .entry((chain_id, residue_number))
            .or_insert(residue_id);
        self.chains[chain_id].residues.push(residue_id);

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (e.g., if residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;

        let atom_id = self.atoms.insert(atom);
        residue.add_atom(atom_id);
        self.bond_adjacency.insert(atom_id, Vec::new());

        Some(atom_id)
    }

    /// Adds a bond between two atoms.
    ///
    /// Idempotent; adding an existing bond succeeds without creating duplicates.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if successful, otherwise `None` (missing atoms or a self-bond).
    pub fn add_bond(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        origin: BondOrigin,
    ) -> Option<()> {
        if atom1_id == atom2_id
            || !self.atoms.contains_key(atom1_id)
            || !self.atoms.contains_key(atom2_id)
        {
            return None;
        }

        if let Some(neighbors) = self.bond_adjacency.get(atom1_id) {
            if neighbors.contains(&atom2_id) {
                return Some(());
            }
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id, origin));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Some(())
    }

    /// Removes many atoms at once, filtering the bond list a single time.
    ///
    /// # Return
    ///
    /// The number of atoms that existed and were removed.
    pub fn remove_atoms(&mut self, atom_ids: impl IntoIterator<Item = AtomId>) -> usize {
        let mut removed = HashSet::new();

        for atom_id in atom_ids {
            let Some(atom) = self.atoms.remove(atom_id) else {
                continue;
            };
            if let Some(residue) = self.residues.get_mut(atom.residue_id) {
                residue.remove_atom(atom_id);
            }
            let neighbors = self.bond_adjacency.remove(atom_id).unwrap_or_default();
            for neighbor_id in neighbors {
                if let Some(adjacency) = self.bond_adjacency.get_mut(neighbor_id) {
                    adjacency.retain(|&id| id != atom_id);
                }
            }
            removed.insert(atom_id);
        }

        if !removed.is_empty() {
            self.bonds.retain(|bond| {
                !removed.contains(&bond.atom1_id) && !removed.contains(&bond.atom2_id)
            });
        }

        removed.len()
    }

    /// Retrieves the bonded neighbors of an atom.
    ///
    /// # Return
    ///
    /// Returns `Some(&[AtomId])` if the atom exists, otherwise `None`.
    pub fn get_bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }

    /// Perceives covalent bonds from interatomic distances.
    ///
    /// Two atoms are bonded when their distance does not exceed the sum of their covalent
    /// radii plus a fixed tolerance. Atoms whose element has no tabulated radius (ions,
    /// unknown elements) never receive perceived bonds. Candidate pairs are found with a
    /// uniform cell grid, so the cost is linear in the number of atoms.
    ///
    /// # Return
    ///
    /// The number of bonds that were newly added.
    pub fn perceive_bonds(&mut self) -> usize {
        let candidates: Vec<(AtomId, Point3<f64>, f64)> = self
            .atoms
            .iter()
            .filter_map(|(id, atom)| {
                covalent_radius(&atom.element).map(|radius| (id, atom.position, radius))
            })
            .collect();

        let max_radius = candidates
            .iter()
            .map(|&(_, _, radius)| radius)
            .fold(0.0_f64, f64::max);
        if candidates.len() < 2 || max_radius <= 0.0 {
            return 0;
        }
        let cell_size = 2.0 * max_radius + BOND_PERCEPTION_TOLERANCE;

        let cell_of = |p: &Point3<f64>| -> (i64, i64, i64) {
            (
                (p.x / cell_size).floor() as i64,
                (p.y / cell_size).floor() as i64,
                (p.z / cell_size).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        for (index, (_, position, _)) in candidates.iter().enumerate() {
            grid.entry(cell_of(position)).or_default().push(index);
        }

        let mut new_bonds = Vec::new();
        for (i, (id_i, pos_i, radius_i)) in candidates.iter().enumerate() {
            let (cx, cy, cz) = cell_of(pos_i);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &j in bucket {
                            if j <= i {
                                continue;
                            }
                            let (id_j, pos_j, radius_j) = &candidates[j];
                            let limit = radius_i + radius_j + BOND_PERCEPTION_TOLERANCE;
                            let separation = distance(pos_i, pos_j);
                            if separation >= BOND_PERCEPTION_MIN_DISTANCE && separation <= limit {
                                new_bonds.push((*id_i, *id_j));
                            }
                        }
                    }
                }
            }
        }

        let before = self.bonds.len();
        for (a, b) in new_bonds {
            self.add_bond(a, b, BondOrigin::Perceived);
        }
        self.bonds.len() - before
    }
}
