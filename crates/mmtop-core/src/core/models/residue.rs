use super::ids::{AtomId, ChainId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub name: String,              // Residue name, rewritten by the normalizer (e.g., "HIS" -> "HIE")
    pub hetero: bool,              // Read from HETATM records
    number: isize,                 // Residue sequence number from source file
    insertion_code: Option<char>,  // PDB insertion code, if any
    chain_id: ChainId,             // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>, // Atoms belonging to this residue, in file order
}

impl Residue {
    pub(crate) fn new(
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            name: name.to_string(),
            hetero: false,
            number,
            insertion_code,
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
    }

    pub fn number(&self) -> isize {
        self.number
    }

    pub fn insertion_code(&self) -> Option<char> {
        self.insertion_code
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::{AtomId, ChainId};
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, None, "GLY", chain_id);
        assert_eq!(residue.number(), 10);
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.chain_id(), chain_id);
        assert_eq!(residue.insertion_code(), None);
        assert!(!residue.hetero);
        assert!(residue.atoms().is_empty());
    }

    #[test]
    fn add_atom_preserves_insertion_order() {
        let mut residue = Residue::new(7, Some('A'), "SER", dummy_chain_id(3));
        let atom_id1 = dummy_atom_id(1);
        let atom_id2 = dummy_atom_id(2);
        residue.add_atom(atom_id2);
        residue.add_atom(atom_id1);
        assert_eq!(residue.atoms(), &[atom_id2, atom_id1]);
        assert_eq!(residue.insertion_code(), Some('A'));
    }

    #[test]
    fn remove_atom_removes_only_the_given_atom() {
        let mut residue = Residue::new(8, None, "THR", dummy_chain_id(4));
        let keep = dummy_atom_id(100);
        let drop = dummy_atom_id(101);
        residue.add_atom(keep);
        residue.add_atom(drop);
        residue.remove_atom(drop);
        assert_eq!(residue.atoms(), &[keep]);
    }

    #[test]
    fn remove_atom_does_nothing_if_atom_not_present() {
        let mut residue = Residue::new(9, None, "VAL", dummy_chain_id(5));
        let atom_id = dummy_atom_id(200);
        residue.add_atom(atom_id);
        residue.remove_atom(dummy_atom_id(201));
        assert_eq!(residue.atoms(), &[atom_id]);
    }
}
