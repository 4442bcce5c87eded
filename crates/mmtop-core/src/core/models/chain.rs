use super::ids::ResidueId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B', ' ' when blank)
    pub(crate) residues: Vec<ResidueId>, // Residues belonging to this chain, in file order
}

impl Chain {
    pub(crate) fn new(id: char) -> Self {
        Self {
            id,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn new_chain_starts_empty() {
        let chain = Chain::new('B');
        assert_eq!(chain.id, 'B');
        assert!(chain.residues().is_empty());
    }

    #[test]
    fn residues_are_listed_in_insertion_order() {
        let mut chain = Chain::new('A');
        let first = ResidueId::from(KeyData::from_ffi(1));
        let second = ResidueId::from(KeyData::from_ffi(2));
        chain.residues.push(first);
        chain.residues.push(second);
        assert_eq!(chain.residues(), &[first, second]);
    }
}
