use super::ids::AtomId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where a bond in a snapshot came from.
///
/// PDB snapshots written by `trjconv` rarely carry connectivity, so most bonds are
/// perceived from interatomic distances at load time; explicit `CONECT` records are kept
/// apart so they survive a write/read cycle unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrigin {
    /// Declared by a `CONECT` record.
    Conect,
    /// Inferred from covalent radii.
    #[default]
    Perceived,
}

#[derive(Debug, Error)]
#[error("Invalid bond origin string")]
pub struct ParseBondOriginError;

impl FromStr for BondOrigin {
    type Err = ParseBondOriginError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conect" | "explicit" => Ok(Self::Conect),
            "perceived" | "distance" => Ok(Self::Perceived),
            _ => Err(ParseBondOriginError),
        }
    }
}

impl fmt::Display for BondOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Conect => "Conect",
                Self::Perceived => "Perceived",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_id: AtomId,   // ID of the first atom
    pub atom2_id: AtomId,   // ID of the second atom
    pub origin: BondOrigin, // How the bond was established
}

impl Bond {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, origin: BondOrigin) -> Self {
        Self {
            atom1_id,
            atom2_id,
            origin,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// Returns the atom on the other side of the bond, if `atom_id` is part of it.
    pub fn partner(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn bond_origin_from_str_parses_valid_strings() {
        assert_eq!("conect".parse::<BondOrigin>().unwrap(), BondOrigin::Conect);
        assert_eq!("CONECT".parse::<BondOrigin>().unwrap(), BondOrigin::Conect);
        assert_eq!("explicit".parse::<BondOrigin>().unwrap(), BondOrigin::Conect);
        assert_eq!(
            "perceived".parse::<BondOrigin>().unwrap(),
            BondOrigin::Perceived
        );
        assert_eq!(
            "distance".parse::<BondOrigin>().unwrap(),
            BondOrigin::Perceived
        );
    }

    #[test]
    fn bond_origin_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrigin>().is_err());
        assert!("double".parse::<BondOrigin>().is_err());
    }

    #[test]
    fn bond_origin_display_and_default() {
        assert_eq!(BondOrigin::Conect.to_string(), "Conect");
        assert_eq!(BondOrigin::Perceived.to_string(), "Perceived");
        assert_eq!(BondOrigin::default(), BondOrigin::Perceived);
    }

    #[test]
    fn bond_contains_returns_true_for_both_atoms() {
        let a1 = dummy_atom_id(10);
        let a2 = dummy_atom_id(20);
        let bond = Bond::new(a1, a2, BondOrigin::Conect);
        assert!(bond.contains(a1));
        assert!(bond.contains(a2));
        assert!(!bond.contains(dummy_atom_id(30)));
    }

    #[test]
    fn bond_partner_returns_opposite_atom() {
        let a1 = dummy_atom_id(1);
        let a2 = dummy_atom_id(2);
        let bond = Bond::new(a1, a2, BondOrigin::Perceived);
        assert_eq!(bond.partner(a1), Some(a2));
        assert_eq!(bond.partner(a2), Some(a1));
        assert_eq!(bond.partner(dummy_atom_id(3)), None);
    }
}
