//! # Core Models Module
//!
//! Data structures used to represent a prepared snapshot: atoms, residues, chains and
//! their bond connectivity.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom with coordinates and element information
//! - [`residue`] - Residue with its sequence number, chain and ordered atoms
//! - [`chain`] - Chain identifier and its residues
//! - [`system`] - Complete molecular system with ordered residues and a bond adjacency index
//! - [`topology`] - Bond connectivity
//! - [`ids`] - Stable identifier types for atoms, residues and chains
//!
//! ## Usage
//!
//! ```ignore
//! use mmtop::core::models::{system::MolecularSystem, atom::Atom};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A');
//! let residue_id = system.add_residue(chain_id, 1, "ALA").unwrap();
//!
//! let atom = Atom::new("CA", residue_id, Point3::new(0.0, 0.0, 0.0));
//! system.add_atom_to_residue(residue_id, atom).unwrap();
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
pub mod topology;
