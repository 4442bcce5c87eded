//! Provides input/output functionality for molecular snapshots.
//!
//! Snapshots are exchanged with GROMACS and tleap as PDB files. Reading builds a
//! [`MolecularSystem`](crate::core::models::system::MolecularSystem) with its bond
//! adjacency index; writing emits the residues in their original order so that residue
//! indices stay stable across the pipeline.

pub mod pdb;
pub mod traits;
