//! # Core Module
//!
//! Fundamental building blocks for structure preparation: the molecular data model,
//! file I/O, geometry helpers, residue/atom name tables and force-field definitions.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds and systems
//! - **File I/O** ([`io`]) - Reading and writing PDB snapshots
//! - **Force Fields** ([`forcefield`]) - Recognized protein and ligand force fields
//! - **Utilities** ([`utils`]) - Geometry and residue/atom identifiers

pub mod forcefield;
pub mod io;
pub mod models;
pub mod utils;
