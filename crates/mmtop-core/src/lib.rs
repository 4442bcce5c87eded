//! # mmtop Core Library
//!
//! Preparation of Amber topologies from GROMACS simulations for MM-PBSA/MM-GBSA
//! binding free-energy calculations.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that the chemistry rules can be
//! tested without ever spawning an external program.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`), PDB I/O,
//!   geometry, residue name tables and the force-field allow-lists.
//!
//! - **[`engine`]: The Logic Core.** Residue normalization, alanine mutation, interface
//!   detection, the external tool runner, GROMACS invocation builders and the tleap
//!   script builder.
//!
//! - **[`workflows`]: The Public API.** The preparation pipeline that sequences extraction,
//!   normalization, mutation, interface detection and topology assembly.

pub mod core;
pub mod engine;
pub mod workflows;
