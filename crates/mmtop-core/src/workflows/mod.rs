//! # Workflows Module
//!
//! High-level entry points that sequence the engine components into complete runs.
//!
//! - **Preparation Workflow** ([`prepare`]) - Extracts GROMACS snapshots, normalizes them,
//!   optionally builds alanine mutants and lists interface residues, then drives tleap to
//!   write the Amber topologies.

pub mod prepare;
