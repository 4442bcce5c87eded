//! # Engine Module
//!
//! The logic layer of mmtop: everything between reading a raw GROMACS snapshot and
//! handing a cleaned structure to tleap.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Pipeline inputs, force-field selection and tool discovery
//! - **Error Handling** ([`error`]) - Engine-specific error types
//! - **Progress Monitoring** ([`progress`]) - Phase and task reporting for front ends
//! - **Structure Rules** ([`normalize`], [`mutation`], [`interface`]) - Pure functions over
//!   a [`MolecularSystem`](crate::core::models::system::MolecularSystem)
//! - **External Tools** ([`tools`], [`gromacs`], [`leap`]) - Invocation builders and the
//!   runner abstraction that executes them

pub mod config;
pub mod error;
pub mod gromacs;
pub mod interface;
pub mod leap;
pub mod mutation;
pub mod normalize;
pub mod progress;
pub mod tools;
