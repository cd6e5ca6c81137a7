//! core
//!
//! Core domain types, schemas, and operations for conlat.
//!
//! # Modules
//!
//! - [`error`] - Error taxonomy shared by every module
//! - [`horner`] - Argument tuple to table offset encoding
//! - [`operation`] - Operation capability and dense operation tables
//! - [`partition`] - Partitions, their lattice operations and text forms
//! - [`algebra`] - A universe with validated operations
//! - [`graph`] - Order graph: covers, height, width
//! - [`lattice`] - The congruence lattice value
//! - [`limits`] - Resource bounds on universes, tables and lattices
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Validation happens at construction; invalid values are not representable
//! - Schemas are strict and self-describing
//! - Everything here is deterministic and free of I/O, except config loading

pub mod algebra;
pub mod config;
pub mod error;
pub mod graph;
pub mod horner;
pub mod lattice;
pub mod limits;
pub mod operation;
pub mod partition;
