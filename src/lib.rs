//! conlat - Congruence lattices of finite algebras
//!
//! Given a finite universe `{0, ..., n-1}` and operation tables on it,
//! conlat computes the equivalence relations compatible with every
//! operation (congruences) and assembles them into the congruence lattice,
//! along with its atoms, coatoms, irreducibles, height and width.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`core`] - Domain types: Horner indexing, operation tables,
//!   partitions, algebras, lattices, resource limits, configuration
//! - [`engine`] - Algorithms: principal congruence generation, lattice
//!   assembly, progress and cancellation
//!
//! # Correctness Invariants
//!
//! 1. Partitions compare, hash and serialize by their canonical form
//! 2. Every computed congruence is the smallest one relating its seed pair
//! 3. A built lattice is closed under join and holds zero and one
//! 4. Cancelled or over-limit computations return no partial result
//!
//! # Example
//!
//! ```
//! use conlat::core::operation::OperationTable;
//! use conlat::engine::{CancelToken, CongruenceLatticeBuilder, NoProgress};
//!
//! let add = OperationTable::from_fn("+", 2, 6, |a| (a[0] + a[1]) % 6).unwrap();
//! let tables = [add];
//! let lattice = CongruenceLatticeBuilder::new(6, &tables)
//!     .unwrap()
//!     .build(&NoProgress, &CancelToken::new())
//!     .unwrap();
//! assert_eq!(lattice.len(), 4);
//! ```

pub mod core;
pub mod engine;
