//! engine
//!
//! Algorithms that compute congruences: principal congruence generation
//! and congruence lattice assembly.
//!
//! # Architecture
//!
//! Data flows upward and control flows downward:
//!
//! ```text
//! caller --progress/cancel--> CongruenceLatticeBuilder
//!                                 |  Cg(a, b) for every pair
//!                                 v
//!                          CongruenceGenerator --> Partition
//!                                 |  table lookups
//!                                 v
//!                          OperationTable (Horner weights)
//! ```
//!
//! # Invariants
//!
//! - Every algorithm is single-threaded and deterministic
//! - Cancellation is cooperative and never yields a partial result
//! - Resource limits are checked before any work starts
//!
//! # Example
//!
//! ```
//! use conlat::core::operation::OperationTable;
//! use conlat::engine::{build_lattice, CancelToken, NoProgress};
//!
//! let xor = OperationTable::from_fn("xor", 2, 2, |a| a[0] ^ a[1]).unwrap();
//! let lattice = build_lattice(2, &[xor], &NoProgress, &CancelToken::new()).unwrap();
//! assert!(lattice.is_simple());
//! ```

pub mod builder;
pub mod generator;
pub mod progress;

pub use builder::{BuildReport, CongruenceLatticeBuilder};
pub use generator::{CongruenceGenerator, GeneratorState};
pub use crate::core::limits::Limits;
pub use progress::{
    CancelToken, FnProgress, LogProgress, NoProgress, ProgressReporter, SyncProgress,
};

use thiserror::Error;

use crate::core::algebra::AlgebraError;
use crate::core::error::ErrorKind;
use crate::core::horner::HornerError;
use crate::core::config::Config;
use crate::core::lattice::{CongruenceLattice, LatticeError, LatticeSummary};
use crate::core::limits::LimitError;
use crate::core::operation::{OperationTable, TableError};
use crate::core::partition::PartitionError;

/// Errors from engine computations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Horner(#[from] HornerError),

    #[error(transparent)]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error("computation cancelled")]
    Cancelled,

    #[error("{what} {requested} exceeds the limit of {limit}")]
    ResourceLimit {
        what: String,
        requested: usize,
        limit: usize,
    },
}

impl From<LimitError> for EngineError {
    fn from(err: LimitError) -> Self {
        EngineError::ResourceLimit {
            what: err.what.to_string(),
            requested: err.requested,
            limit: err.limit,
        }
    }
}

impl EngineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Partition(e) => e.kind(),
            EngineError::Table(e) => e.kind(),
            EngineError::Horner(e) => e.kind(),
            EngineError::Algebra(e) => e.kind(),
            EngineError::Lattice(e) => e.kind(),
            EngineError::Cancelled => ErrorKind::Cancellation,
            EngineError::ResourceLimit { .. } => ErrorKind::ResourceLimit,
        }
    }
}

/// Build the congruence lattice of `tables` on `size` elements with
/// default limits.
pub fn build_lattice(
    size: usize,
    tables: &[OperationTable],
    progress: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<CongruenceLattice, EngineError> {
    CongruenceLatticeBuilder::new(size, tables)?.build(progress, cancel)
}

/// Build under a loaded [`Config`] and summarize the result.
///
/// The config supplies the limits, whether progress goes to the log, and
/// the print type of the summary.
pub fn summarize_lattice(
    config: &Config,
    size: usize,
    tables: &[OperationTable],
    cancel: &CancelToken,
) -> Result<LatticeSummary, EngineError> {
    let progress: &dyn ProgressReporter = if config.log_progress() {
        &LogProgress
    } else {
        &NoProgress
    };
    let lattice = CongruenceLatticeBuilder::new(size, tables)?
        .with_limits(config.limits())
        .build(progress, cancel)?;
    Ok(lattice.summary(config.print_type()))
}
