//! core::limits
//!
//! Resource bounds checked before and during lattice construction.
//!
//! Work whose size is known up front to exceed a bound (universe,
//! operation tables) is refused before it starts, and a growing lattice
//! is stopped as soon as it passes its bound, instead of exhausting memory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::ErrorKind;
use super::operation::OperationTable;

/// A size that went past its bound.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{what} {requested} exceeds the limit of {limit}")]
pub struct LimitError {
    pub what: &'static str,
    pub requested: usize,
    pub limit: usize,
}

impl LimitError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ResourceLimit
    }
}

/// Size bounds for one computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_universe_size: usize,
    pub max_table_size: usize,
    pub max_lattice_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_universe_size: 512,
            max_table_size: 1 << 24,
            max_lattice_size: 4096,
        }
    }
}

impl Limits {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        Self {
            max_universe_size: usize::MAX,
            max_table_size: usize::MAX,
            max_lattice_size: usize::MAX,
        }
    }

    pub fn check_universe(&self, size: usize) -> Result<(), LimitError> {
        exceeds("universe size", size, self.max_universe_size)
    }

    /// Check the universe size and every table.
    pub fn check_algebra(&self, size: usize, tables: &[OperationTable]) -> Result<(), LimitError> {
        self.check_universe(size)?;
        for table in tables {
            exceeds("operation table size", table.table_size(), self.max_table_size)?;
        }
        Ok(())
    }

    pub fn check_lattice_size(&self, size: usize) -> Result<(), LimitError> {
        exceeds("lattice size", size, self.max_lattice_size)
    }
}

fn exceeds(what: &'static str, requested: usize, limit: usize) -> Result<(), LimitError> {
    if requested > limit {
        return Err(LimitError {
            what,
            requested,
            limit,
        });
    }
    Ok(())
}
