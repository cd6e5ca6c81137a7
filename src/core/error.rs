//! core::error
//!
//! Error taxonomy shared by every module.
//!
//! Each module keeps its own error enum; `kind()` on those enums maps
//! every variant onto one of the four categories below so callers can
//! react to a class of failure without matching individual variants.

use serde::Serialize;

/// Category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: empty or inconsistent arrays, unparseable strings,
    /// argument-count or domain mismatches, out-of-range indices.
    Validation,
    /// A structurally valid request that the operation cannot honour,
    /// such as joining a block with itself or comparing partitions of
    /// different universes.
    Operation,
    /// The caller asked the computation to stop.
    Cancellation,
    /// The request exceeds a configured or representable size bound.
    ResourceLimit,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Operation => "operation",
            ErrorKind::Cancellation => "cancellation",
            ErrorKind::ResourceLimit => "resource limit",
        };
        f.write_str(name)
    }
}
