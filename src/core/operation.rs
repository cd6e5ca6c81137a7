//! core::operation
//!
//! Finitary operations and their dense table form.
//!
//! # Design
//!
//! [`Operation`] is the single capability the congruence engine consumes:
//! arity, domain size, and evaluation. Two implementations sit behind it:
//!
//! - [`OperationTable`] - a flat value array addressed by Horner offsets,
//!   evaluated in O(1)
//! - [`FnOperation`] - a function-backed operation, reducible to a table
//!   with [`OperationTable::tabulate`]
//!
//! Anything richer (symbolic terms, derived operations) is expected to be
//! turned into a table before it reaches the generator.
//!
//! # Example
//!
//! ```
//! use conlat::core::operation::{Operation, OperationTable};
//!
//! let xor = OperationTable::from_fn("xor", 2, 2, |args| args[0] ^ args[1]).unwrap();
//! assert_eq!(xor.value_at(&[1, 1]).unwrap(), 0);
//! assert!(xor.is_commutative());
//! assert!(xor.is_associative());
//! assert!(!xor.is_idempotent());
//! ```

use thiserror::Error;

use super::error::ErrorKind;
use super::horner::{self, HornerError};

/// Errors from building or evaluating operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("operation '{name}' expects {expected} arguments, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {value} at position {position} is outside [0, {size})")]
    ArgumentOutOfRange {
        position: usize,
        value: usize,
        size: usize,
    },

    #[error("table entry {index} has value {value} outside [0, {domain_size})")]
    ValueOutOfRange {
        index: usize,
        value: usize,
        domain_size: usize,
    },

    #[error("table for '{name}' has {actual} entries, expected {expected}")]
    WrongTableLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("operation domain must be non-empty")]
    EmptyDomain,

    #[error(transparent)]
    Horner(#[from] HornerError),
}

impl TableError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::Horner(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

/// The capability every operation exposes to the engine.
pub trait Operation {
    /// Number of arguments.
    fn arity(&self) -> usize;

    /// Size of the underlying set; results lie in `[0, domain_size)`.
    fn domain_size(&self) -> usize;

    /// Evaluate the operation.
    ///
    /// # Errors
    ///
    /// Fails if the argument count differs from the arity or an argument
    /// is out of range.
    fn value_at(&self, args: &[usize]) -> Result<usize, TableError>;
}

/// A finitary operation stored as a dense value table.
///
/// Entries are addressed by the Horner offset of the argument tuple. For a
/// uniform table every position ranges over `[0, domain_size)`; a mixed
/// radix table has one size per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTable {
    name: String,
    domain_size: usize,
    /// Per-position argument ranges.
    sizes: Vec<usize>,
    /// Horner weights derived from `sizes`.
    weights: Vec<usize>,
    values: Vec<usize>,
}

impl OperationTable {
    /// Build a uniform table from its values.
    ///
    /// # Errors
    ///
    /// Fails if the domain is empty, the table length is not
    /// `domain_size^arity`, or a value is outside the domain.
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        domain_size: usize,
        values: Vec<usize>,
    ) -> Result<Self, TableError> {
        Self::new_mixed(name, vec![domain_size; arity], domain_size, values)
    }

    /// Build a mixed radix table: position `i` ranges over `[0, sizes[i])`.
    pub fn new_mixed(
        name: impl Into<String>,
        sizes: Vec<usize>,
        domain_size: usize,
        values: Vec<usize>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        if domain_size == 0 {
            return Err(TableError::EmptyDomain);
        }
        let expected = horner::table_size_mixed(&sizes)?;
        if values.len() != expected {
            return Err(TableError::WrongTableLength {
                name,
                expected,
                actual: values.len(),
            });
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|&(_, &v)| v >= domain_size)
        {
            return Err(TableError::ValueOutOfRange {
                index,
                value,
                domain_size,
            });
        }
        let weights = horner::weights(&sizes)?;
        Ok(Self {
            name,
            domain_size,
            sizes,
            weights,
            values,
        })
    }

    /// Build a uniform table by evaluating `f` on every argument tuple.
    pub fn from_fn<F>(
        name: impl Into<String>,
        arity: usize,
        domain_size: usize,
        mut f: F,
    ) -> Result<Self, TableError>
    where
        F: FnMut(&[usize]) -> usize,
    {
        Self::try_from_fn(name, arity, domain_size, |args| Ok(f(args)))
    }

    /// Reduce any [`Operation`] to a dense table.
    pub fn tabulate(name: impl Into<String>, op: &dyn Operation) -> Result<Self, TableError> {
        Self::try_from_fn(name, op.arity(), op.domain_size(), |args| op.value_at(args))
    }

    /// A nullary operation naming a single element.
    pub fn constant(
        name: impl Into<String>,
        domain_size: usize,
        value: usize,
    ) -> Result<Self, TableError> {
        Self::new(name, 0, domain_size, vec![value])
    }

    fn try_from_fn<F>(
        name: impl Into<String>,
        arity: usize,
        domain_size: usize,
        mut f: F,
    ) -> Result<Self, TableError>
    where
        F: FnMut(&[usize]) -> Result<usize, TableError>,
    {
        if domain_size == 0 {
            return Err(TableError::EmptyDomain);
        }
        let size = horner::table_size(arity, domain_size)?;
        let mut values = Vec::with_capacity(size);
        let mut args = vec![0usize; arity];
        for _ in 0..size {
            values.push(f(&args)?);
            // Odometer increment, last position fastest.
            for slot in args.iter_mut().rev() {
                *slot += 1;
                if *slot < domain_size {
                    break;
                }
                *slot = 0;
            }
        }
        Self::new(name, arity, domain_size, values)
    }

    /// Name used in logs and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-position argument ranges.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Horner weight of each argument position.
    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    /// The raw value array, in Horner order.
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// Number of table entries.
    pub fn table_size(&self) -> usize {
        self.values.len()
    }

    /// True when every position ranges over the whole domain.
    pub fn is_uniform(&self) -> bool {
        self.sizes.iter().all(|&s| s == self.domain_size)
    }

    /// Value stored at a Horner offset.
    ///
    /// Returns `None` if the offset is outside the table.
    pub fn value_at_index(&self, index: usize) -> Option<usize> {
        self.values.get(index).copied()
    }

    fn diagonal(&self, x: usize) -> usize {
        let offset: usize = self.weights.iter().map(|w| w * x).sum();
        self.values[offset]
    }

    fn binary(&self, x: usize, y: usize) -> usize {
        self.values[x * self.domain_size + y]
    }

    /// `f(x, ..., x) == x` for every element.
    ///
    /// Nullary and mixed radix operations are never reported idempotent.
    pub fn is_idempotent(&self) -> bool {
        if self.sizes.is_empty() || !self.is_uniform() {
            return false;
        }
        (0..self.domain_size).all(|x| self.diagonal(x) == x)
    }

    /// `f(x, y) == f(y, x)`; binary uniform operations only.
    pub fn is_commutative(&self) -> bool {
        if self.arity() != 2 || !self.is_uniform() {
            return false;
        }
        let n = self.domain_size;
        (0..n).all(|x| (x + 1..n).all(|y| self.binary(x, y) == self.binary(y, x)))
    }

    /// `f(f(x, y), z) == f(x, f(y, z))`; binary uniform operations only.
    pub fn is_associative(&self) -> bool {
        if self.arity() != 2 || !self.is_uniform() {
            return false;
        }
        let n = self.domain_size;
        (0..n).all(|x| {
            (0..n).all(|y| {
                let xy = self.binary(x, y);
                (0..n).all(|z| self.binary(xy, z) == self.binary(x, self.binary(y, z)))
            })
        })
    }

    /// Tables are defined on every tuple by construction.
    pub fn is_total(&self) -> bool {
        true
    }
}

impl Operation for OperationTable {
    fn arity(&self) -> usize {
        self.sizes.len()
    }

    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn value_at(&self, args: &[usize]) -> Result<usize, TableError> {
        if args.len() != self.sizes.len() {
            return Err(TableError::ArityMismatch {
                name: self.name.clone(),
                expected: self.sizes.len(),
                actual: args.len(),
            });
        }
        let mut offset = 0;
        for (position, ((&value, &size), &weight)) in
            args.iter().zip(&self.sizes).zip(&self.weights).enumerate()
        {
            if value >= size {
                return Err(TableError::ArgumentOutOfRange {
                    position,
                    value,
                    size,
                });
            }
            offset += value * weight;
        }
        Ok(self.values[offset])
    }
}

/// An operation backed by a function.
///
/// Arguments are range-checked before the function runs and results are
/// checked against the domain afterwards.
pub struct FnOperation<F> {
    arity: usize,
    domain_size: usize,
    f: F,
}

impl<F> FnOperation<F>
where
    F: Fn(&[usize]) -> usize,
{
    /// Wrap `f` as an operation of the given arity over `domain_size` elements.
    pub fn new(arity: usize, domain_size: usize, f: F) -> Self {
        Self {
            arity,
            domain_size,
            f,
        }
    }
}

impl<F> std::fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperation")
            .field("arity", &self.arity)
            .field("domain_size", &self.domain_size)
            .finish_non_exhaustive()
    }
}

impl<F> Operation for FnOperation<F>
where
    F: Fn(&[usize]) -> usize,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn value_at(&self, args: &[usize]) -> Result<usize, TableError> {
        if args.len() != self.arity {
            return Err(TableError::ArityMismatch {
                name: "<fn>".to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        if let Some((position, &value)) =
            args.iter().enumerate().find(|&(_, &v)| v >= self.domain_size)
        {
            return Err(TableError::ArgumentOutOfRange {
                position,
                value,
                size: self.domain_size,
            });
        }
        let value = (self.f)(args);
        if value >= self.domain_size {
            return Err(TableError::ValueOutOfRange {
                index: horner::encode(args, self.domain_size)?,
                value,
                domain_size: self.domain_size,
            });
        }
        Ok(value)
    }
}
