//! core::algebra
//!
//! A finite algebra: a universe `{0, ..., n-1}` plus uniform operation
//! tables over it.
//!
//! Reading algebras from files is not handled here; callers build the
//! tables and hand them over.

use thiserror::Error;

use super::error::ErrorKind;
use super::operation::{Operation, OperationTable};

/// Errors from assembling an algebra.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlgebraError {
    #[error("algebra universe must be non-empty")]
    EmptyUniverse,

    #[error("operation '{name}' is defined on {actual} elements, algebra has {expected}")]
    DomainMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("operation '{0}' has a mixed radix table")]
    NotUniform(String),
}

impl AlgebraError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Check that every table is a uniform operation on `size` elements.
pub fn check_tables(size: usize, tables: &[OperationTable]) -> Result<(), AlgebraError> {
    if size == 0 {
        return Err(AlgebraError::EmptyUniverse);
    }
    for table in tables {
        if table.domain_size() != size {
            return Err(AlgebraError::DomainMismatch {
                name: table.name().to_string(),
                expected: size,
                actual: table.domain_size(),
            });
        }
        if !table.is_uniform() {
            return Err(AlgebraError::NotUniform(table.name().to_string()));
        }
    }
    Ok(())
}

/// A finite algebra with validated operations.
///
/// # Example
///
/// ```
/// use conlat::core::algebra::Algebra;
/// use conlat::core::operation::OperationTable;
///
/// let xor = OperationTable::from_fn("xor", 2, 2, |a| a[0] ^ a[1]).unwrap();
/// let z2 = Algebra::new("Z2", 2, vec![xor]).unwrap();
/// assert_eq!(z2.similarity_type(), vec![("xor".to_string(), 2)]);
/// ```
#[derive(Debug, Clone)]
pub struct Algebra {
    name: String,
    size: usize,
    operations: Vec<OperationTable>,
}

impl Algebra {
    /// Assemble an algebra, validating every operation against `size`.
    pub fn new(
        name: impl Into<String>,
        size: usize,
        operations: Vec<OperationTable>,
    ) -> Result<Self, AlgebraError> {
        check_tables(size, &operations)?;
        Ok(Self {
            name: name.into(),
            size,
            operations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cardinality of the universe.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn operations(&self) -> &[OperationTable] {
        &self.operations
    }

    /// `(name, arity)` for each operation, in order.
    pub fn similarity_type(&self) -> Vec<(String, usize)> {
        self.operations
            .iter()
            .map(|op| (op.name().to_string(), op.arity()))
            .collect()
    }

    /// Largest operation table in the algebra.
    pub fn max_table_size(&self) -> usize {
        self.operations
            .iter()
            .map(OperationTable::table_size)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_universe() {
        assert_eq!(
            Algebra::new("empty", 0, vec![]).unwrap_err(),
            AlgebraError::EmptyUniverse
        );
    }

    #[test]
    fn rejects_domain_mismatch() {
        let op = OperationTable::from_fn("id", 1, 3, |a| a[0]).unwrap();
        let err = Algebra::new("a", 4, vec![op]).unwrap_err();
        assert!(matches!(
            err,
            AlgebraError::DomainMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn rejects_mixed_radix() {
        let op = OperationTable::new_mixed("m", vec![2, 3], 3, vec![0; 6]).unwrap();
        assert_eq!(
            Algebra::new("a", 3, vec![op]).unwrap_err(),
            AlgebraError::NotUniform("m".to_string())
        );
    }

    #[test]
    fn reports_table_sizes() {
        let unary = OperationTable::from_fn("s", 1, 3, |a| (a[0] + 1) % 3).unwrap();
        let binary = OperationTable::from_fn("m", 2, 3, |a| a[0].min(a[1])).unwrap();
        let alg = Algebra::new("a", 3, vec![unary, binary]).unwrap();
        assert_eq!(alg.max_table_size(), 9);
        assert_eq!(alg.size(), 3);
        assert_eq!(alg.name(), "a");
        assert_eq!(alg.operations().len(), 2);
    }
}
