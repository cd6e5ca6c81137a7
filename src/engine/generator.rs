//! engine::generator
//!
//! Principal congruence generation: `Cg(a, b)`, the smallest congruence of
//! an algebra relating `a` and `b`.
//!
//! # Algorithm
//!
//! Start from the zero partition with `a` and `b` merged and a worklist
//! holding the pair `(a, b)`. For each pair `(x, y)` taken from the
//! worklist, every operation `f`, every argument position `p` and every
//! assignment of the other positions gives two table lookups: `f(.., x, ..)`
//! and `f(.., y, ..)` with `x` or `y` at position `p`. If the results are in
//! different blocks, merge them and push the pair. When the worklist is
//! empty the partition is compatible with every operation.
//!
//! Table offsets are computed incrementally from the Horner weights, so
//! the inner loop does no index encoding.
//!
//! # Cost
//!
//! One dequeued pair costs `O(arity * domain_size^(arity - 1))` lookups per
//! table. At most `n - 1` merges succeed, so at most `n - 1` pairs are ever
//! queued. `a == b` finishes in `Init` without touching the tables.
//!
//! # Cancellation
//!
//! The cancel token is polled at the top of every worklist iteration. A
//! cancelled run discards its partial partition.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::progress::CancelToken;
use super::EngineError;
use crate::core::algebra::{check_tables, Algebra};
use crate::core::operation::OperationTable;
use crate::core::partition::{Partition, PartitionError};

/// Phase of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Init,
    Closing,
    Done,
    Cancelled,
}

/// Computes principal congruences over a fixed set of operation tables.
///
/// # Example
///
/// ```
/// use conlat::core::operation::OperationTable;
/// use conlat::engine::generator::CongruenceGenerator;
/// use conlat::engine::progress::CancelToken;
///
/// // x + 1 mod 4
/// let succ = OperationTable::from_fn("s", 1, 4, |a| (a[0] + 1) % 4).unwrap();
/// let tables = [succ];
/// let generator = CongruenceGenerator::new(4, &tables).unwrap();
///
/// let cg = generator.generate(0, 2, &CancelToken::new()).unwrap();
/// assert_eq!(cg.to_string(), "|0,2|1,3|");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CongruenceGenerator<'a> {
    size: usize,
    tables: &'a [OperationTable],
}

/// Mutable state of a single run.
struct Run {
    state: GeneratorState,
    partition: Partition,
    queue: VecDeque<(usize, usize)>,
    blocks: usize,
    pairs: usize,
}

impl Run {
    fn merge(&mut self, u: usize, v: usize) {
        if self.partition.union(u, v) {
            self.blocks -= 1;
            self.queue.push_back((u, v));
        }
    }
}

impl<'a> CongruenceGenerator<'a> {
    /// Create a generator for an algebra of `size` elements.
    ///
    /// # Errors
    ///
    /// Fails if `size == 0` or any table is not a uniform operation on
    /// `size` elements.
    pub fn new(size: usize, tables: &'a [OperationTable]) -> Result<Self, EngineError> {
        check_tables(size, tables)?;
        Ok(Self { size, tables })
    }

    /// Create a generator for an already validated algebra.
    pub fn for_algebra(algebra: &'a Algebra) -> Self {
        Self {
            size: algebra.size(),
            tables: algebra.operations(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tables(&self) -> &'a [OperationTable] {
        self.tables
    }

    /// Compute `Cg(a, b)`, normalized.
    ///
    /// `a == b` gives the zero partition immediately, even if `cancel`
    /// has already fired.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Partition`] if `a` or `b` is outside the universe
    /// - [`EngineError::Cancelled`] if `cancel` fires before closure ends
    pub fn generate(
        &self,
        a: usize,
        b: usize,
        cancel: &CancelToken,
    ) -> Result<Partition, EngineError> {
        for x in [a, b] {
            if x >= self.size {
                return Err(PartitionError::OutOfRange {
                    index: x,
                    size: self.size,
                }
                .into());
            }
        }

        if a == b {
            trace!(a, "trivial principal congruence");
            return Ok(Partition::zero(self.size)?);
        }

        let mut run = Run {
            state: GeneratorState::Init,
            partition: Partition::zero(self.size)?,
            queue: VecDeque::new(),
            blocks: self.size,
            pairs: 0,
        };
        run.merge(a, b);
        run.state = GeneratorState::Closing;
        trace!(a, b, "closing principal congruence");

        while run.state == GeneratorState::Closing {
            if cancel.is_cancelled() {
                run.state = GeneratorState::Cancelled;
                break;
            }
            let Some((x, y)) = run.queue.pop_front() else {
                run.state = GeneratorState::Done;
                break;
            };
            run.pairs += 1;
            for table in self.tables {
                self.close_pair(table, x, y, &mut run);
            }
            if run.blocks == 1 {
                // Nothing left to merge.
                run.queue.clear();
            }
        }

        if run.state == GeneratorState::Cancelled {
            debug!(a, b, pairs = run.pairs, "principal congruence cancelled");
            return Err(EngineError::Cancelled);
        }

        let mut partition = run.partition;
        partition.normalize();
        trace!(a, b, pairs = run.pairs, blocks = run.blocks, "principal congruence done");
        Ok(partition)
    }

    /// Apply one table to the pair `(x, y)` at every argument position.
    fn close_pair(&self, table: &OperationTable, x: usize, y: usize, run: &mut Run) {
        let weights = table.weights();
        let values = table.values();
        let arity = weights.len();
        let mut digits = vec![0usize; arity];

        for p in 0..arity {
            let (wx, wy) = (x * weights[p], y * weights[p]);
            digits.fill(0);
            let mut base = 0usize;
            loop {
                run.merge(values[base + wx], values[base + wy]);
                if !advance(&mut digits, weights, p, self.size, &mut base) {
                    break;
                }
            }
        }
    }
}

/// Step the odometer over every position except `skip`, keeping `base`
/// equal to the table offset of `digits`. Returns `false` after the last
/// assignment.
fn advance(
    digits: &mut [usize],
    weights: &[usize],
    skip: usize,
    n: usize,
    base: &mut usize,
) -> bool {
    for i in (0..digits.len()).rev() {
        if i == skip {
            continue;
        }
        digits[i] += 1;
        *base += weights[i];
        if digits[i] < n {
            return true;
        }
        *base -= weights[i] * n;
        digits[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn cg(tables: &[OperationTable], n: usize, a: usize, b: usize) -> Partition {
        CongruenceGenerator::new(n, tables)
            .unwrap()
            .generate(a, b, &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn equal_arguments_give_zero() {
        let succ = OperationTable::from_fn("s", 1, 3, |a| (a[0] + 1) % 3).unwrap();
        assert!(cg(&[succ], 3, 1, 1).is_zero());
    }

    #[test]
    fn no_operations_merges_only_the_pair() {
        let p = cg(&[], 4, 3, 1);
        assert_eq!(p.to_string(), "|0|1,3|2|");
        assert!(p.is_initial_lex_representative());
    }

    #[test]
    fn xor_on_two_elements() {
        let xor = OperationTable::from_fn("xor", 2, 2, |a| a[0] ^ a[1]).unwrap();
        assert!(cg(&[xor], 2, 0, 1).is_one());
    }

    #[test]
    fn cyclic_group_mod_four() {
        let add = OperationTable::from_fn("+", 2, 4, |a| (a[0] + a[1]) % 4).unwrap();
        let tables = [add];
        assert_eq!(cg(&tables, 4, 0, 2).to_string(), "|0,2|1,3|");
        assert!(cg(&tables, 4, 0, 1).is_one());
        assert!(cg(&tables, 4, 1, 2).is_one());
    }

    #[test]
    fn semilattice_chain() {
        // max on 0 < 1 < 2: Cg(1, 2) collapses only the top.
        let max = OperationTable::from_fn("max", 2, 3, |a| a[0].max(a[1])).unwrap();
        let tables = [max];
        assert_eq!(cg(&tables, 3, 1, 2).to_string(), "|0|1,2|");
        assert_eq!(cg(&tables, 3, 0, 1).to_string(), "|0,1|2|");
    }

    #[test]
    fn ternary_operation_uses_every_position() {
        // Majority on {0, 1, 2}, with 2 acting as a sink for disagreement.
        let maj = OperationTable::from_fn("maj", 3, 3, |a| {
            if a[0] == a[1] || a[0] == a[2] {
                a[0]
            } else if a[1] == a[2] {
                a[1]
            } else {
                2
            }
        })
        .unwrap();
        let p = cg(&[maj], 3, 0, 1);
        // maj(0, 1, 2) = 2 vs maj(1, 1, 2) = 1 forces 1 ~ 2.
        assert!(p.is_one());
    }

    #[test]
    fn result_is_compatible() {
        let f = OperationTable::from_fn("f", 2, 5, |a| (a[0] * 2 + a[1]) % 5).unwrap();
        let tables = [f];
        let p = cg(&tables, 5, 0, 3);
        let table = &tables[0];
        for x in 0..5 {
            for y in 0..5 {
                if !p.is_related(x, y) {
                    continue;
                }
                for z in 0..5 {
                    let left = |u: usize| table.value_at_index(u * 5 + z).unwrap();
                    let right = |u: usize| table.value_at_index(z * 5 + u).unwrap();
                    assert!(p.is_related(left(x), left(y)));
                    assert!(p.is_related(right(x), right(y)));
                }
            }
        }
    }

    #[test]
    fn constant_operation_adds_nothing() {
        let c = OperationTable::constant("c", 3, 0).unwrap();
        assert_eq!(cg(&[c], 3, 1, 2).to_string(), "|0|1,2|");
    }

    #[test]
    fn out_of_range_rejected() {
        let generator = CongruenceGenerator::new(3, &[]).unwrap();
        let err = generator.generate(0, 3, &CancelToken::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Partition(PartitionError::OutOfRange { index: 3, size: 3 })
        ));
    }

    #[test]
    fn domain_mismatch_rejected() {
        let op = OperationTable::from_fn("id", 1, 2, |a| a[0]).unwrap();
        let tables = [op];
        assert!(matches!(
            CongruenceGenerator::new(3, &tables),
            Err(EngineError::Algebra(_))
        ));
    }

    #[test]
    fn cancelled_before_start() {
        let succ = OperationTable::from_fn("s", 1, 8, |a| (a[0] + 1) % 8).unwrap();
        let tables = [succ];
        let generator = CongruenceGenerator::new(8, &tables).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            generator.generate(0, 1, &cancel),
            Err(EngineError::Cancelled)
        ));
    }

    #[test]
    fn equal_arguments_ignore_cancellation() {
        let generator = CongruenceGenerator::new(3, &[]).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            generator.generate(1, 1, &cancel).unwrap(),
            Partition::zero(3).unwrap()
        );
    }

    #[test]
    fn cancelled_mid_closure_is_all_or_nothing() {
        // x - 1 clamped at 0 on a long chain: Cg(n-2, n-1) walks down one
        // merge per dequeued pair, giving a wide window to cancel in.
        let n = 400;
        let pred = OperationTable::from_fn("p", 1, n, |a| a[0].saturating_sub(1)).unwrap();
        let tables = [pred];
        let generator = CongruenceGenerator::new(n, &tables).unwrap();
        let expected = generator.generate(n - 2, n - 1, &CancelToken::new()).unwrap();
        assert!(expected.is_one());

        for delay in [0u64, 10, 50, 200] {
            let cancel = CancelToken::new();
            let handle = cancel.clone();
            let canceller = thread::spawn(move || {
                thread::sleep(Duration::from_micros(delay));
                handle.cancel();
            });
            match generator.generate(n - 2, n - 1, &cancel) {
                Ok(p) => assert_eq!(p, expected),
                Err(err) => assert!(matches!(err, EngineError::Cancelled)),
            }
            canceller.join().unwrap();
        }
    }

    #[test]
    fn advance_skips_fixed_position() {
        // Arity 3 over 2 elements, position 1 fixed: offsets 0, 1, 4, 5.
        let weights = [4, 2, 1];
        let mut digits = [0; 3];
        let mut base = 0;
        let mut seen = vec![base];
        while advance(&mut digits, &weights, 1, 2, &mut base) {
            seen.push(base);
        }
        assert_eq!(seen, vec![0, 1, 4, 5]);
    }
}
