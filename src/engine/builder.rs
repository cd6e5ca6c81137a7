//! engine::builder
//!
//! Assembles the full congruence lattice of a finite algebra.
//!
//! # Phases
//!
//! 1. **Generate**: `Cg(i, j)` for every pair `i < j`, deduplicated by
//!    normalized equality. Results are cached per builder.
//! 2. **Join-close**: join elements with the distinct principal congruences
//!    until a pass adds nothing. Each pass only revisits elements added by
//!    the previous one; every congruence is a join of principals, so this
//!    reaches the same set as closing under all pairwise joins.
//! 3. **Order and derive**: build the refinement order and everything
//!    derived from it (see [`CongruenceLattice`]).
//!
//! # Progress
//!
//! Generation covers the first half of the fraction range, join closure
//! the next 40% (one checkpoint per pass, with the pass count bounded by
//! the universe size), ordering the rest. Cancellation is polled at the
//! same checkpoints and inside every generator run.
//!
//! # Example
//!
//! ```
//! use conlat::core::operation::OperationTable;
//! use conlat::engine::builder::CongruenceLatticeBuilder;
//! use conlat::engine::progress::{CancelToken, NoProgress};
//!
//! let add = OperationTable::from_fn("+", 2, 4, |a| (a[0] + a[1]) % 4).unwrap();
//! let tables = [add];
//! let mut builder = CongruenceLatticeBuilder::new(4, &tables).unwrap();
//! let lattice = builder.build(&NoProgress, &CancelToken::new()).unwrap();
//!
//! // Z4 has the chain 0 < {0,2}{1,3} < 1.
//! assert_eq!(lattice.len(), 3);
//! assert_eq!(lattice.height(), 2);
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::generator::CongruenceGenerator;
use super::progress::{CancelToken, ProgressReporter};
use super::EngineError;
use crate::core::algebra::Algebra;
use crate::core::lattice::CongruenceLattice;
use crate::core::limits::Limits;
use crate::core::operation::OperationTable;
use crate::core::partition::Partition;

const GENERATE_SHARE: f64 = 0.5;
const CLOSE_SHARE: f64 = 0.4;

/// Statistics of one completed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub universe_size: usize,
    pub operations: usize,
    /// Generator runs actually performed.
    pub principal_computations: usize,
    /// Pairs answered from the cache.
    pub cache_hits: usize,
    pub join_passes: usize,
    pub lattice_size: usize,
}

impl BuildReport {
    /// Wall-clock duration of the build.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Builds congruence lattices, caching principal congruences across calls.
#[derive(Debug)]
pub struct CongruenceLatticeBuilder<'a> {
    generator: CongruenceGenerator<'a>,
    limits: Limits,
    cache: HashMap<(usize, usize), Partition>,
    computations: usize,
    cache_hits: usize,
    report: Option<BuildReport>,
}

impl<'a> CongruenceLatticeBuilder<'a> {
    /// Create a builder with default limits.
    ///
    /// # Errors
    ///
    /// Fails if the tables do not form a uniform algebra on `size` elements.
    pub fn new(size: usize, tables: &'a [OperationTable]) -> Result<Self, EngineError> {
        Ok(Self::with_generator(CongruenceGenerator::new(size, tables)?))
    }

    pub fn for_algebra(algebra: &'a Algebra) -> Self {
        Self::with_generator(CongruenceGenerator::for_algebra(algebra))
    }

    fn with_generator(generator: CongruenceGenerator<'a>) -> Self {
        Self {
            generator,
            limits: Limits::default(),
            cache: HashMap::new(),
            computations: 0,
            cache_hits: 0,
            report: None,
        }
    }

    /// Replace the resource limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of cached principal congruences.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Report of the last successful [`build`](Self::build).
    pub fn last_report(&self) -> Option<&BuildReport> {
        self.report.as_ref()
    }

    /// `Cg(a, b)`, from the cache when possible.
    ///
    /// `Cg(a, b) == Cg(b, a)`, so both orders share one cache entry.
    pub fn principal_congruence(
        &mut self,
        a: usize,
        b: usize,
        cancel: &CancelToken,
    ) -> Result<Partition, EngineError> {
        let key = (a.min(b), a.max(b));
        if let Some(cached) = self.cache.get(&key) {
            self.cache_hits += 1;
            return Ok(cached.clone());
        }
        let partition = self.generator.generate(key.0, key.1, cancel)?;
        self.computations += 1;
        if key.0 != key.1 {
            self.cache.insert(key, partition.clone());
        }
        Ok(partition)
    }

    /// Build the congruence lattice.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ResourceLimit`] if the algebra or the growing
    ///   lattice exceeds the configured limits
    /// - [`EngineError::Cancelled`] if `cancel` fires; nothing partial is
    ///   returned
    pub fn build(
        &mut self,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<CongruenceLattice, EngineError> {
        let started_at = Utc::now();
        let n = self.generator.size();
        let tables = self.generator.tables();
        self.limits.check_algebra(n, tables)?;
        let (computations_before, hits_before) = (self.computations, self.cache_hits);

        info!(size = n, operations = tables.len(), "building congruence lattice");

        let mut elements: Vec<Partition> = vec![Partition::zero(n)?];
        let mut seen: HashSet<Partition> = elements.iter().cloned().collect();
        let mut principals = Vec::new();
        let mut generators: Vec<usize> = Vec::new();

        // Phase 1: principal congruences.
        let total_pairs = n * (n - 1) / 2;
        let mut done = 0usize;
        for a in 0..n {
            for b in (a + 1)..n {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                let cg = self.principal_congruence(a, b, cancel)?;
                debug!(a, b, congruence = %cg, "principal congruence");
                if seen.insert(cg.clone()) {
                    self.limits.check_lattice_size(elements.len() + 1)?;
                    generators.push(elements.len());
                    elements.push(cg.clone());
                }
                principals.push(((a, b), cg));

                done += 1;
                progress.report(
                    GENERATE_SHARE * done as f64 / total_pairs as f64,
                    "computing principal congruences",
                );
            }
        }
        info!(
            principals = generators.len(),
            "principal congruences computed"
        );

        // Phase 2: join closure.
        let mut frontier: Vec<usize> = (0..elements.len()).collect();
        let mut passes = 0usize;
        while !frontier.is_empty() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            passes += 1;
            let mut added = Vec::new();
            for &x in &frontier {
                for &g in &generators {
                    let joined = elements[x].join(&elements[g])?;
                    if seen.insert(joined.clone()) {
                        self.limits.check_lattice_size(elements.len() + 1)?;
                        added.push(elements.len());
                        elements.push(joined);
                    }
                }
            }
            debug!(pass = passes, added = added.len(), size = elements.len(), "join pass");
            frontier = added;

            let estimate = passes.min(n) as f64 / n as f64;
            progress.report(
                GENERATE_SHARE + CLOSE_SHARE * estimate,
                "closing under join",
            );
        }

        // Phase 3: order and derive.
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let size = elements.len();
        let lattice = CongruenceLattice::assemble(n, elements, principals)?;
        progress.report(1.0, "congruence lattice complete");

        let report = BuildReport {
            started_at,
            finished_at: Utc::now(),
            universe_size: n,
            operations: tables.len(),
            principal_computations: self.computations - computations_before,
            cache_hits: self.cache_hits - hits_before,
            join_passes: passes,
            lattice_size: size,
        };
        info!(
            size,
            height = lattice.height(),
            width = lattice.width(),
            passes,
            "congruence lattice built"
        );
        self.report = Some(report);
        Ok(lattice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::engine::progress::{FnProgress, NoProgress};
    use std::sync::Mutex;

    fn build(n: usize, tables: &[OperationTable]) -> CongruenceLattice {
        CongruenceLatticeBuilder::new(n, tables)
            .unwrap()
            .build(&NoProgress, &CancelToken::new())
            .unwrap()
    }

    mod lattices {
        use super::*;

        #[test]
        fn no_operations_gives_partition_lattice() {
            // Bell numbers: 1, 2, 5, 15.
            assert_eq!(build(1, &[]).len(), 1);
            assert_eq!(build(2, &[]).len(), 2);
            assert_eq!(build(3, &[]).len(), 5);
            let pi4 = build(4, &[]);
            assert_eq!(pi4.len(), 15);
            assert_eq!(pi4.atom_indices().len(), 6);
            assert_eq!(pi4.coatom_indices().len(), 7);
            assert_eq!(pi4.height(), 3);
            assert!(!pi4.is_modular());
        }

        #[test]
        fn xor_is_simple() {
            let xor = OperationTable::from_fn("xor", 2, 2, |a| a[0] ^ a[1]).unwrap();
            let lattice = build(2, &[xor]);
            assert!(lattice.is_simple());
            assert!(lattice.principal(0, 1).unwrap().is_one());
        }

        #[test]
        fn cyclic_group_of_order_six() {
            let add = OperationTable::from_fn("+", 2, 6, |a| (a[0] + a[1]) % 6).unwrap();
            let lattice = build(6, &[add]);
            // Subgroups of Z6: 1, 2Z6, 3Z6, Z6.
            assert_eq!(lattice.len(), 4);
            assert_eq!(lattice.atom_indices().len(), 2);
            assert_eq!(lattice.height(), 2);
            assert_eq!(lattice.width(), 2);
            assert!(lattice.is_distributive());
        }

        #[test]
        fn chain_semilattice() {
            // max on 0 < 1 < 2 < 3: congruences are the interval partitions.
            let max = OperationTable::from_fn("max", 2, 4, |a| a[0].max(a[1])).unwrap();
            let lattice = build(4, &[max]);
            assert_eq!(lattice.len(), 8);
            assert!(lattice.is_distributive());
            assert_eq!(lattice.join_irreducible_indices().len(), 3);
        }

        #[test]
        fn built_lattice_is_join_closed() {
            let f = OperationTable::from_fn("f", 1, 5, |a| (a[0] * 2) % 5).unwrap();
            let lattice = build(5, &[f]);
            for x in lattice.elements() {
                for y in lattice.elements() {
                    assert!(lattice.contains(&x.join(y).unwrap()));
                }
            }
        }

        #[test]
        fn for_algebra_matches_tables() {
            let s = OperationTable::from_fn("s", 1, 4, |a| (a[0] + 1) % 4).unwrap();
            let algebra = Algebra::new("C4", 4, vec![s.clone()]).unwrap();
            let from_algebra = CongruenceLatticeBuilder::for_algebra(&algebra)
                .build(&NoProgress, &CancelToken::new())
                .unwrap();
            assert_eq!(from_algebra.fingerprint(), build(4, &[s]).fingerprint());
        }
    }

    mod cache {
        use super::*;

        #[test]
        fn symmetric_pairs_share_an_entry() {
            let tables = [OperationTable::from_fn("s", 1, 4, |a| (a[0] + 1) % 4).unwrap()];
            let mut builder = CongruenceLatticeBuilder::new(4, &tables).unwrap();
            let cancel = CancelToken::new();
            let ab = builder.principal_congruence(0, 2, &cancel).unwrap();
            let ba = builder.principal_congruence(2, 0, &cancel).unwrap();
            assert_eq!(ab, ba);
            assert_eq!(builder.cached(), 1);
        }

        #[test]
        fn second_build_hits_cache() {
            let mut builder = CongruenceLatticeBuilder::new(3, &[]).unwrap();
            let cancel = CancelToken::new();
            builder.build(&NoProgress, &cancel).unwrap();
            let first = builder.last_report().unwrap().clone();
            assert_eq!(first.principal_computations, 3);
            assert_eq!(first.cache_hits, 0);
            assert_eq!(first.lattice_size, 5);
            assert!(first.duration() >= chrono::Duration::zero());

            builder.build(&NoProgress, &cancel).unwrap();
            let second = builder.last_report().unwrap();
            assert_eq!(second.principal_computations, 0);
            assert_eq!(second.cache_hits, 3);
        }

        #[test]
        fn cancelled_build_caches_only_finished_principals() {
            let tables = [OperationTable::from_fn("s", 1, 4, |a| (a[0] + 1) % 4).unwrap()];
            let mut builder = CongruenceLatticeBuilder::new(4, &tables).unwrap();
            let cancel = CancelToken::new();
            let trigger = cancel.clone();
            let reporter = FnProgress::new(move |_, _| trigger.cancel());

            let err = builder.build(&reporter, &cancel).unwrap_err();
            assert!(matches!(err, EngineError::Cancelled));
            assert_eq!(builder.cached(), 1);

            // A run cut short leaves no entry behind.
            assert!(matches!(
                builder.principal_congruence(0, 2, &cancel),
                Err(EngineError::Cancelled)
            ));
            assert_eq!(builder.cached(), 1);

            let fresh = CancelToken::new();
            let generator = CongruenceGenerator::new(4, &tables).unwrap();
            assert_eq!(
                builder.principal_congruence(0, 1, &fresh).unwrap(),
                generator.generate(0, 1, &fresh).unwrap()
            );
            builder.build(&NoProgress, &fresh).unwrap();
            let report = builder.last_report().unwrap();
            assert_eq!(report.principal_computations, 5);
            assert_eq!(report.cache_hits, 1);
        }
    }

    mod progress {
        use super::*;

        #[test]
        fn fractions_are_monotonic_and_finish_at_one() {
            let seen = Mutex::new(Vec::new());
            let reporter =
                FnProgress::new(|f, m: &str| seen.lock().unwrap().push((f, m.to_string())));
            let tables = [OperationTable::from_fn("m", 2, 4, |a| a[0].min(a[1])).unwrap()];
            CongruenceLatticeBuilder::new(4, &tables)
                .unwrap()
                .build(&reporter, &CancelToken::new())
                .unwrap();

            let seen = seen.into_inner().unwrap();
            // Six principal checkpoints, at least one join pass, one final.
            assert!(seen.len() >= 8);
            assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
            assert_eq!(seen.last().unwrap().0, 1.0);
            assert!(seen.iter().all(|(f, _)| (0.0..=1.0).contains(f)));
        }

        #[test]
        fn cancel_from_progress_callback() {
            let cancel = CancelToken::new();
            let trigger = cancel.clone();
            let reporter = FnProgress::new(move |_, _| trigger.cancel());
            let mut builder = CongruenceLatticeBuilder::new(4, &[]).unwrap();

            let err = builder.build(&reporter, &cancel).unwrap_err();
            assert!(matches!(err, EngineError::Cancelled));
            assert_eq!(err.kind(), ErrorKind::Cancellation);
            assert!(builder.last_report().is_none());
        }
    }

    mod limits {
        use super::*;

        #[test]
        fn universe_limit_fails_fast() {
            let seen = Mutex::new(0usize);
            let reporter = FnProgress::new(|_, _| *seen.lock().unwrap() += 1);
            let mut builder = CongruenceLatticeBuilder::new(5, &[]).unwrap().with_limits(Limits {
                max_universe_size: 4,
                ..Limits::default()
            });
            let err = builder.build(&reporter, &CancelToken::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ResourceLimit);
            assert_eq!(*seen.lock().unwrap(), 0);
        }

        #[test]
        fn lattice_limit_stops_growth() {
            let mut builder = CongruenceLatticeBuilder::new(4, &[]).unwrap().with_limits(Limits {
                max_lattice_size: 10,
                ..Limits::default()
            });
            let err = builder.build(&NoProgress, &CancelToken::new()).unwrap_err();
            assert!(matches!(
                err,
                EngineError::ResourceLimit { limit: 10, requested: 11, .. }
            ));
        }
    }
}
