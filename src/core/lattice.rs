//! core::lattice
//!
//! The congruence lattice of a finite algebra.
//!
//! # Architecture
//!
//! Elements are partitions of the algebra's universe, stored sorted by
//! [`Partition`]'s total order: most blocks first, so index `0` is the
//! zero congruence and the last index is the one congruence. That order
//! is a linear extension of refinement, which keeps the order matrix
//! upper triangular.
//!
//! Everything derived from the order (covers, atoms, irreducibles,
//! height, width) is computed once at construction; the value is
//! immutable afterwards.
//!
//! # Invariants
//!
//! - Elements are pairwise distinct and share one universe size
//! - The zero and one partitions are present
//! - The set is closed under partition join
//!
//! # Example
//!
//! ```
//! use conlat::core::lattice::CongruenceLattice;
//! use conlat::core::partition::Partition;
//!
//! let zero = Partition::zero(2).unwrap();
//! let one = Partition::one(2).unwrap();
//! let lattice = CongruenceLattice::from_congruences(
//!     2,
//!     vec![one.clone(), zero],
//!     vec![((0, 1), one)],
//! ).unwrap();
//!
//! assert_eq!(lattice.len(), 2);
//! assert!(lattice.is_simple());
//! assert_eq!(lattice.atoms().count(), 1);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::error::ErrorKind;
use super::graph::OrderGraph;
use super::partition::{Partition, PartitionError, PrintType};

/// Errors from assembling a lattice out of partitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LatticeError {
    #[error("a lattice needs at least one element")]
    Empty,

    #[error("element {element} has universe size {actual}, expected {expected}")]
    SizeMismatch {
        element: String,
        expected: usize,
        actual: usize,
    },

    #[error("the zero partition is missing")]
    MissingZero,

    #[error("the one partition is missing")]
    MissingOne,

    #[error("join of {left} and {right} is not an element")]
    NotJoinClosed { left: String, right: String },

    #[error("principal congruence Cg({a}, {b}) = {partition} is not an element")]
    UnknownPrincipal {
        a: usize,
        b: usize,
        partition: String,
    },

    #[error(transparent)]
    Partition(#[from] PartitionError),
}

impl LatticeError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LatticeError::Partition(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

/// Content hash of a lattice's element set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash the canonical arrays of `elements`.
    ///
    /// Elements are sorted first, so the result does not depend on input
    /// order or on which array encodes each partition.
    pub fn compute(elements: &[Partition]) -> Self {
        let mut sorted: Vec<&Partition> = elements.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for partition in sorted {
            for entry in partition.canonical_array() {
                hasher.update(entry.to_le_bytes());
            }
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializable overview of a lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeSummary {
    pub universe_size: usize,
    pub size: usize,
    pub height: usize,
    pub width: usize,
    pub simple: bool,
    pub distributive: bool,
    pub modular: bool,
    pub atoms: Vec<String>,
    pub coatoms: Vec<String>,
    pub join_irreducibles: Vec<String>,
    pub meet_irreducibles: Vec<String>,
    pub fingerprint: Fingerprint,
}

impl LatticeSummary {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The lattice of congruences of a finite algebra, ordered by refinement.
#[derive(Debug, Clone)]
pub struct CongruenceLattice {
    universe_size: usize,
    elements: Vec<Partition>,
    index: HashMap<Partition, usize>,
    graph: OrderGraph,
    /// `(a, b)` with `a < b` to the index of `Cg(a, b)`.
    principals: BTreeMap<(usize, usize), usize>,
    atoms: Vec<usize>,
    coatoms: Vec<usize>,
    join_irreducibles: Vec<usize>,
    meet_irreducibles: Vec<usize>,
    height: usize,
    width: usize,
}

impl CongruenceLattice {
    /// Assemble a lattice from a join-closed set of partitions.
    ///
    /// `principals` records which element each principal congruence is;
    /// pairs with `a == b` are ignored.
    ///
    /// # Errors
    ///
    /// Fails if the set is empty, mixes universe sizes, lacks zero or
    /// one, is not closed under join, or a principal is not an element.
    pub fn from_congruences(
        universe_size: usize,
        congruences: Vec<Partition>,
        principals: Vec<((usize, usize), Partition)>,
    ) -> Result<Self, LatticeError> {
        let lattice = Self::assemble(universe_size, congruences, principals)?;
        for i in 0..lattice.len() {
            for j in (i + 1)..lattice.len() {
                let joined = lattice.elements[i].join(&lattice.elements[j])?;
                if !lattice.index.contains_key(&joined) {
                    return Err(LatticeError::NotJoinClosed {
                        left: lattice.elements[i].to_string(),
                        right: lattice.elements[j].to_string(),
                    });
                }
            }
        }
        Ok(lattice)
    }

    /// Assemble without checking join closure.
    pub(crate) fn assemble(
        universe_size: usize,
        congruences: Vec<Partition>,
        principals: Vec<((usize, usize), Partition)>,
    ) -> Result<Self, LatticeError> {
        let unique: HashSet<Partition> = congruences.into_iter().collect();
        let mut elements: Vec<Partition> = unique.into_iter().collect();
        if elements.is_empty() {
            return Err(LatticeError::Empty);
        }
        for element in &elements {
            if element.universe_size() != universe_size {
                return Err(LatticeError::SizeMismatch {
                    element: element.to_string(),
                    expected: universe_size,
                    actual: element.universe_size(),
                });
            }
        }
        for element in &mut elements {
            element.normalize();
        }
        elements.sort();

        if !elements[0].is_zero() {
            return Err(LatticeError::MissingZero);
        }
        if !elements[elements.len() - 1].is_one() {
            return Err(LatticeError::MissingOne);
        }

        let index: HashMap<Partition, usize> = elements
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();

        let mut principal_map = BTreeMap::new();
        for ((a, b), partition) in principals {
            if a == b {
                continue;
            }
            let Some(&k) = index.get(&partition) else {
                return Err(LatticeError::UnknownPrincipal {
                    a,
                    b,
                    partition: partition.to_string(),
                });
            };
            principal_map.insert((a.min(b), a.max(b)), k);
        }

        // Sorted order is a linear extension, so only i < j can hold strictly.
        let m = elements.len();
        let mut leq = vec![vec![false; m]; m];
        for i in 0..m {
            leq[i][i] = true;
            for j in (i + 1)..m {
                leq[i][j] = elements[i].leq(&elements[j])?;
            }
        }
        let graph = OrderGraph::from_leq(leq);

        let zero = 0;
        let one = m - 1;
        let (atoms, coatoms) = if m == 1 {
            (Vec::new(), Vec::new())
        } else {
            (
                graph.upper_covers(zero).to_vec(),
                graph.lower_covers(one).to_vec(),
            )
        };
        let join_irreducibles = (0..m)
            .filter(|&i| graph.lower_covers(i).len() == 1)
            .collect();
        let meet_irreducibles = (0..m)
            .filter(|&i| graph.upper_covers(i).len() == 1)
            .collect();
        let height = graph.height();
        let width = graph.width();

        Ok(Self {
            universe_size,
            elements,
            index,
            graph,
            principals: principal_map,
            atoms,
            coatoms,
            join_irreducibles,
            meet_irreducibles,
            height,
            width,
        })
    }

    /// Size of the underlying algebra's universe.
    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    /// Number of congruences.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false: the zero congruence is always present.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All congruences, zero first and one last.
    pub fn elements(&self) -> &[Partition] {
        &self.elements
    }

    pub fn get(&self, i: usize) -> Option<&Partition> {
        self.elements.get(i)
    }

    pub fn index_of(&self, partition: &Partition) -> Option<usize> {
        self.index.get(partition).copied()
    }

    pub fn contains(&self, partition: &Partition) -> bool {
        self.index.contains_key(partition)
    }

    pub fn zero(&self) -> &Partition {
        &self.elements[0]
    }

    pub fn one(&self) -> &Partition {
        &self.elements[self.elements.len() - 1]
    }

    pub fn zero_index(&self) -> usize {
        0
    }

    pub fn one_index(&self) -> usize {
        self.elements.len() - 1
    }

    /// The order graph over element indices.
    pub fn graph(&self) -> &OrderGraph {
        &self.graph
    }

    /// `elements[i] <= elements[j]`. False when either index is out of range.
    pub fn leq(&self, i: usize, j: usize) -> bool {
        i < self.len() && j < self.len() && self.graph.leq(i, j)
    }

    /// Index of the join of elements `i` and `j`.
    pub fn join(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.len() || j >= self.len() {
            return None;
        }
        self.elements[i]
            .join(&self.elements[j])
            .ok()
            .and_then(|p| self.index_of(&p))
            .or_else(|| self.bound(i, j, true))
    }

    /// Index of the meet of elements `i` and `j`.
    ///
    /// For a congruence lattice this is the partition meet; otherwise the
    /// greatest common lower bound in the set.
    pub fn meet(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.len() || j >= self.len() {
            return None;
        }
        self.elements[i]
            .meet(&self.elements[j])
            .ok()
            .and_then(|p| self.index_of(&p))
            .or_else(|| self.bound(i, j, false))
    }

    /// Least upper (or greatest lower) bound of `i` and `j` by the order alone.
    fn bound(&self, i: usize, j: usize, upper: bool) -> Option<usize> {
        let related = |a: usize, b: usize| {
            if upper {
                self.graph.leq(a, b)
            } else {
                self.graph.leq(b, a)
            }
        };
        let candidates: Vec<usize> = (0..self.len())
            .filter(|&k| related(i, k) && related(j, k))
            .collect();
        candidates
            .iter()
            .copied()
            .find(|&k| candidates.iter().all(|&c| related(k, c)))
    }

    pub fn lower_covers(&self, i: usize) -> &[usize] {
        self.graph.lower_covers(i)
    }

    pub fn upper_covers(&self, i: usize) -> &[usize] {
        self.graph.upper_covers(i)
    }

    /// `Cg(a, b)`. Equal arguments give the zero congruence.
    pub fn principal(&self, a: usize, b: usize) -> Option<&Partition> {
        if a == b {
            return (a < self.universe_size).then(|| self.zero());
        }
        self.principals
            .get(&(a.min(b), a.max(b)))
            .map(|&k| &self.elements[k])
    }

    /// Indices of the distinct principal congruences, ascending.
    pub fn principal_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.principals.values().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.atoms.iter().map(move |&i| &self.elements[i])
    }

    pub fn coatoms(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.coatoms.iter().map(move |&i| &self.elements[i])
    }

    /// Elements with exactly one lower cover.
    pub fn join_irreducibles(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.join_irreducibles.iter().map(move |&i| &self.elements[i])
    }

    /// Elements with exactly one upper cover.
    pub fn meet_irreducibles(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.meet_irreducibles.iter().map(move |&i| &self.elements[i])
    }

    pub fn atom_indices(&self) -> &[usize] {
        &self.atoms
    }

    pub fn coatom_indices(&self) -> &[usize] {
        &self.coatoms
    }

    pub fn join_irreducible_indices(&self) -> &[usize] {
        &self.join_irreducibles
    }

    pub fn meet_irreducible_indices(&self) -> &[usize] {
        &self.meet_irreducibles
    }

    /// Length of the longest chain from zero to one.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of the largest antichain.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Exactly two congruences.
    pub fn is_simple(&self) -> bool {
        self.len() == 2
    }

    fn tables(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let m = self.len();
        let mut joins = vec![vec![0; m]; m];
        let mut meets = vec![vec![0; m]; m];
        for i in 0..m {
            for j in i..m {
                // Both exist for in-range indices of a lattice.
                let join = self.join(i, j).unwrap_or(self.one_index());
                let meet = self.meet(i, j).unwrap_or(self.zero_index());
                joins[i][j] = join;
                joins[j][i] = join;
                meets[i][j] = meet;
                meets[j][i] = meet;
            }
        }
        (joins, meets)
    }

    /// `x ∧ (y ∨ z) = (x ∧ y) ∨ (x ∧ z)` for all elements.
    pub fn is_distributive(&self) -> bool {
        let (joins, meets) = self.tables();
        let m = self.len();
        (0..m).all(|x| {
            (0..m).all(|y| (0..m).all(|z| meets[x][joins[y][z]] == joins[meets[x][y]][meets[x][z]]))
        })
    }

    /// `x ∨ (y ∧ z) = (x ∨ y) ∧ z` whenever `x <= z`.
    pub fn is_modular(&self) -> bool {
        let (joins, meets) = self.tables();
        let m = self.len();
        (0..m).all(|x| {
            (0..m)
                .filter(|&z| self.graph.leq(x, z))
                .all(|z| (0..m).all(|y| joins[x][meets[y][z]] == meets[joins[x][y]][z]))
        })
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.elements)
    }

    /// Overview with partitions rendered in `print_type`.
    pub fn summary(&self, print_type: PrintType) -> LatticeSummary {
        let render = |indices: &[usize]| -> Vec<String> {
            indices
                .iter()
                .map(|&i| self.elements[i].to_string_as(print_type))
                .collect()
        };
        LatticeSummary {
            universe_size: self.universe_size,
            size: self.len(),
            height: self.height,
            width: self.width,
            simple: self.is_simple(),
            distributive: self.is_distributive(),
            modular: self.is_modular(),
            atoms: render(&self.atoms),
            coatoms: render(&self.coatoms),
            join_irreducibles: render(&self.join_irreducibles),
            meet_irreducibles: render(&self.meet_irreducibles),
            fingerprint: self.fingerprint(),
        }
    }
}
