//! core::partition
//!
//! Equivalence relations on `{0, ..., n-1}` stored as representative arrays.
//!
//! # Encoding
//!
//! A partition of `n` elements is an array `a` of length `n`:
//!
//! - `a[i] < 0`: `i` is the representative of its block and `-a[i]` is the
//!   block size
//! - `a[i] >= 0`: `i` is a follower; its block is found by following
//!   `a[i]`, possibly through other followers, until a representative
//!
//! The array is its own arena: "pointers" are plain indices.
//!
//! # Canonical Form
//!
//! [`Partition::normalize`] rewrites the array so that every block's
//! representative is its smallest element and every follower points at it
//! directly. Equality, hashing, ordering and serialization all work on the
//! canonical form, so two arrays encoding the same relation compare equal.
//!
//! # Invariants
//!
//! - Exactly one representative per block; block sizes sum to `n`
//! - Resolution from any index terminates
//! - [`Partition::join_blocks`] is the only in-place structural mutation
//!
//! # Example
//!
//! ```
//! use conlat::core::partition::{Partition, PrintType};
//!
//! let p = Partition::from_array(vec![-2, 0, -1, -1]).unwrap();
//! assert_eq!(p.universe_size(), 4);
//! assert_eq!(p.number_of_blocks(), 3);
//! assert_eq!(p.get_blocks(), vec![vec![0, 1], vec![2], vec![3]]);
//! assert_eq!(p.to_string_as(PrintType::Ewk), "|0,1|2|3|");
//! ```

mod format;

pub use format::PrintType;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::ErrorKind;

/// Errors from partition construction and lattice operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("partition must have at least one element")]
    Empty,

    #[error("index {index} is outside the universe of size {size}")]
    OutOfRange { index: usize, size: usize },

    #[error("malformed partition array {input}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("cannot parse partition '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("invalid print type: {0}")]
    InvalidPrintType(String),

    #[error("cannot join a block with itself (element {0})")]
    SelfJoin(usize),

    #[error("both arguments must be representatives ({0} is not)")]
    NotRepresentative(usize),

    #[error("partitions have different universe sizes: {left} and {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("element not found: {0}")]
    ElementNotFound(usize),
}

impl PartitionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PartitionError::SelfJoin(_)
            | PartitionError::NotRepresentative(_)
            | PartitionError::SizeMismatch { .. } => ErrorKind::Operation,
            _ => ErrorKind::Validation,
        }
    }
}

/// An equivalence relation on `{0, ..., n-1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<isize>", into = "Vec<isize>")]
pub struct Partition {
    array: Vec<isize>,
}

impl Partition {
    /// The finest partition: `n` singleton blocks.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::Empty`] if `n == 0`.
    pub fn zero(n: usize) -> Result<Self, PartitionError> {
        if n == 0 {
            return Err(PartitionError::Empty);
        }
        Ok(Self {
            array: vec![-1; n],
        })
    }

    /// The coarsest partition: one block holding everything.
    pub fn one(n: usize) -> Result<Self, PartitionError> {
        if n == 0 {
            return Err(PartitionError::Empty);
        }
        let mut array = vec![0; n];
        array[0] = -(n as isize);
        Ok(Self { array })
    }

    /// Build a partition from a representative array.
    ///
    /// Followers may point at other followers; the array is accepted as
    /// long as every index resolves to a representative. Representative
    /// entries are rewritten to the actual block sizes, follower entries
    /// are kept as given.
    ///
    /// # Errors
    ///
    /// Fails on an empty array, a follower pointing outside the universe,
    /// or a pointer cycle.
    pub fn from_array(array: Vec<isize>) -> Result<Self, PartitionError> {
        let n = array.len();
        if n == 0 {
            return Err(PartitionError::Empty);
        }
        let malformed = |reason: String| PartitionError::Malformed {
            input: format!("{:?}", array),
            reason,
        };

        if let Some((i, &v)) = array
            .iter()
            .enumerate()
            .find(|&(_, &v)| v >= 0 && v as usize >= n)
        {
            return Err(malformed(format!("entry {i} points at {v}, outside [0, {n})")));
        }

        // 0 = unvisited, 1 = on the current path, 2 = resolves.
        let mut state = vec![0u8; n];
        let mut path = Vec::new();
        for start in 0..n {
            let mut i = start;
            while state[i] == 0 && array[i] >= 0 {
                state[i] = 1;
                path.push(i);
                i = array[i] as usize;
            }
            if state[i] == 1 {
                return Err(malformed(format!("cycle through index {i}")));
            }
            state[i] = 2;
            for j in path.drain(..) {
                state[j] = 2;
            }
        }

        let mut partition = Self { array };
        let mut sizes = vec![0isize; n];
        for i in 0..n {
            sizes[partition.root(i)] += 1;
        }
        for (i, size) in sizes.into_iter().enumerate() {
            if partition.array[i] < 0 {
                partition.array[i] = -size;
            }
        }
        Ok(partition)
    }

    /// Build a partition of `n` elements from explicit blocks.
    ///
    /// # Errors
    ///
    /// Fails unless the blocks are non-empty and cover every element of
    /// `[0, n)` exactly once.
    pub fn from_blocks(n: usize, blocks: &[Vec<usize>]) -> Result<Self, PartitionError> {
        if n == 0 {
            return Err(PartitionError::Empty);
        }
        let mut array = vec![isize::MIN; n];
        for block in blocks {
            let Some(&min) = block.iter().min() else {
                return Err(PartitionError::Malformed {
                    input: format!("{:?}", blocks),
                    reason: "empty block".to_string(),
                });
            };
            for &e in block {
                if e >= n {
                    return Err(PartitionError::OutOfRange { index: e, size: n });
                }
                if array[e] != isize::MIN {
                    return Err(PartitionError::Malformed {
                        input: format!("{:?}", blocks),
                        reason: format!("element {e} appears more than once"),
                    });
                }
                array[e] = min as isize;
            }
            array[min] = -(block.len() as isize);
        }
        if let Some(missing) = array.iter().position(|&v| v == isize::MIN) {
            return Err(PartitionError::Malformed {
                input: format!("{:?}", blocks),
                reason: format!("element {missing} is not in any block"),
            });
        }
        Ok(Self { array })
    }

    /// Parse any of the textual forms produced by [`Partition::to_string_as`].
    ///
    /// # Example
    ///
    /// ```
    /// use conlat::core::partition::Partition;
    ///
    /// let a = Partition::from_string("|0,1|2,3|").unwrap();
    /// let b = Partition::from_string("|0 1|2 3|").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.number_of_blocks(), 2);
    /// ```
    pub fn from_string(text: &str) -> Result<Self, PartitionError> {
        format::parse(text)
    }

    /// Number of elements in the universe.
    pub fn universe_size(&self) -> usize {
        self.array.len()
    }

    /// Number of blocks.
    pub fn number_of_blocks(&self) -> usize {
        self.array.iter().filter(|&&v| v < 0).count()
    }

    /// `universe_size - number_of_blocks`.
    pub fn rank(&self) -> usize {
        self.universe_size() - self.number_of_blocks()
    }

    /// True for the partition into singletons.
    pub fn is_zero(&self) -> bool {
        self.number_of_blocks() == self.universe_size()
    }

    /// True for the one-block partition.
    pub fn is_one(&self) -> bool {
        self.number_of_blocks() == 1
    }

    /// True when all blocks have the same size.
    pub fn is_uniform(&self) -> bool {
        let mut sizes = self.array.iter().filter(|&&v| v < 0);
        match sizes.next() {
            Some(first) => sizes.all(|v| v == first),
            None => true,
        }
    }

    /// The raw array, exactly as stored.
    pub fn as_slice(&self) -> &[isize] {
        &self.array
    }

    /// Resolve an index in range to its representative.
    fn root(&self, mut i: usize) -> usize {
        while self.array[i] >= 0 {
            i = self.array[i] as usize;
        }
        i
    }

    fn check_index(&self, i: usize) -> Result<(), PartitionError> {
        if i >= self.array.len() {
            return Err(PartitionError::OutOfRange {
                index: i,
                size: self.array.len(),
            });
        }
        Ok(())
    }

    fn check_same_universe(&self, other: &Partition) -> Result<(), PartitionError> {
        if self.universe_size() != other.universe_size() {
            return Err(PartitionError::SizeMismatch {
                left: self.universe_size(),
                right: other.universe_size(),
            });
        }
        Ok(())
    }

    /// The representative of `i`'s block.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::OutOfRange`] if `i >= universe_size`.
    pub fn representative(&self, i: usize) -> Result<usize, PartitionError> {
        self.check_index(i)?;
        Ok(self.root(i))
    }

    /// True if `i` is a representative. Out-of-range indices are not.
    pub fn is_representative(&self, i: usize) -> bool {
        self.array.get(i).is_some_and(|&v| v < 0)
    }

    /// True if `i` and `j` lie in the same block. Out-of-range indices
    /// are related to nothing.
    pub fn is_related(&self, i: usize, j: usize) -> bool {
        let n = self.universe_size();
        i < n && j < n && self.root(i) == self.root(j)
    }

    /// Merge the blocks represented by `r` and `s`, in place.
    ///
    /// The smaller block is attached under the representative of the
    /// larger one; on a tie `s`'s block goes under `r`.
    ///
    /// # Errors
    ///
    /// Fails if `r == s`, either index is out of range, or either is not a
    /// representative. The partition is unchanged on failure.
    pub fn join_blocks(&mut self, r: usize, s: usize) -> Result<(), PartitionError> {
        self.check_index(r)?;
        self.check_index(s)?;
        if r == s {
            return Err(PartitionError::SelfJoin(r));
        }
        for x in [r, s] {
            if !self.is_representative(x) {
                return Err(PartitionError::NotRepresentative(x));
            }
        }

        self.link(r, s);
        Ok(())
    }

    /// Merge the blocks containing `i` and `j`. Returns `false` if they
    /// were already the same block.
    pub(crate) fn union(&mut self, i: usize, j: usize) -> bool {
        let (ri, rj) = (self.root(i), self.root(j));
        if ri == rj {
            return false;
        }
        self.link(ri, rj);
        true
    }

    /// Attach the smaller of two distinct root blocks under the other.
    fn link(&mut self, r: usize, s: usize) {
        let size_r = self.array[r];
        let size_s = self.array[s];
        // Sizes are stored negated.
        if size_r > size_s {
            self.array[s] += size_r;
            self.array[r] = s as isize;
        } else {
            self.array[r] += size_s;
            self.array[s] = r as isize;
        }
    }

    /// The finest partition coarser than both `self` and `other`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::SizeMismatch`] on different universes.
    pub fn join(&self, other: &Partition) -> Result<Partition, PartitionError> {
        self.check_same_universe(other)?;
        let mut result = self.clone();
        for i in 0..other.universe_size() {
            result.union(i, other.root(i));
        }
        result.normalize();
        Ok(result)
    }

    /// The coarsest partition finer than both `self` and `other`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::SizeMismatch`] on different universes.
    pub fn meet(&self, other: &Partition) -> Result<Partition, PartitionError> {
        self.check_same_universe(other)?;
        let n = self.universe_size();
        let mut first: HashMap<(usize, usize), usize> = HashMap::new();
        let mut array = vec![0isize; n];
        for i in 0..n {
            let key = (self.root(i), other.root(i));
            match first.get(&key) {
                Some(&rep) => {
                    array[i] = rep as isize;
                    array[rep] -= 1;
                }
                None => {
                    first.insert(key, i);
                    array[i] = -1;
                }
            }
        }
        Ok(Partition { array })
    }

    /// True if `self` refines `other`: every block of `self` lies inside a
    /// block of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::SizeMismatch`] on different universes.
    pub fn leq(&self, other: &Partition) -> Result<bool, PartitionError> {
        self.check_same_universe(other)?;
        Ok((0..self.universe_size()).all(|i| other.root(i) == other.root(self.root(i))))
    }

    /// Sorted indices of all representatives.
    pub fn representatives(&self) -> Vec<usize> {
        (0..self.universe_size())
            .filter(|&i| self.array[i] < 0)
            .collect()
    }

    /// The blocks, listed in the order of [`Partition::representatives`],
    /// each sorted ascending.
    pub fn get_blocks(&self) -> Vec<Vec<usize>> {
        let reps = self.representatives();
        let position: HashMap<usize, usize> =
            reps.iter().enumerate().map(|(k, &r)| (r, k)).collect();
        let mut blocks = vec![Vec::new(); reps.len()];
        for i in 0..self.universe_size() {
            blocks[position[&self.root(i)]].push(i);
        }
        blocks
    }

    /// Sorted members of `i`'s block.
    pub fn block_of(&self, i: usize) -> Result<Vec<usize>, PartitionError> {
        let r = self.representative(i)?;
        Ok((0..self.universe_size())
            .filter(|&j| self.root(j) == r)
            .collect())
    }

    /// Position of `i`'s block among [`Partition::representatives`].
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::ElementNotFound`] if `i` is out of range.
    pub fn block_index(&self, i: usize) -> Result<usize, PartitionError> {
        if i >= self.universe_size() {
            return Err(PartitionError::ElementNotFound(i));
        }
        let r = self.root(i);
        Ok(self.array[..r].iter().filter(|&&v| v < 0).count())
    }

    /// The canonical array, computed without modifying `self`.
    ///
    /// Each block's smallest element is its representative and followers
    /// point at it directly.
    pub fn canonical_array(&self) -> Vec<isize> {
        let n = self.universe_size();
        let mut smallest = vec![usize::MAX; n];
        let mut canonical = vec![0isize; n];
        for i in 0..n {
            let r = self.root(i);
            if smallest[r] == usize::MAX {
                smallest[r] = i;
                canonical[i] = self.array[r];
            } else {
                canonical[i] = smallest[r] as isize;
            }
        }
        canonical
    }

    /// Rewrite the array into canonical form. Idempotent.
    pub fn normalize(&mut self) {
        self.array = self.canonical_array();
    }

    /// True if the stored array is the lexicographically smallest array
    /// encoding this partition, i.e. it is already canonical.
    pub fn is_initial_lex_representative(&self) -> bool {
        self.array == self.canonical_array()
    }

    /// Render in the given textual form.
    pub fn to_string_as(&self, print_type: PrintType) -> String {
        format::render(self, print_type)
    }

    /// Render in the textual form named by `print_type`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::InvalidPrintType`] for an unknown name.
    pub fn to_string_named(&self, print_type: &str) -> Result<String, PartitionError> {
        Ok(self.to_string_as(print_type.parse()?))
    }
}

impl PartialEq for Partition {
    fn eq(&self, other: &Self) -> bool {
        self.universe_size() == other.universe_size()
            && self.canonical_array() == other.canonical_array()
    }
}

impl Eq for Partition {}

impl Hash for Partition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_array().hash(state);
    }
}

/// Total order extending refinement: more blocks first, then the
/// canonical arrays lexicographically. If `p` strictly refines `q` then
/// `p < q`.
impl Ord for Partition {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .number_of_blocks()
            .cmp(&self.number_of_blocks())
            .then_with(|| self.canonical_array().cmp(&other.canonical_array()))
    }
}

impl PartialOrd for Partition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_as(PrintType::Ewk))
    }
}

impl FromStr for Partition {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl TryFrom<Vec<isize>> for Partition {
    type Error = PartitionError;

    fn try_from(array: Vec<isize>) -> Result<Self, Self::Error> {
        Self::from_array(array)
    }
}

impl From<Partition> for Vec<isize> {
    fn from(p: Partition) -> Self {
        p.canonical_array()
    }
}
