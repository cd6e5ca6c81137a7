//! core::graph
//!
//! Order graph over the elements of a finite poset.
//!
//! # Architecture
//!
//! Elements are plain indices `0..len`. The graph stores the full order
//! relation as a boolean matrix and derives the cover relation (the Hasse
//! diagram) from it:
//!
//! - `y` is a lower cover of `x` when `y < x` with nothing strictly between
//! - edges point upward, from lower cover to upper cover
//!
//! # Invariants
//!
//! - The input relation is a partial order (reflexive, antisymmetric,
//!   transitive); the cover graph is therefore acyclic
//! - Cover lists are sorted ascending

use std::collections::{HashSet, VecDeque};

/// A finite partial order with its cover relation.
#[derive(Debug, Clone, Default)]
pub struct OrderGraph {
    /// `leq[i][j]` iff element `i` is below or equal to element `j`.
    leq: Vec<Vec<bool>>,
    lower_covers: Vec<Vec<usize>>,
    upper_covers: Vec<Vec<usize>>,
}

impl OrderGraph {
    /// Build the graph from an order matrix.
    ///
    /// # Example
    ///
    /// ```
    /// use conlat::core::graph::OrderGraph;
    ///
    /// // The chain 0 < 1 < 2.
    /// let graph = OrderGraph::from_leq(vec![
    ///     vec![true, true, true],
    ///     vec![false, true, true],
    ///     vec![false, false, true],
    /// ]);
    /// assert_eq!(graph.lower_covers(2), &[1]);
    /// assert_eq!(graph.height(), 2);
    /// assert_eq!(graph.width(), 1);
    /// ```
    pub fn from_leq(leq: Vec<Vec<bool>>) -> Self {
        let len = leq.len();
        let mut graph = Self {
            leq,
            lower_covers: vec![Vec::new(); len],
            upper_covers: vec![Vec::new(); len],
        };

        let order = graph.topological_order();
        for &x in &order {
            // Strictly smaller elements, largest first in the linear extension.
            let mut covers: Vec<usize> = Vec::new();
            for &y in order.iter().rev() {
                if !graph.lt(y, x) {
                    continue;
                }
                if covers.iter().all(|&c| !graph.lt(y, c)) {
                    covers.push(y);
                }
            }
            covers.sort_unstable();
            for &y in &covers {
                graph.upper_covers[y].push(x);
            }
            graph.lower_covers[x] = covers;
        }
        for list in &mut graph.upper_covers {
            list.sort_unstable();
        }
        graph
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.leq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leq.is_empty()
    }

    /// `i <= j`.
    pub fn leq(&self, i: usize, j: usize) -> bool {
        self.leq[i][j]
    }

    /// `i < j`.
    pub fn lt(&self, i: usize, j: usize) -> bool {
        i != j && self.leq[i][j]
    }

    /// Elements covered by `i`.
    pub fn lower_covers(&self, i: usize) -> &[usize] {
        &self.lower_covers[i]
    }

    /// Elements covering `i`.
    pub fn upper_covers(&self, i: usize) -> &[usize] {
        &self.upper_covers[i]
    }

    /// Elements with no lower cover.
    pub fn minimal_elements(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.lower_covers[i].is_empty())
            .collect()
    }

    /// Elements with no upper cover.
    pub fn maximal_elements(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.upper_covers[i].is_empty())
            .collect()
    }

    /// All elements strictly above `i`, found by walking upper covers.
    pub fn strictly_above(&self, i: usize) -> HashSet<usize> {
        let mut result = HashSet::new();
        let mut queue: VecDeque<usize> = self.upper_covers[i].iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if result.insert(current) {
                queue.extend(self.upper_covers[current].iter().copied());
            }
        }

        result
    }

    /// A linear extension of the order.
    ///
    /// Elements are sorted by the number of elements strictly below them
    /// (fewest first), then by index for determinism. If `i < j` then `i`
    /// comes first, because everything below `i` is also below `j`.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut by_depth: Vec<(usize, usize)> = (0..self.len())
            .map(|i| ((0..self.len()).filter(|&j| self.lt(j, i)).count(), i))
            .collect();
        by_depth.sort_unstable();
        by_depth.into_iter().map(|(_, i)| i).collect()
    }

    /// Length, in edges, of the longest chain in the cover graph.
    ///
    /// For a bounded poset this is the longest chain from the bottom to
    /// the top. An empty or single-element poset has height 0.
    pub fn height(&self) -> usize {
        let mut longest = vec![0usize; self.len()];
        for x in self.topological_order() {
            longest[x] = self.lower_covers[x]
                .iter()
                .map(|&y| longest[y] + 1)
                .max()
                .unwrap_or(0);
        }
        longest.into_iter().max().unwrap_or(0)
    }

    /// Size of the largest antichain.
    ///
    /// By Dilworth's theorem this equals the minimum number of chains
    /// covering the poset, which is `len - M` where `M` is a maximum
    /// matching in the bipartite graph with an edge `i -> j` for every
    /// strict comparability `i < j`.
    pub fn width(&self) -> usize {
        let n = self.len();
        let adjacency: Vec<Vec<usize>> = (0..n)
            .map(|i| (0..n).filter(|&j| self.lt(i, j)).collect())
            .collect();

        let mut match_right: Vec<Option<usize>> = vec![None; n];
        let mut matching = 0;
        for start in 0..n {
            let mut visited = vec![false; n];
            if augment(start, &adjacency, &mut match_right, &mut visited) {
                matching += 1;
            }
        }
        n - matching
    }
}

/// Search for an augmenting path from `start`, flipping it if found.
///
/// Iterative so that long chains do not exhaust the call stack.
fn augment(
    start: usize,
    adjacency: &[Vec<usize>],
    match_right: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    // stack[k] = (left vertex, next edge to try); via[k] links stack[k] to stack[k + 1].
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    let mut via: Vec<usize> = Vec::new();

    while let Some(top) = stack.len().checked_sub(1) {
        let (u, pos) = stack[top];
        if pos == adjacency[u].len() {
            stack.pop();
            via.pop();
            continue;
        }
        stack[top].1 += 1;

        let v = adjacency[u][pos];
        if visited[v] {
            continue;
        }
        visited[v] = true;
        via.push(v);

        match match_right[v] {
            None => {
                for (&(left, _), &right) in stack.iter().zip(&via) {
                    match_right[right] = Some(left);
                }
                return true;
            }
            Some(w) => stack.push((w, 0)),
        }
    }
    false
}
