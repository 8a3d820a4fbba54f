//! Undirected graphs over enumerated rays.
//!
//! Vertex `i` is the `i`-th ray of an enumeration result; an edge joins two rays spanning a
//! two-dimensional face of the cone.

use std::collections::VecDeque;

/// Graph stored as strictly increasing neighbour lists.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AdjacencyList {
    neighbors: Vec<Vec<usize>>,
}

/// Accumulates edges in any order; [`finish`](Self::finish) sorts and removes repeats.
#[derive(Clone, Debug)]
pub struct AdjacencyListBuilder {
    neighbors: Vec<Vec<usize>>,
}

impl AdjacencyListBuilder {
    #[inline]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); vertex_count],
        }
    }

    /// # Panics
    ///
    /// Panics if either endpoint is out of range.
    #[inline]
    pub fn add_undirected_edge(&mut self, a: usize, b: usize) {
        self.neighbors[a].push(b);
        self.neighbors[b].push(a);
    }

    pub fn finish(mut self) -> AdjacencyList {
        for list in &mut self.neighbors {
            list.sort_unstable();
            list.dedup();
        }
        AdjacencyList {
            neighbors: self.neighbors,
        }
    }
}

impl AdjacencyList {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps lists that are already strictly increasing.
    pub fn from_sorted_adjacency_lists(neighbors: Vec<Vec<usize>>) -> Self {
        debug_assert!(
            neighbors.iter().all(|n| n.windows(2).all(|w| w[0] < w[1])),
            "neighbour lists must be strictly increasing"
        );
        Self { neighbors }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    pub fn num_edges(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.neighbors(v).len()
    }

    /// # Panics
    ///
    /// Panics if `v` is out of range.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        match self.neighbors.get(v) {
            Some(list) => list,
            None => panic!("vertex {v} out of range for a graph on {} vertices", self.num_vertices()),
        }
    }

    #[inline]
    pub fn contains(&self, v: usize, neighbor: usize) -> bool {
        self.neighbors(v).binary_search(&neighbor).is_ok()
    }

    /// Edges `(a, b)` with `a < b`, in lexicographic order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(a, list)| {
            list.iter()
                .copied()
                .skip_while(move |&b| b <= a)
                .map(move |b| (a, b))
        })
    }

    pub fn into_adjacency_lists(self) -> Vec<Vec<usize>> {
        self.neighbors
    }

    /// Hop count from `start` to every vertex; `None` where unreachable.
    pub fn distances_from(&self, start: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.num_vertices()];
        let mut queue = VecDeque::from([start]);
        dist[start] = Some(0);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map(|d| d + 1);
            for &w in self.neighbors(v) {
                if dist[w].is_none() {
                    dist[w] = next;
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// Shortest path length, or `None` when `goal` is unreachable.
    pub fn distance(&self, start: usize, goal: usize) -> Option<usize> {
        assert!(
            goal < self.num_vertices(),
            "vertex {goal} out of range for a graph on {} vertices",
            self.num_vertices()
        );
        self.distances_from(start)[goal]
    }

    /// Largest eccentricity, or `None` when the graph is disconnected. The empty graph has
    /// diameter 0.
    pub fn diameter(&self) -> Option<usize> {
        (0..self.num_vertices()).try_fold(0, |best, v| {
            let ecc = self
                .distances_from(v)
                .into_iter()
                .try_fold(0, |m, d| d.map(|d| m.max(d)))?;
            Some(best.max(ecc))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AdjacencyList, AdjacencyListBuilder};

    #[test]
    fn edges_are_listed_once() {
        let mut builder = AdjacencyListBuilder::new(3);
        builder.add_undirected_edge(2, 0);
        builder.add_undirected_edge(0, 1);
        builder.add_undirected_edge(0, 2);
        let graph = builder.finish();

        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1), (0, 2)]);
        assert_eq!(graph.neighbors(2), &[0]);
        assert!(graph.contains(1, 0));
        assert!(!graph.contains(1, 2));
    }

    #[test]
    fn split_graph_has_no_diameter() {
        let graph =
            AdjacencyList::from_sorted_adjacency_lists(vec![vec![1], vec![0], vec![3], vec![2]]);
        assert_eq!(graph.distance(0, 2), None);
        assert_eq!(graph.distances_from(2), vec![None, None, Some(0), Some(1)]);
        assert_eq!(graph.diameter(), None);
    }

    #[test]
    fn empty_graph_has_zero_diameter() {
        assert_eq!(AdjacencyList::empty().diameter(), Some(0));
    }
}
