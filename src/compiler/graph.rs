// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph algorithms over node indices.
//!
//! Nodes are addressed by their position in the DAG payload so that every
//! traversal visits them in a fixed order and the resulting plan is the same
//! on every compilation of the same payload.

/// Forward adjacency: `edges[i]` lists the nodes that depend on node `i`.
pub(crate) struct IndexGraph {
    dependents: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl IndexGraph {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            dependents: vec![Vec::new(); size],
            in_degree: vec![0; size],
        }
    }

    /// Adds `from -> to`. Returns `false` for an edge already present.
    pub(crate) fn add_edge(&mut self, from: usize, to: usize) -> bool {
        if self.dependents[from].contains(&to) {
            return false;
        }
        self.dependents[from].push(to);
        self.in_degree[to] += 1;
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.dependents.len()
    }

    /// Returns the first cycle found as a closed path of node indices
    /// (`[a, b, a]`), or `None` when the graph is acyclic.
    ///
    /// Three-color DFS on an explicit stack, so chain depth is bounded by heap
    /// rather than call-stack size. A neighbor that is still on the stack
    /// closes a cycle, and the cycle is the stack segment starting at it.
    pub(crate) fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut visited = vec![false; self.len()];
        let mut on_stack = vec![false; self.len()];

        for start in 0..self.len() {
            if visited[start] {
                continue;
            }
            // (node, index of the next dependent to visit)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            visited[start] = true;
            on_stack[start] = true;

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let Some(&next) = self.dependents[node].get(top.1) else {
                    on_stack[node] = false;
                    stack.pop();
                    continue;
                };
                top.1 += 1;

                if on_stack[next] {
                    let begin = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[begin..].iter().map(|&(n, _)| n).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                if !visited[next] {
                    visited[next] = true;
                    on_stack[next] = true;
                    stack.push((next, 0));
                }
            }
        }
        None
    }

    /// Kahn's algorithm, one level at a time. Level 0 holds nodes without
    /// dependencies; level N holds nodes whose dependencies all sit in earlier
    /// levels. Each level is sorted with `rank`.
    ///
    /// Returns `None` when some node was never released, i.e. on a cycle.
    pub(crate) fn levels<K: Ord>(&self, rank: impl Fn(usize) -> K) -> Option<Vec<Vec<usize>>> {
        let mut in_degree = self.in_degree.clone();
        let mut current: Vec<usize> = (0..self.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut levels = Vec::new();
        let mut released = 0;

        while !current.is_empty() {
            current.sort_by_key(|&i| rank(i));
            released += current.len();

            let mut next = Vec::new();
            for &node in &current {
                for &dependent in &self.dependents[node] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }

            levels.push(std::mem::replace(&mut current, next));
        }

        (released == self.len()).then_some(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(size: usize, edges: &[(usize, usize)]) -> IndexGraph {
        let mut graph = IndexGraph::new(size);
        for &(from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    #[test]
    fn finds_simple_cycle() {
        let g = graph(2, &[(0, 1), (1, 0)]);
        assert_eq!(g.find_cycle(), Some(vec![0, 1, 0]));
        assert_eq!(g.levels(|i| i), None);
    }

    #[test]
    fn finds_cycle_behind_a_prefix() {
        // 0 -> 1 -> 2 -> 3 -> 1
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        assert_eq!(g.find_cycle(), Some(vec![1, 2, 3, 1]));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let g = graph(1, &[(0, 0)]);
        assert_eq!(g.find_cycle(), Some(vec![0, 0]));
    }

    #[test]
    fn deep_chain_does_not_exhaust_the_stack() {
        let size = 200_000;
        let edges: Vec<(usize, usize)> = (1..size).map(|i| (i - 1, i)).collect();
        let mut g = graph(size, &edges);
        assert_eq!(g.find_cycle(), None);

        g.add_edge(size - 1, 0);
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle.len(), size + 1);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn diamond_levels() {
        // 0 -> {1, 2} -> 3
        let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(g.find_cycle(), None);
        assert_eq!(g.levels(|i| i), Some(vec![vec![0], vec![1, 2], vec![3]]));
    }

    #[test]
    fn levels_are_sorted_by_rank() {
        let g = graph(3, &[]);
        let rank = [5, 1, 3];
        assert_eq!(g.levels(|i| rank[i]), Some(vec![vec![1, 2, 0]]));
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut g = IndexGraph::new(2);
        assert!(g.add_edge(0, 1));
        assert!(!g.add_edge(0, 1));
        assert_eq!(g.levels(|i| i), Some(vec![vec![0], vec![1]]));
    }
}
