//! Circular dependency detection for formula cells.
//!
//! Full recalculation orders cells topologically; cells that can never be
//! ordered are checked here with a depth-first search over precedent edges.
//! Cells on a cycle evaluate to `#CIRCULAR!` instead of looping.

use std::collections::HashSet;

use super::deps::DependencyGraph;

/// Find a cycle passing through `start`.
/// Returns the path `start -> ... -> start` if one exists.
pub fn detect_cycle(start: &str, graph: &DependencyGraph) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut path = vec![start.to_string()];

    if detect_cycle_dfs(start, start, graph, &mut visited, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    start: &str,
    current: &str,
    graph: &DependencyGraph,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> bool {
    for dep in graph.precedents(current) {
        if dep == start {
            path.push(dep.clone());
            return true;
        }
        if !visited.insert(dep.clone()) {
            continue;
        }

        path.push(dep.clone());
        if detect_cycle_dfs(start, dep, graph, visited, path) {
            return true;
        }
        path.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, Grid};

    fn graph(cells: &[(&str, &str)]) -> DependencyGraph {
        let grid: Grid = cells
            .iter()
            .map(|(id, input)| (id.to_string(), Cell::from_input(input)))
            .collect();
        DependencyGraph::build(&grid)
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let g = graph(&[("A1", "10"), ("B1", "20"), ("C1", "=SUM(A1, B1)")]);
        assert!(detect_cycle("C1", &g).is_none());
    }

    #[test]
    fn test_detect_cycle_direct() {
        let g = graph(&[("A1", "=SUM(B1)"), ("B1", "=SUM(A1)")]);
        assert_eq!(detect_cycle("A1", &g), Some(vec!["A1".into(), "B1".into(), "A1".into()]));
        assert!(detect_cycle("B1", &g).is_some());
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let g = graph(&[("A1", "=SUM(B1)"), ("B1", "=SUM(C1)"), ("C1", "=SUM(A1)")]);
        let path = detect_cycle("A1", &g).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_detect_cycle_self_reference() {
        let g = graph(&[("A1", "=SUM(A1)")]);
        assert!(detect_cycle("A1", &g).is_some());
    }

    #[test]
    fn test_downstream_of_cycle_is_not_on_it() {
        let g = graph(&[("A1", "=SUM(B1)"), ("B1", "=SUM(A1)"), ("C1", "=SUM(A1)")]);
        assert!(detect_cycle("C1", &g).is_none());
    }
}
