//! Dependency extraction from formula strings.
//!
//! Two notions of "depends on" live here:
//!
//! - [`find_cell_dependencies`] is the reference scanner used by direct
//!   recalculation. It reports every reference token it sees, so a range
//!   `A1:A10` contributes its two corners only.
//! - [`formula_dependencies`] expands ranges into every covered cell and
//!   feeds the [`DependencyGraph`] used by full recalculation.

use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

use super::cell::Grid;
use super::cell_ref::reference_token_re;
use super::range::expand_range;

/// Distinct cell identifiers textually referenced by a formula, `$` stripped,
/// in order of first appearance. Non-formulas have no dependencies.
pub fn find_cell_dependencies(formula: &str) -> Vec<String> {
    if !formula.starts_with('=') {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    reference_token_re()
        .find_iter(formula)
        .map(|m| m.as_str().replace('$', ""))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Every cell a formula reads, with `X:Y` ranges expanded.
/// Ranges too large to expand contribute their corners only.
pub fn formula_dependencies(formula: &str) -> Vec<String> {
    if !formula.starts_with('=') {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    let mut push = |id: String| {
        if seen.insert(id.clone()) {
            deps.push(id);
        }
    };

    for m in range_token_re().find_iter(formula) {
        match expand_range(m.as_str()) {
            Ok(cells) => cells.into_iter().for_each(&mut push),
            Err(err) => {
                tracing::warn!(range = m.as_str(), %err, "range not expanded for dependencies");
                for corner in m.as_str().split(':') {
                    push(corner.replace('$', ""));
                }
            }
        }
    }

    // Remaining standalone references.
    let without_ranges = range_token_re().replace_all(formula, " ");
    for m in reference_token_re().find_iter(&without_ranges) {
        push(m.as_str().replace('$', ""));
    }

    deps
}

/// Forward and reverse dependency edges for every formula cell of a grid.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    precedents: HashMap<String, Vec<String>>,
    dependents: HashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn build(grid: &Grid) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        for (id, cell) in grid {
            let Some(formula) = cell.formula.as_deref().filter(|f| f.starts_with('=')) else {
                continue;
            };
            let deps = formula_dependencies(formula);
            for dep in &deps {
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(id.clone());
            }
            graph.precedents.insert(id.clone(), deps);
        }
        graph
    }

    /// Cells the given cell reads.
    pub fn precedents(&self, id: &str) -> &[String] {
        self.precedents.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Cells that read the given cell directly.
    pub fn dependents(&self, id: &str) -> impl Iterator<Item = &String> {
        self.dependents.get(id).into_iter().flatten()
    }

    /// Every cell reachable through dependent edges, excluding `id` itself
    /// unless it sits on a cycle.
    pub fn transitive_dependents(&self, id: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for dep in self.dependents(current) {
                if found.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }
        found
    }
}

fn range_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?[A-Z]+\$?[0-9]+:\$?[A-Z]+\$?[0-9]+")
            .expect("dependency range regex must compile")
    })
}
