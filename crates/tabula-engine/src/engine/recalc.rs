//! Recalculation after a single-cell edit.
//!
//! Two modes are supported:
//!
//! - [`RecalcMode::Direct`] (default): the edited cell is evaluated, then every
//!   formula whose scanned references include the edited cell is evaluated
//!   once against that snapshot. Dependents do not see each other's new
//!   values, so `A1 -> B1 -> C1` refreshes `B1` but leaves `C1` stale.
//!   Range interiors are not dependencies (`=SUM(A1:A10)` ignores `A5`).
//!   No cycle detection.
//! - [`RecalcMode::Full`]: ranges are expanded, every transitive dependent is
//!   evaluated in topological order, and cells on a cycle get `#CIRCULAR!`.
//!
//! Both modes are pure: the input grid is never modified.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use super::cell::{CellUpdate, Grid};
use super::cell_ref::CellAddress;
use super::cycle::detect_cycle;
use super::deps::{DependencyGraph, find_cell_dependencies};
use super::eval::{ErrorToken, ResolveCell, evaluate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecalcMode {
    #[default]
    Direct,
    Full,
}

impl FromStr for RecalcMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(RecalcMode::Direct),
            "full" => Ok(RecalcMode::Full),
            other => Err(format!("Unknown recalc mode: {} (expected direct or full)", other)),
        }
    }
}

impl fmt::Display for RecalcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecalcMode::Direct => "direct",
            RecalcMode::Full => "full",
        })
    }
}

/// Applies edits to grid snapshots under a chosen recalculation mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recalculator {
    pub mode: RecalcMode,
}

impl Recalculator {
    pub fn new(mode: RecalcMode) -> Recalculator {
        Recalculator { mode }
    }

    /// Merge `update` into `target` and return the recalculated grid.
    pub fn apply_edit(&self, grid: &Grid, target: &str, update: CellUpdate) -> Grid {
        let target = canonical_id(target);
        let mut next = grid.clone();
        next.entry(target.clone()).or_default().apply(update);

        let touched = match self.mode {
            RecalcMode::Direct => recalc_direct(grid, &mut next, &target),
            RecalcMode::Full => {
                let graph = DependencyGraph::build(&next);
                let mut affected = graph.transitive_dependents(&target);
                if next.get(&target).is_some_and(|c| c.has_formula()) {
                    affected.insert(target.clone());
                }
                let count = affected.len();
                evaluate_in_order(&mut next, &graph, affected);
                count
            }
        };

        tracing::debug!(cell = %target, mode = %self.mode, touched, "applied edit");
        next
    }

    /// Re-evaluate every formula cell.
    pub fn recalculate_all(&self, grid: &Grid) -> Grid {
        let mut next = grid.clone();
        let formula_cells: BTreeSet<String> = grid
            .iter()
            .filter(|(_, cell)| cell.has_formula())
            .map(|(id, _)| id.clone())
            .collect();

        match self.mode {
            RecalcMode::Direct => {
                let results = evaluate_each(grid, formula_cells.iter());
                store(&mut next, results);
            }
            RecalcMode::Full => {
                let graph = DependencyGraph::build(grid);
                evaluate_in_order(&mut next, &graph, formula_cells);
            }
        }
        next
    }
}

/// Apply an edit with direct (one-level) propagation.
pub fn apply_edit(grid: &Grid, target: &str, update: CellUpdate) -> Grid {
    Recalculator::default().apply_edit(grid, target, update)
}

/// Re-evaluate every formula cell of a grid.
pub fn recalculate_all(grid: &Grid, mode: RecalcMode) -> Grid {
    Recalculator::new(mode).recalculate_all(grid)
}

/// Canonical spelling of a cell identifier, via the address codec.
pub fn canonical_id(id: &str) -> String {
    CellAddress::decode(&id.trim().to_ascii_uppercase()).to_string()
}

fn recalc_direct(before: &Grid, next: &mut Grid, target: &str) -> usize {
    // The edited cell reads the merged grid, except for itself: a
    // self-reference sees the value held before the edit.
    let prior = before.get(target).and_then(|c| c.value.clone());
    let own = next
        .get(target)
        .and_then(|c| c.formula.as_deref().filter(|f| f.starts_with('=')))
        .map(|formula| {
            let resolver = |id: &str| {
                if id == target {
                    prior.clone()
                } else {
                    next.resolve(id)
                }
            };
            evaluate(formula, &resolver)
        });
    if let Some(value) = own {
        tracing::trace!(cell = target, %value, "evaluated");
        store(next, vec![(target.to_string(), value)]);
    }

    let dependents: Vec<String> = next
        .iter()
        .filter(|(id, _)| id.as_str() != target)
        .filter_map(|(id, cell)| {
            let formula = cell.formula.as_deref()?;
            find_cell_dependencies(formula)
                .iter()
                .any(|dep| dep == target)
                .then(|| id.clone())
        })
        .collect();

    // Every dependent reads the same snapshot; results are written afterwards.
    let results = evaluate_each(next, dependents.iter());
    store(next, results);
    dependents.len()
}

fn evaluate_each<I>(grid: &Grid, ids: I) -> Vec<(String, String)>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    ids.into_iter()
        .filter_map(|id| {
            let id = id.as_ref();
            let formula = grid.get(id)?.formula.as_deref().filter(|f| f.starts_with('='))?;
            let value = evaluate(formula, grid);
            tracing::trace!(cell = id, %value, "evaluated");
            Some((id.to_string(), value))
        })
        .collect()
}

fn store(grid: &mut Grid, results: Vec<(String, String)>) {
    for (id, value) in results {
        if let Some(cell) = grid.get_mut(&id) {
            cell.value = Some(value);
        }
    }
}

/// Evaluate `cells` in dependency order, each reading the values computed
/// before it. Cells that cannot be ordered are checked for cycles.
fn evaluate_in_order(grid: &mut Grid, graph: &DependencyGraph, cells: BTreeSet<String>) {
    let mut pending: BTreeMap<String, usize> = cells
        .iter()
        .map(|id| {
            let waiting_on = graph
                .precedents(id)
                .iter()
                .filter(|p| cells.contains(*p))
                .count();
            (id.clone(), waiting_on)
        })
        .collect();

    let mut ready: VecDeque<String> = pending
        .iter()
        .filter(|(_, waiting)| **waiting == 0)
        .map(|(id, _)| id.clone())
        .collect();

    loop {
        while let Some(id) = ready.pop_front() {
            if pending.remove(&id).is_none() {
                continue;
            }
            let result = evaluate_each(grid, std::iter::once(id.as_str()));
            store(grid, result);
            release_dependents(&id, graph, &mut pending, &mut ready);
        }

        if pending.is_empty() {
            break;
        }

        let circular: Vec<String> = pending
            .keys()
            .filter(|id| detect_cycle(id, graph).is_some())
            .cloned()
            .collect();

        if circular.is_empty() {
            // Nothing left is on a cycle yet nothing is ready; evaluate the
            // remainder as-is rather than stall.
            let rest: Vec<String> = pending.keys().cloned().collect();
            let results = evaluate_each(grid, rest.iter());
            store(grid, results);
            break;
        }

        tracing::warn!(cells = ?circular, "circular references detected");
        for id in circular {
            if let Some(cell) = grid.get_mut(&id) {
                cell.value = Some(ErrorToken::Circular.to_string());
            }
            pending.remove(&id);
            release_dependents(&id, graph, &mut pending, &mut ready);
        }
    }
}

fn release_dependents(
    id: &str,
    graph: &DependencyGraph,
    pending: &mut BTreeMap<String, usize>,
    ready: &mut VecDeque<String>,
) {
    for dep in graph.dependents(id) {
        if let Some(waiting) = pending.get_mut(dep) {
            *waiting = waiting.saturating_sub(1);
            if *waiting == 0 {
                ready.push_back(dep.clone());
            }
        }
    }
}
