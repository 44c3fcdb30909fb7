use super::Spreadsheet;
use crate::error::Result;
use tabula_engine::engine::{
    Cell, CellAddress, CellFormat, CellUpdate, Recalculator, canonical_id, display_value,
    expand_range, translate,
};

impl Spreadsheet {
    /// Merge `update` into a cell and recalculate under `recalc`'s mode.
    pub fn edit(&mut self, id: &str, update: CellUpdate, recalc: &Recalculator) {
        self.data = recalc.apply_edit(&self.data, id, update);
        self.touch();
    }

    /// Set cell contents from formula-bar input.
    pub fn set_input(&mut self, id: &str, raw: &str, recalc: &Recalculator) {
        self.edit(id, CellUpdate::input(raw), recalc);
    }

    /// Merge display formatting into a cell. Values are untouched.
    pub fn set_format(&mut self, id: &str, format: CellFormat) {
        self.data
            .entry(canonical_id(id))
            .or_default()
            .apply(CellUpdate::format(format));
        self.touch();
    }

    /// Clear value and formula, then recalculate the cell's dependents.
    pub fn clear_cell(&mut self, id: &str, recalc: &Recalculator) {
        self.edit(id, CellUpdate::clear(), recalc);
    }

    /// Copy a cell, shifting the relative references of its formula.
    pub fn copy_cell(&mut self, from: &str, to: &str, recalc: &Recalculator) {
        let from = canonical_id(from);
        let to = canonical_id(to);
        let source = self.data.get(&from).cloned().unwrap_or_default();
        let update = copied_update(&source, &from, &to);
        tracing::debug!(from = %from, to = %to, "copy cell");
        self.edit(&to, update, recalc);
    }

    /// Copy `from` into every other cell of `range`.
    /// Returns the number of cells written.
    pub fn fill(&mut self, from: &str, range: &str, recalc: &Recalculator) -> Result<usize> {
        let from = canonical_id(from);
        let targets = expand_range(&range.to_ascii_uppercase())?;
        let mut written = 0;
        for target in targets
            .iter()
            .filter(|t| CellAddress::parse(t).is_some())
            .map(|t| canonical_id(t))
            .filter(|t| *t != from)
        {
            self.copy_cell(&from, &target, recalc);
            written += 1;
        }
        Ok(written)
    }

    /// Re-evaluate every formula cell.
    pub fn recalculate(&mut self, recalc: &Recalculator) {
        self.data = recalc.recalculate_all(&self.data);
        self.touch();
    }

    /// Display text for a cell (empty when absent).
    pub fn display(&self, id: &str) -> String {
        self.data
            .get(&canonical_id(id))
            .map(display_value)
            .unwrap_or_default()
    }

    /// Raw stored value of a cell.
    pub fn value(&self, id: &str) -> Option<&str> {
        self.data
            .get(&canonical_id(id))
            .and_then(|c| c.value.as_deref())
    }

    /// Non-blank cells in row-major order.
    pub fn non_empty_cells(&self) -> Vec<(&String, &Cell)> {
        let mut cells: Vec<_> = self.data.iter().filter(|(_, c)| !c.is_blank()).collect();
        cells.sort_by_key(|(id, _)| {
            let addr = CellAddress::decode(id);
            (addr.row, addr.col)
        });
        cells
    }
}

fn copied_update(source: &Cell, from: &str, to: &str) -> CellUpdate {
    let format = source.format.clone();
    match source.formula.as_deref().filter(|f| f.starts_with('=')) {
        Some(formula) => {
            let moved = translate(formula, from, to);
            CellUpdate {
                value: Some(moved.clone()),
                formula: Some(moved),
                kind: source.kind,
                format,
            }
        }
        None => CellUpdate {
            value: Some(source.value.clone().unwrap_or_default()),
            formula: Some(String::new()),
            kind: source.kind,
            format,
        },
    }
}
