// In-memory worksheets.
//
// `SheetGrid` is what was read from an upload, `RenderedSheet` is what will
// be written out. Rows and columns are 0-based, like in the xlsx libraries.

use std::collections::BTreeMap;

use crate::report::io_common::cell_name;

pub type RowNum = u32;
pub type ColNum = u16;

#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// The content as a string, the way it would be displayed without formatting.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            CellValue::Number(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

/// A rectangular group of cells, bounds included.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CellRange {
    pub first: (RowNum, ColNum),
    pub last: (RowNum, ColNum),
}

impl CellRange {
    pub fn contains(&self, row: RowNum, col: ColNum) -> bool {
        row >= self.first.0 && row <= self.last.0 && col >= self.first.1 && col <= self.last.1
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_name(self.first.0, self.first.1),
            cell_name(self.last.0, self.last.1)
        )
    }
}

/// The content of one uploaded worksheet.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SheetGrid {
    pub name: String,
    pub cells: BTreeMap<(RowNum, ColNum), CellValue>,
    pub merged: Vec<CellRange>,
}

impl SheetGrid {
    pub fn new(name: &str) -> SheetGrid {
        SheetGrid {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, row: RowNum, col: ColNum) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn set(&mut self, row: RowNum, col: ColNum, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    /// True when the cell is missing or only holds whitespace.
    pub fn is_blank(&self, row: RowNum, col: ColNum) -> bool {
        self.get(row, col).map(|v| v.is_blank()).unwrap_or(true)
    }

    /// Removes all the merged regions. The value stays in the top-left cell,
    /// anything else covered by the region is cleared.
    ///
    /// Returns the number of regions that were removed.
    pub fn unmerge_all(&mut self) -> usize {
        let merged = std::mem::take(&mut self.merged);
        for m in merged.iter() {
            self.cells
                .retain(|(r, c), _| !m.contains(*r, *c) || (*r, *c) == m.first);
        }
        merged.len()
    }
}

/// How a written cell looks. The actual fonts and colours come from the style configuration.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CellStyle {
    Body,
    /// The header row of the question table.
    Header,
    /// The titles of the summary blocks.
    BlockHeader,
    /// An average score, shown with one decimal.
    Average,
    /// A signed difference of scores.
    Delta,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RenderedCell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// A worksheet ready to be written.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RenderedSheet {
    pub name: String,
    pub cells: BTreeMap<(RowNum, ColNum), RenderedCell>,
    pub column_widths: Vec<(ColNum, f64)>,
    pub row_heights: Vec<(RowNum, f64)>,
}

impl RenderedSheet {
    pub fn new(name: &str) -> RenderedSheet {
        RenderedSheet {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn put(&mut self, row: RowNum, col: ColNum, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), RenderedCell { value, style });
    }

    pub fn put_text(&mut self, row: RowNum, col: ColNum, s: &str, style: CellStyle) {
        self.put(row, col, CellValue::Text(s.to_string()), style);
    }

    pub fn get(&self, row: RowNum, col: ColNum) -> Option<&RenderedCell> {
        self.cells.get(&(row, col))
    }

    /// Drops the styles, as if the sheet had been saved and read again.
    pub fn to_grid(&self) -> SheetGrid {
        SheetGrid {
            name: self.name.clone(),
            cells: self
                .cells
                .iter()
                .map(|(k, c)| (*k, c.value.clone()))
                .collect(),
            merged: vec![],
        }
    }
}
