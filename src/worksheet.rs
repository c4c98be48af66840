// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Worksheet model: the sparse cell grid and everything laid over it

use std::collections::BTreeMap;

use crate::conditional_formatting::ConditionalFormatting;
use crate::shared_strings::{RichText, SharedStrings};

/// A rectangular cell range, 0 based `(row, column)` corners, both inclusive
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Dimensions {
    /// start: top left `(row, column)`
    pub start: (u32, u32),
    /// end: bottom right `(row, column)`
    pub end: (u32, u32),
}

impl Dimensions {
    /// create dimensions info with start position and end position
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self { start, end }
    }

    /// check if a position is in it
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start.0 && row <= self.end.0 && col >= self.start.1 && col <= self.end.1
    }

    /// len
    pub fn len(&self) -> u64 {
        u64::from(self.height()) * u64::from(self.width())
    }

    /// A range always holds at least one cell
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of columns
    pub fn width(&self) -> u32 {
        self.end.1.saturating_sub(self.start.1) + 1
    }

    /// Number of rows
    pub fn height(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0) + 1
    }

    /// Smallest range holding both ranges
    pub fn union(&self, other: &Dimensions) -> Dimensions {
        Dimensions {
            start: (
                self.start.0.min(other.start.0),
                self.start.1.min(other.start.1),
            ),
            end: (self.end.0.max(other.end.0), self.end.1.max(other.end.1)),
        }
    }
}

/// Raw value of a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Number (dates are numbers too)
    Number(f64),
    /// Index in the shared text table
    Shared(usize),
    /// Inline or formula string
    Text(RichText),
    /// Boolean
    Bool(bool),
    /// Error, e.g. `#DIV/0!`
    Error(String),
    /// No value, the cell only carries a style
    #[default]
    Empty,
}

/// A populated cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// 0 based row
    pub row: u32,
    /// 0 based column
    pub column: u32,
    /// Raw value
    pub value: CellValue,
    /// Cell format index
    pub style: usize,
}

impl Cell {
    /// Numeric value
    pub fn number(&self) -> Option<f64> {
        match self.value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Rich text of a text cell
    pub fn rich_text<'a>(&'a self, strings: &'a SharedStrings) -> Option<&'a RichText> {
        match &self.value {
            CellValue::Shared(i) => strings.get(*i),
            CellValue::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Plain text of the value, as displayed without number formatting
    pub fn text(&self, strings: &SharedStrings) -> Option<String> {
        match &self.value {
            CellValue::Shared(i) => strings.text(*i),
            CellValue::Text(t) => Some(t.text()),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Error(e) => Some(e.clone()),
            CellValue::Number(_) | CellValue::Empty => None,
        }
    }

    /// Checks whether the cell holds no value
    pub fn is_empty(&self) -> bool {
        self.value == CellValue::Empty
    }
}

/// An image pinned to a cell range
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnchor {
    /// Covered cells
    pub range: Dimensions,
    /// Displayed width in pixels
    pub width_px: u32,
    /// Displayed height in pixels
    pub height_px: u32,
    /// Relationship id of the image in the drawing part
    pub rel_id: String,
    /// Path of the image part in the package, e.g. `xl/media/image1.png`
    pub target: String,
}

impl ImageAnchor {
    /// Lower cased file extension of the image part
    pub fn extension(&self) -> Option<String> {
        self.target
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// A parsed worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    /// Declared used range (`<dimension ref>`)
    pub dimension: Option<Dimensions>,
    /// Column widths in character units, by 0 based column
    pub column_widths: BTreeMap<u32, f64>,
    /// Row heights in points, by 0 based row
    pub row_heights: BTreeMap<u32, f64>,
    /// Cells by `(row, column)`
    pub cells: BTreeMap<(u32, u32), Cell>,
    /// Merged ranges
    pub merges: Vec<Dimensions>,
    /// Embedded images
    pub images: Vec<ImageAnchor>,
    /// Conditional formatting groups
    pub conditional_formats: Vec<ConditionalFormatting>,
    /// Raw odd page header mini-markup
    pub header: Option<String>,
    /// Raw odd page footer mini-markup
    pub footer: Option<String>,
    /// Relationship id of the drawing part
    pub(crate) drawing_rel: Option<String>,
}

impl Worksheet {
    /// Cell at a position
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Inserts or replaces a cell
    pub fn insert(&mut self, cell: Cell) {
        self.cells.insert((cell.row, cell.column), cell);
    }

    /// Cells within a range, row by row
    pub fn cells_in<'a>(&'a self, range: &'a Dimensions) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .range(range.start..=range.end)
            .map(|(_, c)| c)
            .filter(move |c| range.contains(c.row, c.column))
    }

    /// Extent of the cells holding a value or a style
    pub fn used_range(&self) -> Option<Dimensions> {
        let mut cells = self.cells.keys();
        let first = *cells.next()?;
        let mut used = Dimensions::new(first, first);
        for &pos in cells {
            used = used.union(&Dimensions::new(pos, pos));
        }
        Some(used)
    }

    /// Checks whether the sheet has nothing to display
    pub fn is_blank(&self) -> bool {
        self.cells.is_empty() && self.merges.is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(row: u32, column: u32, n: f64) -> Cell {
        Cell {
            row,
            column,
            value: CellValue::Number(n),
            style: 0,
        }
    }

    #[test]
    fn test_dimensions() {
        let d = Dimensions::new((1, 1), (3, 3));
        assert_eq!(d.width(), 3);
        assert_eq!(d.height(), 3);
        assert_eq!(d.len(), 9);
        assert!(d.contains(2, 3));
        assert!(!d.contains(0, 1));
        assert_eq!(
            d.union(&Dimensions::new((0, 5), (0, 5))),
            Dimensions::new((0, 1), (3, 5))
        );
    }

    #[test]
    fn test_cells_in() {
        let mut sheet = Worksheet::default();
        sheet.insert(number(0, 0, 1.));
        sheet.insert(number(0, 4, 2.));
        sheet.insert(number(1, 1, 3.));
        sheet.insert(number(5, 1, 4.));
        let range = Dimensions::new((0, 0), (2, 1));
        let found: Vec<f64> = sheet.cells_in(&range).filter_map(Cell::number).collect();
        assert_eq!(found, vec![1., 3.]);
        assert_eq!(sheet.used_range(), Some(Dimensions::new((0, 0), (5, 4))));
    }

    #[test]
    fn test_cell_text() {
        let strings = SharedStrings::new(vec![RichText::plain("Hello")]);
        let shared = Cell {
            row: 0,
            column: 0,
            value: CellValue::Shared(0),
            style: 0,
        };
        assert_eq!(shared.text(&strings).as_deref(), Some("Hello"));
        assert_eq!(number(0, 0, 1.).text(&strings), None);
        let b = Cell {
            value: CellValue::Bool(true),
            ..shared
        };
        assert_eq!(b.text(&strings).as_deref(), Some("TRUE"));
    }
}
