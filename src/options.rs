// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Rendering options

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::Error;

/// Sheets to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// Every populated sheet
    #[default]
    All,
    /// A single sheet, 1 based
    Number(usize),
}

/// Column width handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnWidthMode {
    /// Replicate the stored column widths and row heights
    #[default]
    Replicate,
    /// Let the browser size columns
    Auto,
}

/// Page layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutMode {
    /// Like a printout: header and footer, no row or column references
    #[default]
    Print,
    /// Like the spreadsheet application: sheet name, row and column
    /// references, no header or footer
    Spreadsheet,
}

/// Options of a rendering
///
/// The compact code `"2OS"` reads: sheet 2, replicate (`O`) or auto (`A`)
/// column widths, print (`P`) or spreadsheet (`S`) layout. Omitted
/// characters take their default.
///
/// ```
/// use xlsx_html::{ColumnWidthMode, LayoutMode, RenderOptions, SheetSelector};
///
/// let options: RenderOptions = "2AS".parse().unwrap();
/// assert_eq!(options.sheets, SheetSelector::Number(2));
/// assert_eq!(options.column_widths, ColumnWidthMode::Auto);
/// assert_eq!(options.layout, LayoutMode::Spreadsheet);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Sheets to render
    pub sheets: SheetSelector,
    /// Column width handling
    pub column_widths: ColumnWidthMode,
    /// Page layout
    pub layout: LayoutMode,
    /// Directory receiving the embedded images
    pub image_dir: PathBuf,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            sheets: SheetSelector::All,
            column_widths: ColumnWidthMode::Replicate,
            layout: LayoutMode::Print,
            image_dir: PathBuf::from("images"),
        }
    }
}

impl RenderOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a single sheet (1 based)
    pub fn with_sheet(mut self, sheet: usize) -> Self {
        self.sheets = SheetSelector::Number(sheet);
        self
    }

    /// Sets the sheet selection
    pub fn with_sheets(mut self, sheets: SheetSelector) -> Self {
        self.sheets = sheets;
        self
    }

    /// Sets the column width handling
    pub fn with_column_widths(mut self, mode: ColumnWidthMode) -> Self {
        self.column_widths = mode;
        self
    }

    /// Sets the page layout
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the image directory
    pub fn with_image_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.image_dir = dir.as_ref().to_path_buf();
        self
    }
}

impl FromStr for RenderOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Options(s.to_string());
        let mut options = RenderOptions::default();
        let code = s.trim();
        let digits = code.bytes().take_while(u8::is_ascii_digit).count();
        let rest = if digits > 0 {
            let n = code[..digits].parse::<usize>().map_err(|_| invalid())?;
            if n == 0 {
                return Err(invalid());
            }
            options.sheets = SheetSelector::Number(n);
            &code[digits..]
        } else if let Some(rest) = code.strip_prefix(['A', 'a']) {
            rest
        } else if code.is_empty() {
            code
        } else {
            return Err(invalid());
        };

        let mut flags = rest.chars().map(|c| c.to_ascii_uppercase());
        match flags.next() {
            Some('O') | None => (),
            Some('A') => options.column_widths = ColumnWidthMode::Auto,
            Some(_) => return Err(invalid()),
        }
        match flags.next() {
            Some('P') | None => (),
            Some('S') => options.layout = LayoutMode::Spreadsheet,
            Some(_) => return Err(invalid()),
        }
        if flags.next().is_some() {
            return Err(invalid());
        }
        Ok(options)
    }
}
