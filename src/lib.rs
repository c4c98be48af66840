//! Excel xlsx to HTML renderer
//!
//! # Status
//!
//! **xlsx-html** is a pure Rust library rendering the worksheets of an xlsx
//! document as fully styled HTML tables: fonts, fills, borders, alignment,
//! number formats, merged cells, images, page headers and footers and
//! conditional formatting (highlights, color scales and data bars).
//!
//! # Examples
//! ```no_run
//! use xlsx_html::{render, RenderOptions};
//!
//! // sheet 2, automatic column widths, spreadsheet layout
//! let options: RenderOptions = "2AS".parse().expect("invalid options");
//! let html = render("report.xlsx", &options).expect("cannot render workbook");
//! println!("{html}");
//! ```
//!
//! Images are written by an [`ImageStore`]. [`render`] writes them under
//! [`RenderOptions::image_dir`], [`Workbook::render`] takes any store:
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use xlsx_html::{NoImages, RenderOptions, Workbook};
//!
//! let file = BufReader::new(File::open("report.xlsx").unwrap());
//! let mut workbook = Workbook::new(file).unwrap().with_file_name("report.xlsx");
//! for (i, name) in workbook.sheet_names().iter().enumerate() {
//!     let sheet = workbook.worksheet(i + 1).unwrap();
//!     println!("{name}: {} cells", sheet.cells.len());
//! }
//! let html = workbook.render(&RenderOptions::new(), &mut NoImages).unwrap();
//! # drop(html);
//! ```
#![deny(missing_docs)]

#[macro_use]
mod utils;

mod color;
mod conditional_formatting;
mod errors;
mod formats;
mod grid;
mod header_footer;
mod html;
mod image;
mod options;
mod shared_strings;
mod style;
mod theme;
mod worksheet;
mod xlsx;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};

pub use crate::color::{indexed_color, ColorRef, Hsl, Rgb};
pub use crate::conditional_formatting::{
    evaluate, CfvoType, ColorScale, ComparisonOperator, ConditionalFormatRule,
    ConditionalFormatType, ConditionalFormatValue, ConditionalFormatting, ConditionalOverlay,
    DataBar, DataBarGraphic, Operand, OverlayMap, RuleFormat, TextOperator,
};
pub use crate::errors::Error;
pub use crate::formats::{
    builtin_format_code, detect_number_format, format_general, format_number, Accounting,
    FormattedNumber, NumberFormatKind,
};
pub use crate::grid::{
    column_width_px, row_height_px, visible_range, CellPaint, Geometry, Grid, Span, ValueKind,
};
pub use crate::header_footer::{HeaderContext, HeaderFooter};
pub use crate::html::{Document, SheetContext};
pub use crate::image::{DirectoryImageStore, ImageId, ImageStore, NoImages};
pub use crate::options::{ColumnWidthMode, LayoutMode, RenderOptions, SheetSelector};
pub use crate::shared_strings::{RichText, SharedStrings, TextRun};
pub use crate::style::{
    Border, BorderSide, BorderStyle, CellFormat, DifferentialFormat, Fill, Font,
    HorizontalAlignment, ResolvedStyle, Script, Side, Stylesheet, Underline, VerticalAlignment,
};
pub use crate::theme::{ThemeColors, ThemeRole};
pub use crate::worksheet::{Cell, CellValue, Dimensions, ImageAnchor, Worksheet};
pub use crate::xlsx::{Xlsx, XlsxError, MAX_COLUMNS, MAX_ROWS};

/// Renders the workbook at `path`, writing its images under
/// `options.image_dir`
pub fn render<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String, Error> {
    let mut workbook = Workbook::open(path)?;
    let mut images = DirectoryImageStore::new(&options.image_dir);
    workbook.render(options, &mut images)
}

/// An opened workbook ready to be rendered
pub struct Workbook<RS> {
    xlsx: Xlsx<RS>,
    styles: Vec<ResolvedStyle>,
    default_font: Font,
    file_name: String,
}

impl Workbook<BufReader<File>> {
    /// Opens a workbook from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let file = BufReader::new(File::open(path)?);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Workbook::new(file)?.with_file_name(file_name))
    }
}

impl<RS: Read + Seek> Workbook<RS> {
    /// Reads the package and resolves every cell format
    pub fn new(reader: RS) -> Result<Self, Error> {
        let xlsx = Xlsx::new(reader)?;
        let styles = xlsx.styles().resolve_all();
        let default_font = xlsx.styles().default_font();
        Ok(Workbook {
            xlsx,
            styles,
            default_font,
            file_name: String::new(),
        })
    }

    /// Sets the file name substituted for the `&F` header field
    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Names of the worksheets, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.xlsx.sheet_names()
    }

    /// Reads a worksheet by its 1 based number
    pub fn worksheet(&mut self, number: usize) -> Result<Worksheet, Error> {
        if number == 0 {
            return Err(XlsxError::WorksheetNotFound("#0".to_string()).into());
        }
        Ok(self.xlsx.worksheet(number - 1)?)
    }

    /// Reads a worksheet by its name
    pub fn worksheet_by_name(&mut self, name: &str) -> Result<Worksheet, Error> {
        Ok(self.xlsx.worksheet_by_name(name)?)
    }

    /// The underlying package
    pub fn xlsx(&self) -> &Xlsx<RS> {
        &self.xlsx
    }

    /// Renders the selected sheets as one html document
    pub fn render(
        &mut self,
        options: &RenderOptions,
        images: &mut dyn ImageStore,
    ) -> Result<String, Error> {
        let mut body = String::new();
        match options.sheets {
            SheetSelector::All => {
                for number in 1..=self.xlsx.sheet_names().len() {
                    if let Some(html) = self.render_sheet(number, options, images)? {
                        body.push_str(&html);
                    }
                }
            }
            SheetSelector::Number(number) => match self.render_sheet(number, options, images)? {
                Some(html) => body.push_str(&html),
                None => body.push_str(&html::missing_sheet(number)),
            },
        }
        Ok(html::document(&body))
    }

    /// Renders one sheet, `None` when it does not exist or is blank
    fn render_sheet(
        &mut self,
        number: usize,
        options: &RenderOptions,
        images: &mut dyn ImageStore,
    ) -> Result<Option<String>, Error> {
        let names = self.xlsx.sheet_names();
        let Some(name) = number.checked_sub(1).and_then(|i| names.get(i)) else {
            warn!("sheet {number} does not exist");
            return Ok(None);
        };
        let sheet = match self.worksheet(number) {
            Ok(sheet) => sheet,
            Err(Error::Xlsx(XlsxError::WorksheetNotFound(n))) => {
                warn!("worksheet part of '{n}' is missing");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let srcs = self.store_images(number, &sheet, images)?;
        let overlays = evaluate(&sheet, self.xlsx.shared_strings(), self.xlsx.styles());
        let Some(grid) = Grid::new(&sheet, &self.styles, overlays) else {
            debug!("sheet '{name}' is blank");
            return Ok(None);
        };
        let doc = Document {
            strings: self.xlsx.shared_strings(),
            theme: self.xlsx.theme(),
            default_font: &self.default_font,
            file_name: &self.file_name,
            options,
        };
        let context = SheetContext {
            name,
            images: &srcs,
        };
        Ok(Some(html::render_sheet(&grid, &doc, &context)))
    }

    /// Hands the images of a sheet to the store, giving the `src` of each
    /// anchor
    fn store_images(
        &mut self,
        number: usize,
        sheet: &Worksheet,
        images: &mut dyn ImageStore,
    ) -> Result<Vec<Option<String>>, Error> {
        let mut srcs = Vec::with_capacity(sheet.images.len());
        for anchor in &sheet.images {
            let id = ImageId {
                sheet: number,
                rel_id: anchor.rel_id.clone(),
                extension: anchor.extension().unwrap_or_default(),
            };
            let src = match self.xlsx.part_bytes(&anchor.target)? {
                Some(bytes) => images.store(&id, &bytes),
                None => {
                    warn!("{id}: part {} is missing", anchor.target);
                    None
                }
            };
            srcs.push(src);
        }
        Ok(srcs)
    }
}
