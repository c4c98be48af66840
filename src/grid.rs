// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Grid geometry and per-cell paint
//!
//! A [`Grid`] is built once per sheet: it fixes the visible rectangle, the
//! merged and image spans laid over the cells and the conditional formatting
//! overlays, and answers the paint-ready style of any position.

use std::collections::BTreeMap;

use crate::color::Rgb;
use crate::conditional_formatting::{ConditionalOverlay, DataBarGraphic, OverlayMap};
use crate::style::{
    Border, Font, HorizontalAlignment, ResolvedStyle, Side, Underline, VerticalAlignment,
};
use crate::worksheet::{Cell, CellValue, Dimensions, Worksheet};

/// Width of a column without an explicit width, in pixels
pub const DEFAULT_COLUMN_WIDTH_PX: u32 = 60;

/// Pixels per character unit of a stored column width
const COLUMN_WIDTH_FACTOR: f64 = 7.;

/// Pixels per point of a stored row height
const ROW_HEIGHT_FACTOR: f64 = 1.3;

/// Light grid line drawn on a trailing edge without a border
pub const GRID_RIGHT: &str = " border-right:1px solid LightGray;";
/// Light grid line drawn on a bottom edge without a border
pub const GRID_BOTTOM: &str = " border-bottom:1px solid LightGray;";

/// Pixel width of a stored column width
pub fn column_width_px(width: Option<f64>) -> u32 {
    match width {
        Some(w) if w > 0. => (w * COLUMN_WIDTH_FACTOR) as u32,
        _ => DEFAULT_COLUMN_WIDTH_PX,
    }
}

/// Pixel height of a stored row height
pub fn row_height_px(height: f64) -> u32 {
    (height * ROW_HEIGHT_FACTOR) as u32
}

/// Smallest rectangle holding the declared dimension, the populated cells,
/// the merges and the images. `None` when the sheet has nothing to show.
pub fn visible_range(sheet: &Worksheet) -> Option<Dimensions> {
    if sheet.is_blank() {
        return None;
    }
    sheet
        .dimension
        .iter()
        .copied()
        .chain(sheet.used_range())
        .chain(sheet.merges.iter().copied())
        .chain(sheet.images.iter().map(|i| i.range))
        .reduce(|a, b| a.union(&b))
}

/// A merged range or an image anchor, drawn as a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Covered cells
    pub range: Dimensions,
    /// Index of the image drawn in the span
    pub image: Option<usize>,
}

impl Span {
    /// Number of columns
    pub fn colspan(&self) -> u32 {
        self.range.width()
    }

    /// Number of rows
    pub fn rowspan(&self) -> u32 {
        self.range.height()
    }

    /// ` colspan='N' rowspan='M'`, each only when larger than 1
    pub fn attributes(&self) -> String {
        let mut attrs = String::new();
        if self.colspan() > 1 {
            attrs.push_str(&format!(" colspan='{}'", self.colspan()));
        }
        if self.rowspan() > 1 {
            attrs.push_str(&format!(" rowspan='{}'", self.rowspan()));
        }
        attrs
    }
}

/// Spans of a sheet, by their top left cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    spans: BTreeMap<(u32, u32), Span>,
}

impl Geometry {
    /// Collects merges, then image anchors. An image anchored on a merge is
    /// drawn in that merge.
    pub fn new(sheet: &Worksheet) -> Self {
        let mut spans = BTreeMap::new();
        for range in &sheet.merges {
            spans.entry(range.start).or_insert(Span {
                range: *range,
                image: None,
            });
        }
        for (i, image) in sheet.images.iter().enumerate() {
            let span = spans.entry(image.range.start).or_insert(Span {
                range: image.range,
                image: None,
            });
            if span.image.is_none() {
                span.image = Some(i);
            }
        }
        Geometry { spans }
    }

    /// Span anchored at a position
    pub fn span(&self, row: u32, col: u32) -> Option<&Span> {
        self.spans.get(&(row, col))
    }

    /// Checks whether a position lies inside a span without being its anchor
    pub fn is_covered(&self, row: u32, col: u32) -> bool {
        self.spans
            .range(..=(row, col))
            .any(|(&start, s)| start != (row, col) && s.range.contains(row, col))
    }

    /// Number of spans
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Checks whether there is no span
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// What a cell displays, deciding its default horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Numbers, aligned right
    Number,
    /// Text and blank cells, aligned left
    Text,
    /// Booleans and errors, centered
    Logical,
}

impl ValueKind {
    /// Kind of a cell value
    pub fn of(value: &CellValue) -> Self {
        match value {
            CellValue::Number(_) => ValueKind::Number,
            CellValue::Bool(_) | CellValue::Error(_) => ValueKind::Logical,
            CellValue::Shared(_) | CellValue::Text(_) | CellValue::Empty => ValueKind::Text,
        }
    }
}

/// The paint-ready style of a cell: base style overlaid by conditional
/// formatting
#[derive(Debug, Clone, PartialEq)]
pub struct CellPaint {
    /// Font of the content
    pub font: Font,
    /// Borders
    pub border: Border,
    /// Background color
    pub fill: Option<Rgb>,
    /// Explicit horizontal alignment
    pub horizontal: Option<HorizontalAlignment>,
    /// Vertical alignment
    pub vertical: VerticalAlignment,
    /// Number format code
    pub number_format: String,
    /// Renders the text as a link
    pub hyperlink: bool,
    /// Data bar drawn under the content
    pub data_bar: Option<DataBarGraphic>,
}

impl CellPaint {
    /// Applies the overlay over a resolved base style. Discrete fills win
    /// over color scales, which win over the base fill.
    pub fn new(base: &ResolvedStyle, overlay: Option<&ConditionalOverlay>) -> Self {
        let mut paint = CellPaint {
            font: base.font.clone(),
            border: base.border.clone(),
            fill: base.fill,
            horizontal: base.horizontal,
            vertical: base.vertical.unwrap_or(VerticalAlignment::Bottom),
            number_format: base.number_format.clone(),
            hyperlink: base.hyperlink,
            data_bar: None,
        };
        if let Some(o) = overlay {
            if let Some(font) = &o.font {
                paint.font = paint.font.overlay(font);
            }
            if let Some(border) = &o.border {
                paint.border = paint.border.overlay(border);
            }
            paint.fill = o.background().or(paint.fill);
            paint.data_bar = o.data_bar.clone();
        }
        paint
    }

    /// Takes the right and bottom borders from the last cell of a span
    pub fn with_trailing_edges(mut self, last: &CellPaint) -> Self {
        self.border.right = last.border.right;
        self.border.bottom = last.border.bottom;
        self
    }

    /// Bottom edge: the border, else an accounting underline of the font
    fn bottom_css(&self) -> Option<String> {
        if let Some(side) = &self.border.bottom {
            return Some(side.css(Side::Bottom));
        }
        match self.font.underline {
            Some(Underline::SingleAccounting) => {
                Some(" border-bottom: 1px solid #000000;".to_string())
            }
            Some(Underline::DoubleAccounting) => {
                Some(" border-bottom: 3px double #000000;".to_string())
            }
            _ => None,
        }
    }

    /// Borders only, with the light grid on undefined trailing edges
    pub fn border_css(&self) -> String {
        let mut css = self.border.side_css(Side::Left);
        match self.border.side(Side::Right) {
            Some(side) => css.push_str(&side.css(Side::Right)),
            None if self.fill.is_none() => css.push_str(GRID_RIGHT),
            None => (),
        }
        css.push_str(&self.border.side_css(Side::Top));
        match self.bottom_css() {
            Some(bottom) => css.push_str(&bottom),
            None if self.fill.is_none() => css.push_str(GRID_BOTTOM),
            None => (),
        }
        css
    }

    /// Inline css of the table cell
    pub fn cell_css(&self, kind: ValueKind) -> String {
        let mut css = self.border_css();
        if let Some(fill) = self.fill {
            css.push_str(&format!(" background-color: #{fill};"));
        }
        css.push_str(&format!(" vertical-align:{};", self.vertical.css_value()));
        if let Some(diagonal) = self.border.diagonal_css(self.fill) {
            css.push_str(&diagonal);
        }
        let align = self
            .horizontal
            .and_then(HorizontalAlignment::css_value)
            .unwrap_or(match kind {
                ValueKind::Number => "right",
                ValueKind::Text => "left",
                ValueKind::Logical => "center",
            });
        css.push_str(&format!(" text-align:{align};"));
        css
    }
}

/// The resolved grid of a sheet
#[derive(Debug)]
pub struct Grid<'a> {
    sheet: &'a Worksheet,
    styles: &'a [ResolvedStyle],
    overlays: OverlayMap,
    default_style: ResolvedStyle,
    /// Visible rectangle
    pub range: Dimensions,
    /// Merge and image spans
    pub geometry: Geometry,
}

impl<'a> Grid<'a> {
    /// Lays out a sheet, `None` when it has nothing to show.
    ///
    /// `styles` are the resolved cell formats by index.
    pub fn new(
        sheet: &'a Worksheet,
        styles: &'a [ResolvedStyle],
        overlays: OverlayMap,
    ) -> Option<Self> {
        let range = visible_range(sheet)?;
        Some(Grid {
            sheet,
            styles,
            overlays,
            default_style: ResolvedStyle::default(),
            range,
            geometry: Geometry::new(sheet),
        })
    }

    /// The sheet
    pub fn sheet(&self) -> &'a Worksheet {
        self.sheet
    }

    /// Cell at a position
    pub fn cell(&self, row: u32, col: u32) -> Option<&'a Cell> {
        self.sheet.cell(row, col)
    }

    /// Conditional overlay of a position
    pub fn overlay(&self, row: u32, col: u32) -> Option<&ConditionalOverlay> {
        self.overlays.get(&(row, col))
    }

    /// Resolved style of a cell format index
    pub fn style(&self, xf: usize) -> &ResolvedStyle {
        self.styles.get(xf).unwrap_or(&self.default_style)
    }

    /// Checks whether the position holds a cell with a non default format
    pub fn is_styled(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).is_some_and(|c| c.style != 0)
    }

    fn paint_single(&self, row: u32, col: u32) -> CellPaint {
        let xf = self.cell(row, col).map_or(0, |c| c.style);
        CellPaint::new(self.style(xf), self.overlay(row, col))
    }

    /// Paint of a position. The anchor of a span takes its right and bottom
    /// borders from the last cell of the span.
    pub fn paint(&self, row: u32, col: u32) -> CellPaint {
        let paint = self.paint_single(row, col);
        match self.geometry.span(row, col) {
            Some(span) if span.range.end != span.range.start => {
                let (last_row, last_col) = span.range.end;
                paint.with_trailing_edges(&self.paint_single(last_row, last_col))
            }
            _ => paint,
        }
    }

    /// Column width in pixels
    pub fn column_width_px(&self, col: u32) -> u32 {
        column_width_px(self.sheet.column_widths.get(&col).copied())
    }

    /// Explicit row height in pixels
    pub fn row_height_px(&self, row: u32) -> Option<u32> {
        self.sheet.row_heights.get(&row).map(|&h| row_height_px(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderSide, BorderStyle};
    use crate::worksheet::ImageAnchor;

    fn cell(row: u32, column: u32, value: CellValue, style: usize) -> Cell {
        Cell {
            row,
            column,
            value,
            style,
        }
    }

    #[test]
    fn test_merge_geometry() {
        let mut sheet = Worksheet::default();
        sheet.merges.push(Dimensions::new((1, 1), (3, 3)));
        let geometry = Geometry::new(&sheet);
        let span = geometry.span(1, 1).unwrap();
        assert_eq!((span.colspan(), span.rowspan()), (3, 3));
        assert_eq!(span.attributes(), " colspan='3' rowspan='3'");
        assert!(!geometry.is_covered(1, 1));
        for pos in [(1, 2), (1, 3), (2, 1), (3, 3)] {
            assert!(geometry.is_covered(pos.0, pos.1), "{pos:?}");
        }
        assert!(!geometry.is_covered(0, 1));
        assert!(!geometry.is_covered(4, 1));
        assert!(!geometry.is_covered(2, 4));
    }

    #[test]
    fn test_visible_range() {
        let mut sheet = Worksheet::default();
        sheet.dimension = Some(Dimensions::new((0, 0), (0, 0)));
        assert_eq!(visible_range(&sheet), None);

        sheet.insert(cell(2, 1, CellValue::Number(1.), 0));
        sheet.merges.push(Dimensions::new((4, 0), (5, 1)));
        sheet.images.push(ImageAnchor {
            range: Dimensions::new((1, 3), (2, 6)),
            width_px: 10,
            height_px: 10,
            rel_id: "rId1".to_string(),
            target: "xl/media/image1.png".to_string(),
        });
        assert_eq!(
            visible_range(&sheet),
            Some(Dimensions::new((0, 0), (5, 6)))
        );
        let geometry = Geometry::new(&sheet);
        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry.span(1, 3).unwrap().image, Some(0));
    }

    #[test]
    fn test_cell_css() {
        let paint = CellPaint::new(&ResolvedStyle::default(), None);
        assert_eq!(
            paint.cell_css(ValueKind::Number),
            " border-right:1px solid LightGray; border-bottom:1px solid LightGray; vertical-align:bottom; text-align:right;"
        );

        let overlay = ConditionalOverlay {
            fill: Some(Rgb::new(255, 0, 0)),
            scale_fill: Some(Rgb::new(0, 255, 0)),
            ..Default::default()
        };
        let mut base = ResolvedStyle::default();
        base.border.left = Some(BorderSide::new(BorderStyle::Thin, None));
        base.horizontal = Some(HorizontalAlignment::CenterContinuous);
        base.vertical = Some(VerticalAlignment::Center);
        let paint = CellPaint::new(&base, Some(&overlay));
        assert_eq!(
            paint.cell_css(ValueKind::Text),
            " border-left: 1px solid #000000; background-color: #FF0000; vertical-align:middle; text-align:center;"
        );
    }

    #[test]
    fn test_overlay_font_unbolds() {
        let mut base = ResolvedStyle::default();
        base.font = Font::new().with_bold(true).with_italic(true);
        let overlay = ConditionalOverlay {
            font: Some(Font::new().with_bold(false)),
            ..Default::default()
        };
        let paint = CellPaint::new(&base, Some(&overlay));
        assert!(!paint.font.is_bold());
        assert!(paint.font.is_italic());
        assert!(!paint.font.css().contains("bold"));
    }

    #[test]
    fn test_accounting_underline() {
        let mut base = ResolvedStyle::default();
        base.font.underline = Some(Underline::DoubleAccounting);
        let paint = CellPaint::new(&base, None);
        assert_eq!(
            paint.border_css(),
            " border-right:1px solid LightGray; border-bottom: 3px double #000000;"
        );
    }

    #[test]
    fn test_span_trailing_edges() {
        let mut sheet = Worksheet::default();
        sheet.insert(cell(0, 0, CellValue::Number(1.), 0));
        sheet.insert(cell(1, 1, CellValue::Empty, 1));
        sheet.merges.push(Dimensions::new((0, 0), (1, 1)));
        let mut boxed = ResolvedStyle::default();
        boxed.border.right = Some(BorderSide::new(BorderStyle::Medium, None));
        boxed.border.bottom = Some(BorderSide::new(BorderStyle::Thick, Some(Rgb::new(0, 0, 255))));
        let styles = vec![ResolvedStyle::default(), boxed];
        let grid = Grid::new(&sheet, &styles, OverlayMap::new()).unwrap();
        assert_eq!(
            grid.paint(0, 0).border_css(),
            " border-right: 2px solid #000000; border-bottom: 3px solid #0000FF;"
        );
        assert!(grid.is_styled(1, 1));
        assert!(!grid.is_styled(0, 0));
    }

    #[test]
    fn test_sizes() {
        assert_eq!(column_width_px(Some(12.5)), 87);
        assert_eq!(column_width_px(None), 60);
        assert_eq!(row_height_px(15.), 19);
        assert_eq!(row_height_px(30.), 39);
    }
}
