// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Html output of a laid out sheet

use log::warn;

use crate::formats::format_number;
use crate::grid::{CellPaint, Grid, ValueKind, GRID_BOTTOM, GRID_RIGHT};
use crate::header_footer::{HeaderContext, HeaderFooter};
use crate::options::{ColumnWidthMode, LayoutMode, RenderOptions};
use crate::shared_strings::SharedStrings;
use crate::style::{Font, ResolvedStyle};
use crate::theme::ThemeColors;
use crate::utils::escape_html;
use crate::worksheet::{Cell, CellValue};
use crate::xlsx::{column_number_to_name, coordinate_to_name};

const TABLE_STYLE: &str = " border-collapse: separate; border-spacing: 0px; margin-left: auto; margin-right: auto;";

/// Wraps the number under a data bar
const BAR_TEXT: &str = "<div style='position: relative; bottom: 15px; margin-bottom: -15px;'>";

/// Separator following every rendered sheet
pub const SHEET_SEPARATOR: &str = "<br>&nbsp;<br>";

/// Document level data shared by every sheet of a rendering
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    /// Shared text table
    pub strings: &'a SharedStrings,
    /// Theme palette
    pub theme: &'a ThemeColors,
    /// Document default font
    pub default_font: &'a Font,
    /// File name, for the `&F` header field
    pub file_name: &'a str,
    /// Options
    pub options: &'a RenderOptions,
}

/// One sheet to render
#[derive(Debug, Clone, Copy)]
pub struct SheetContext<'a> {
    /// Sheet name
    pub name: &'a str,
    /// `src` of each image anchor of the sheet, `None` when not displayable
    pub images: &'a [Option<String>],
}

/// Wraps the rendered sheets
pub fn document(body: &str) -> String {
    format!("<div style=' text-align:center;'>{body}</div>")
}

/// Notice shown in place of a sheet number out of range
pub fn missing_sheet(number: usize) -> String {
    format!("<h2>Sheet {number} of this Excel spreadsheet does not exist.</h2>")
}

/// Renders a sheet: heading or header, table, footer and separator
pub fn render_sheet(grid: &Grid<'_>, doc: &Document<'_>, sheet: &SheetContext<'_>) -> String {
    let mut html = String::new();
    let header_footer = |markup: &Option<String>| {
        let context = HeaderContext {
            sheet_name: sheet.name,
            file_name: doc.file_name,
        };
        markup
            .as_deref()
            .and_then(|m| HeaderFooter::parse(m, doc.default_font, doc.theme, &context).to_html())
    };
    match doc.options.layout {
        LayoutMode::Print => {
            if let Some(header) = header_footer(&grid.sheet().header) {
                html.push_str(&header);
            }
        }
        LayoutMode::Spreadsheet => {
            html.push_str(&format!(
                "<h2>Sheet name - '{}'</h2>",
                escape_html(sheet.name)
            ));
        }
    }
    html.push_str(&render_table(grid, doc, sheet));
    if doc.options.layout == LayoutMode::Print {
        if let Some(footer) = header_footer(&grid.sheet().footer) {
            html.push_str(&footer);
        }
    }
    html.push_str(SHEET_SEPARATOR);
    html
}

/// Renders the table of a sheet
pub fn render_table(grid: &Grid<'_>, doc: &Document<'_>, sheet: &SheetContext<'_>) -> String {
    let spreadsheet = doc.options.layout == LayoutMode::Spreadsheet;
    let replicate = doc.options.column_widths == ColumnWidthMode::Replicate;
    let reference = format!(
        "{}{} background-color: LightGray; text-align:center;",
        doc.default_font.family_css(),
        doc.default_font.size_css()
    );
    let range = grid.range;

    let mut html = format!("<table style='{GRID_RIGHT}{GRID_BOTTOM}{TABLE_STYLE}'>");

    // column references, or an empty sizing row
    html.push_str("<tr>");
    if spreadsheet {
        html.push_str(&format!(
            "<td style='{reference}border:1px solid Gray; min-width:20px;'>&nbsp;</td>"
        ));
    } else {
        html.push_str("<td></td>");
    }
    for col in range.start.1..=range.end.1 {
        let name = column_number_to_name(col)
            .map(|n| String::from_utf8_lossy(&n).into_owned())
            .unwrap_or_default();
        let width = grid.column_width_px(col);
        html.push_str(&match (spreadsheet, replicate) {
            (false, true) => format!(
                "<td style='min-width:{width}px; max-width:{width}px; border-bottom: 1px solid LightGray'>&nbsp;</td>"
            ),
            (false, false) => "<td style='border-bottom: 1px solid LightGray'>&nbsp;</td>".to_string(),
            (true, true) => format!(
                "<td style='{reference}border-top:1px solid Gray; border-right:1px solid Gray; border-bottom:1px solid Gray; min-width:{width}px; max-width:{width}px;'>{name}</td>"
            ),
            (true, false) => format!(
                "<td style='{reference}border-top:1px solid Gray; border-right:1px solid Gray; border-bottom:1px solid Gray;'>&nbsp;{name}&nbsp;</td>"
            ),
        });
    }
    html.push_str("</tr>\n");

    let plain = CellPaint::new(&ResolvedStyle::default(), None);
    for row in range.start.0..=range.end.0 {
        let height = grid
            .row_height_px(row)
            .filter(|_| replicate)
            .map(|h| format!(" height:{h}px;"))
            .unwrap_or_default();
        if spreadsheet {
            html.push_str(&format!(
                "<tr><td style='{reference}border-left:1px solid Gray; border-bottom:1px solid Gray; border-right:1px solid Gray; vertical-align:bottom;{height}'>{}</td>",
                row + 1
            ));
        } else {
            html.push_str(&format!(
                "<tr><td style='border-right: 1px solid LightGray;{height}'></td>"
            ));
        }
        for col in range.start.1..=range.end.1 {
            if grid.geometry.is_covered(row, col) {
                continue;
            }
            let span = grid.geometry.span(row, col);
            let attrs = span.map(|s| s.attributes()).unwrap_or_default();
            let paint = grid.paint(row, col);

            let image = span
                .and_then(|s| s.image)
                .and_then(|i| Some((grid.sheet().images.get(i)?, sheet.images.get(i)?.as_ref()?)));
            if let Some((anchor, src)) = image {
                let border = if paint == plain {
                    format!("{GRID_RIGHT}{GRID_BOTTOM}")
                } else {
                    paint.border_css()
                };
                html.push_str(&format!(
                    "<td{attrs} style='{border}'><img src='{}' style='width:{}px; height:{}px; padding:5px 5px 5px 5px;' /></td>",
                    escape_html(src),
                    anchor.width_px,
                    anchor.height_px
                ));
                continue;
            }

            match grid.cell(row, col).filter(|c| !c.is_empty()) {
                Some(cell) => html.push_str(&render_cell(cell, &paint, &attrs, doc.strings)),
                None if paint == plain => html.push_str(&format!(
                    "<td{attrs} style='{GRID_RIGHT}{GRID_BOTTOM}'>&nbsp;</td>"
                )),
                None => html.push_str(&format!(
                    "<td{attrs} style='{}'>&nbsp;</td>",
                    paint.cell_css(ValueKind::Text)
                )),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    html
}

/// A cell with a value
fn render_cell(cell: &Cell, paint: &CellPaint, attrs: &str, strings: &SharedStrings) -> String {
    let kind = ValueKind::of(&cell.value);
    let mut font = paint.font.clone();
    let content = match &cell.value {
        CellValue::Number(n) => {
            let formatted = format_number(&paint.number_format, *n);
            if let Some(color) = formatted.color {
                font.color = Some(color);
            }
            match formatted.accounting {
                Some(a) => format!(
                    "<div style='float:left;'>&nbsp;{}</div><div style='float:right;'>{}&nbsp;</div>",
                    escape_html(&a.lead),
                    escape_html(&a.amount)
                ),
                None => escape_html(&formatted.text).into_owned(),
            }
        }
        CellValue::Shared(_) | CellValue::Text(_) => match cell.rich_text(strings) {
            Some(text) if paint.hyperlink => {
                let target = text.text();
                let target = escape_html(&target);
                format!("<a href='{target}'>{target}</a>")
            }
            Some(text) => text.to_html(),
            None => {
                let name = coordinate_to_name((cell.row, cell.column))
                    .map(|n| String::from_utf8_lossy(&n).into_owned())
                    .unwrap_or_default();
                warn!("cell {name}: missing shared text {:?}", cell.value);
                String::new()
            }
        },
        CellValue::Bool(_) | CellValue::Error(_) => cell
            .text(strings)
            .map(|t| escape_html(&t).into_owned())
            .unwrap_or_default(),
        CellValue::Empty => "&nbsp;".to_string(),
    };
    let content = match &paint.data_bar {
        Some(bar) if kind == ValueKind::Number => {
            format!("{}{BAR_TEXT}{content}</div>", bar.to_html())
        }
        _ => content,
    };
    format!(
        "<td{attrs} style='{}'><span style='{}'>{content}</span></td>",
        paint.cell_css(kind),
        font.css()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional_formatting::{ConditionalOverlay, OverlayMap};
    use crate::options::RenderOptions;
    use crate::shared_strings::RichText;
    use crate::worksheet::{Dimensions, Worksheet};

    fn number(row: u32, column: u32, n: f64, style: usize) -> Cell {
        Cell {
            row,
            column,
            value: CellValue::Number(n),
            style,
        }
    }

    fn render(sheet: &Worksheet, styles: &[ResolvedStyle], overlays: OverlayMap, options: &RenderOptions) -> String {
        let strings = SharedStrings::new(vec![RichText::plain("http://example.com/?a&b")]);
        let theme = ThemeColors::default();
        let font = Font::new().with_name("Calibri").with_size(13.);
        let doc = Document {
            strings: &strings,
            theme: &theme,
            default_font: &font,
            file_name: "book.xlsx",
            options,
        };
        let grid = Grid::new(sheet, styles, overlays).unwrap();
        render_sheet(&grid, &doc, &SheetContext { name: "Data", images: &[] })
    }

    #[test]
    fn test_render_number_cell() {
        let mut sheet = Worksheet::default();
        sheet.insert(number(0, 0, 3.14159, 1));
        let styles = vec![
            ResolvedStyle::default(),
            ResolvedStyle {
                number_format: "0.00".to_string(),
                ..Default::default()
            },
        ];
        let html = render(&sheet, &styles, OverlayMap::new(), &RenderOptions::new());
        assert_eq!(
            html,
            "<table style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray; border-collapse: separate; border-spacing: 0px; margin-left: auto; margin-right: auto;'>\
             <tr><td></td><td style='min-width:60px; max-width:60px; border-bottom: 1px solid LightGray'>&nbsp;</td></tr>\n\
             <tr><td style='border-right: 1px solid LightGray;'></td>\
             <td style=' border-right:1px solid LightGray; border-bottom:1px solid LightGray; vertical-align:bottom; text-align:right;'><span style=''>3.14</span></td></tr>\n\
             </table><br>&nbsp;<br>"
        );
    }

    #[test]
    fn test_render_spreadsheet_layout() {
        let mut sheet = Worksheet::default();
        sheet.insert(number(1, 1, 1., 0));
        sheet.header = Some("&CTitle".to_string());
        sheet.row_heights.insert(1, 30.);
        let options: RenderOptions = "AAS".parse().unwrap();
        let html = render(&sheet, &[ResolvedStyle::default()], OverlayMap::new(), &options);
        assert!(html.starts_with("<h2>Sheet name - 'Data'</h2><table"));
        assert!(!html.contains("Title"));
        assert!(html.contains(">&nbsp;B&nbsp;</td></tr>\n"));
        // auto widths do not replicate row heights either
        assert!(html.contains("vertical-align:bottom;'>2</td>"));
    }

    #[test]
    fn test_render_header_and_merge() {
        let mut sheet = Worksheet::default();
        sheet.insert(number(0, 0, 1., 0));
        sheet.merges.push(Dimensions::new((0, 0), (1, 1)));
        sheet.header = Some("&CTitle".to_string());
        sheet.row_heights.insert(0, 30.);
        let html = render(&sheet, &[ResolvedStyle::default()], OverlayMap::new(), &RenderOptions::new());
        assert!(html.starts_with("<table width='100%'><tr><td style='text-align:center; '>"));
        assert!(html.contains("<tr><td style='border-right: 1px solid LightGray; height:39px;'></td><td colspan='2' rowspan='2' style="));
        // the second row only holds its gutter
        assert!(html.contains("<tr><td style='border-right: 1px solid LightGray;'></td></tr>\n"));
    }

    #[test]
    fn test_render_overlay_and_hyperlink() {
        let mut sheet = Worksheet::default();
        sheet.insert(number(0, 0, 5., 0));
        sheet.insert(Cell {
            row: 0,
            column: 1,
            value: CellValue::Shared(0),
            style: 1,
        });
        let mut overlays = OverlayMap::new();
        overlays.insert(
            (0, 0),
            ConditionalOverlay {
                fill: Some(crate::color::Rgb::new(255, 0, 0)),
                ..Default::default()
            },
        );
        let styles = vec![
            ResolvedStyle::default(),
            ResolvedStyle {
                hyperlink: true,
                ..Default::default()
            },
        ];
        let html = render(&sheet, &styles, overlays, &RenderOptions::new());
        assert!(html.contains(
            "<td style=' background-color: #FF0000; vertical-align:bottom; text-align:right;'><span style=''>5</span></td>"
        ));
        assert!(html.contains(
            "<a href='http://example.com/?a&amp;b'>http://example.com/?a&amp;b</a>"
        ));
    }
}
