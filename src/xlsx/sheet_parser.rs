// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::io::BufRead;

use log::warn;
use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    name::QName,
    Reader,
};

use super::cf_parser::{merge_extensions, read_conditional_formatting};
use super::{
    get_attribute, get_dimension, get_row, get_row_column, read_rich_text, read_text, XlsxError,
    MAX_COLUMNS,
};
use crate::shared_strings::RichText;
use crate::theme::ThemeColors;
use crate::worksheet::{Cell, CellValue, Worksheet};

/// Reads a worksheet part: dimension, column widths, rows and cells, merges,
/// page header and footer, the drawing reference and conditional formatting.
pub(crate) fn read_worksheet<RS: BufRead>(
    xml: &mut Reader<RS>,
    theme: &ThemeColors,
) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::default();
    let mut main_formats = Vec::new();
    let mut ext_formats = Vec::new();
    let mut row = 0u32;
    let mut next_row = 0u32;
    let mut col = 0u32;
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"worksheet" | b"sheetData" | b"cols" | b"mergeCells" | b"headerFooter"
                | b"extLst" | b"ext" | b"conditionalFormattings" => (),
                b"dimension" => {
                    if let Some(range) = get_attribute(e.attributes(), QName(b"ref"))? {
                        match get_dimension(range) {
                            Ok(d) => sheet.dimension = Some(d),
                            Err(err) => warn!("invalid sheet dimension: {err}"),
                        }
                    }
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
                b"col" => {
                    read_column(e, &mut sheet)?;
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
                b"row" => {
                    row = match get_attribute(e.attributes(), QName(b"r"))? {
                        Some(r) => get_row(r)?,
                        None => next_row,
                    };
                    next_row = row.saturating_add(1);
                    col = 0;
                    if let Some(ht) = get_attribute(e.attributes(), QName(b"ht"))? {
                        match fast_float2::parse::<f64, _>(ht) {
                            Ok(ht) => {
                                sheet.row_heights.insert(row, ht);
                            }
                            Err(_) => warn!("invalid height of row {}", row + 1),
                        }
                    }
                }
                b"c" => {
                    let cell = read_cell(xml, e, (row, col), theme)?;
                    col = cell.column.saturating_add(1);
                    sheet.insert(cell);
                }
                b"mergeCell" => {
                    if let Some(range) = get_attribute(e.attributes(), QName(b"ref"))? {
                        match get_dimension(range) {
                            Ok(d) => sheet.merges.push(d),
                            Err(err) => warn!("invalid merge range: {err}"),
                        }
                    }
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
                b"oddHeader" => sheet.header = Some(read_text(xml, e.name())?),
                b"oddFooter" => sheet.footer = Some(read_text(xml, e.name())?),
                b"drawing" => {
                    if let Some(id) = get_attribute(e.attributes(), QName(b"r:id"))? {
                        sheet.drawing_rel = Some(xml.decoder().decode(id)?.into_owned());
                    }
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
                b"conditionalFormatting" => {
                    let parsed = read_conditional_formatting(xml, e, theme)?;
                    if parsed.extension {
                        ext_formats.push(parsed.group);
                    } else {
                        main_formats.push(parsed.group);
                    }
                }
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"worksheet" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    sheet.conditional_formats = merge_extensions(main_formats, ext_formats);
    Ok(sheet)
}

/// `<col min max width>`: the width applies to every column of the span
fn read_column(e: &BytesStart<'_>, sheet: &mut Worksheet) -> Result<(), XlsxError> {
    let mut min = None;
    let mut max = None;
    let mut width = None;
    for a in e.attributes() {
        match a.map_err(XlsxError::XmlAttr)? {
            Attribute {
                key: QName(b"min"),
                value: v,
            } => min = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"max"),
                value: v,
            } => max = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"width"),
                value: v,
            } => width = fast_float2::parse::<f64, _>(&*v).ok(),
            _ => (),
        }
    }
    let (Some(min), Some(width)) = (min, width) else {
        return Ok(());
    };
    let max = max.unwrap_or(min).min(MAX_COLUMNS);
    for c in min.max(1)..=max {
        sheet.column_widths.insert(c - 1, width);
    }
    Ok(())
}

/// Reads a `<c>` element up to its closing tag. A cell without `r` takes
/// the position following the previous cell of the row.
fn read_cell<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    next: (u32, u32),
    theme: &ThemeColors,
) -> Result<Cell, XlsxError> {
    let mut pos = next;
    let mut style = 0;
    let mut cell_type = None;
    for a in start.attributes() {
        match a.map_err(XlsxError::XmlAttr)? {
            Attribute {
                key: QName(b"r"),
                value: v,
            } => pos = get_row_column(&v)?,
            Attribute {
                key: QName(b"s"),
                value: v,
            } => style = atoi_simd::parse::<usize>(&v).unwrap_or(0),
            Attribute {
                key: QName(b"t"),
                value: v,
            } => cell_type = Some(v.into_owned()),
            _ => (),
        }
    }

    let mut value = CellValue::Empty;
    let mut buf = Vec::with_capacity(64);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"v" => {
                    let raw = read_text(xml, e.name())?;
                    value = parse_value(cell_type.as_deref(), raw)?;
                }
                b"is" => value = CellValue::Text(read_rich_text(xml, e.name(), theme)?),
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("c")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(Cell {
        row: pos.0,
        column: pos.1,
        value,
        style,
    })
}

/// Interprets the cached `<v>` value according to the `t` attribute
fn parse_value(cell_type: Option<&[u8]>, raw: String) -> Result<CellValue, XlsxError> {
    let value = match cell_type {
        Some(b"s") => {
            let idx = atoi_simd::parse::<usize>(raw.trim().as_bytes())
                .map_err(|_| XlsxError::Unexpected("shared string index"))?;
            CellValue::Shared(idx)
        }
        Some(b"b") => CellValue::Bool(raw.trim() != "0"),
        Some(b"e") => CellValue::Error(raw),
        Some(b"str" | b"inlineStr" | b"d") => CellValue::Text(RichText::plain(raw)),
        None | Some(b"n") => {
            if raw.is_empty() {
                CellValue::Empty
            } else {
                match fast_float2::parse::<f64, _>(raw.trim()) {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => {
                        warn!("non numeric value {raw:?} in a number cell");
                        CellValue::Text(RichText::plain(raw))
                    }
                }
            }
        }
        Some(t) => {
            let t = String::from_utf8_lossy(t).into_owned();
            return Err(XlsxError::CellTAttribute(t));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional_formatting::ConditionalFormatType;
    use crate::style::Font;
    use crate::worksheet::Dimensions;
    use crate::xlsx::configure_reader;

    fn read(xml: &str) -> Worksheet {
        let mut reader = configure_reader(xml.as_bytes());
        read_worksheet(&mut reader, &ThemeColors::default()).unwrap()
    }

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <dimension ref="A1:C3"/>
  <sheetViews><sheetView workbookViewId="0"/></sheetViews>
  <cols><col min="1" max="2" width="12.5" customWidth="1"/><col min="3" max="3" width="4"/></cols>
  <sheetData>
    <row r="1" ht="30" customHeight="1">
      <c r="A1"><v>5</v></c>
      <c r="B1" t="b"><v>1</v></c>
      <c r="C1" s="2" t="str"><f>"a"&amp;"b"</f><v>ab</v></c>
    </row>
    <row r="2">
      <c r="B2" s="1" t="s"><v>0</v></c>
      <c r="C2" t="inlineStr"><is><r><rPr><b/></rPr><t>x</t></r><r><t>y</t></r></is></c>
    </row>
    <row r="3"><c s="3"/><c t="e"><v>#DIV/0!</v></c></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="B2:C3"/></mergeCells>
  <conditionalFormatting sqref="A1:C3">
    <cfRule type="cellIs" dxfId="0" priority="1" operator="greaterThan"><formula>0</formula></cfRule>
  </conditionalFormatting>
  <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
  <headerFooter><oddHeader>&amp;L&amp;"Arial,Bold"Left&amp;CCenter</oddHeader><oddFooter>&amp;RPage &amp;P</oddFooter></headerFooter>
  <drawing r:id="rId1"/>
</worksheet>"#;

    #[test]
    fn test_read_worksheet() {
        let sheet = read(SHEET);
        assert_eq!(sheet.dimension, Some(Dimensions::new((0, 0), (2, 2))));
        assert_eq!(sheet.column_widths.get(&0), Some(&12.5));
        assert_eq!(sheet.column_widths.get(&1), Some(&12.5));
        assert_eq!(sheet.column_widths.get(&2), Some(&4.));
        assert_eq!(sheet.row_heights.get(&0), Some(&30.));
        assert_eq!(sheet.row_heights.get(&1), None);

        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Number(5.));
        assert_eq!(sheet.cell(0, 1).unwrap().value, CellValue::Bool(true));
        assert_eq!(
            sheet.cell(0, 2).unwrap().value,
            CellValue::Text(RichText::plain("ab"))
        );
        assert_eq!(sheet.cell(0, 2).unwrap().style, 2);
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Shared(0));
        let CellValue::Text(inline) = &sheet.cell(1, 2).unwrap().value else {
            panic!("expected inline text");
        };
        assert_eq!(inline.text(), "xy");
        assert_eq!(inline.runs()[0].font, Some(Font::new().with_bold(true)));

        // cells without a reference follow each other
        let styled = sheet.cell(2, 0).unwrap();
        assert!(styled.is_empty());
        assert_eq!(styled.style, 3);
        assert_eq!(
            sheet.cell(2, 1).unwrap().value,
            CellValue::Error("#DIV/0!".to_string())
        );

        assert_eq!(sheet.merges, vec![Dimensions::new((1, 1), (2, 2))]);
        assert_eq!(
            sheet.header.as_deref(),
            Some("&L&\"Arial,Bold\"Left&CCenter")
        );
        assert_eq!(sheet.footer.as_deref(), Some("&RPage &P"));
        assert_eq!(sheet.drawing_rel.as_deref(), Some("rId1"));
        assert_eq!(sheet.conditional_formats.len(), 1);
        assert!(matches!(
            sheet.conditional_formats[0].rules[0].rule_type,
            ConditionalFormatType::CellIs { .. }
        ));
    }

    #[test]
    fn test_invalid_cell_type() {
        let mut reader = configure_reader(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="zz"><v>1</v></c></row></sheetData></worksheet>"#
                .as_bytes(),
        );
        assert!(matches!(
            read_worksheet(&mut reader, &ThemeColors::default()),
            Err(XlsxError::CellTAttribute(_))
        ));
    }

    #[test]
    fn test_empty_worksheet() {
        let sheet = read(r#"<worksheet><sheetData/></worksheet>"#);
        assert!(sheet.is_blank());
        assert_eq!(sheet.dimension, None);
    }
}
