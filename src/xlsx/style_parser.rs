// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Parser of the workbook stylesheet (`xl/styles.xml`).
//!
//! Each section (`fonts`, `fills`, `borders`, `cellXfs`, `cellStyles`, `dxfs`)
//! is read by its own small state machine. Colors are resolved against the
//! theme as soon as they are read.

use std::io::BufRead;

use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    name::QName,
    Reader,
};

use super::{attribute_value, get_attribute, XlsxError};
use crate::color::{ColorRef, Rgb};
use crate::style::{
    Border, BorderSide, BorderStyle, CellFormat, DifferentialFormat, Fill, Font,
    HorizontalAlignment, Script, Side, Stylesheet, Underline, VerticalAlignment,
};
use crate::theme::ThemeColors;

/// Which pattern color carries the background of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FillLayer {
    /// Cell fills use the pattern foreground
    Cell,
    /// Differential fills use the pattern background
    Differential,
}

/// Reads the whole stylesheet
pub(crate) fn read_stylesheet<RS: BufRead>(
    xml: &mut Reader<RS>,
    theme: &ThemeColors,
) -> Result<Stylesheet, XlsxError> {
    let mut styles = Stylesheet::default();
    let mut buf = Vec::with_capacity(1024);
    let mut inner_buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"styleSheet" => (),
                b"numFmts" => read_number_formats(xml, &mut styles)?,
                b"fonts" => {
                    styles.fonts = read_section(xml, "fonts", b"font", |xml, e| {
                        parse_font(xml, e, theme)
                    })?
                }
                b"fills" => {
                    styles.fills = read_section(xml, "fills", b"fill", |xml, _| {
                        parse_fill(xml, theme, FillLayer::Cell)
                    })?
                }
                b"borders" => {
                    styles.borders = read_section(xml, "borders", b"border", |xml, e| {
                        parse_border(xml, e, theme)
                    })?
                }
                b"cellXfs" => styles.cell_formats = read_section(xml, "cellXfs", b"xf", parse_xf)?,
                b"cellStyles" => {
                    let names = read_section(xml, "cellStyles", b"cellStyle", |xml, e| {
                        let xf_id = get_attribute(e.attributes(), QName(b"xfId"))?
                            .and_then(|v| atoi_simd::parse::<usize>(v).ok());
                        let name = attribute_value(e, b"name", xml.decoder())?;
                        xml.read_to_end_into(e.name(), &mut Vec::new())?;
                        Ok(xf_id.zip(name))
                    })?;
                    styles.cell_style_names = names.into_iter().flatten().collect();
                }
                b"dxfs" => {
                    styles.dxfs = read_section(xml, "dxfs", b"dxf", |xml, e| {
                        parse_dxf(xml, e, theme)
                    })?
                }
                _ => {
                    inner_buf.clear();
                    xml.read_to_end_into(e.name(), &mut inner_buf)?;
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"styleSheet" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(styles)
}

/// Reads every `item` element of a section with `parse`, which must consume
/// the item up to its closing tag
fn read_section<RS, T, F>(
    xml: &mut Reader<RS>,
    section: &'static str,
    item: &[u8],
    mut parse: F,
) -> Result<Vec<T>, XlsxError>
where
    RS: BufRead,
    F: FnMut(&mut Reader<RS>, &BytesStart<'_>) -> Result<T, XlsxError>,
{
    let mut items = Vec::new();
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == item => {
                items.push(parse(xml, e)?);
            }
            Ok(Event::Start(ref e)) => {
                xml.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == section.as_bytes() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof(section)),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(items)
}

fn read_number_formats<RS: BufRead>(
    xml: &mut Reader<RS>,
    styles: &mut Stylesheet,
) -> Result<(), XlsxError> {
    let formats = read_section(xml, "numFmts", b"numFmt", |xml, e| {
        let mut id = None;
        let mut code = None;
        for a in e.attributes() {
            let a = a.map_err(XlsxError::XmlAttr)?;
            match a.key {
                QName(b"numFmtId") => id = atoi_simd::parse::<u32>(&a.value).ok(),
                QName(b"formatCode") => {
                    code = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned())
                }
                _ => (),
            }
        }
        xml.read_to_end_into(e.name(), &mut Vec::new())?;
        Ok(id.zip(code))
    })?;
    styles.number_formats.extend(formats.into_iter().flatten());
    Ok(())
}

/// Reads the `rgb`, `theme`, `tint` and `indexed` attributes of a color element
pub(crate) fn read_color_ref(e: &BytesStart<'_>) -> Result<ColorRef, XlsxError> {
    let mut rgb = None;
    let mut theme = None;
    let mut tint = None;
    let mut indexed = None;
    for a in e.attributes() {
        match a.map_err(XlsxError::XmlAttr)? {
            Attribute {
                key: QName(b"rgb"),
                value: v,
            } => rgb = std::str::from_utf8(&v).ok().map(str::to_owned),
            Attribute {
                key: QName(b"theme"),
                value: v,
            } => theme = atoi_simd::parse::<u32>(&v).ok(),
            Attribute {
                key: QName(b"tint"),
                value: v,
            } => tint = fast_float2::parse::<f64, _>(&*v).ok(),
            Attribute {
                key: QName(b"indexed"),
                value: v,
            } => indexed = atoi_simd::parse::<u32>(&v).ok(),
            _ => (),
        }
    }
    Ok(ColorRef::from_parts(rgb.as_deref(), theme, tint, indexed))
}

/// Boolean `val` attribute of a flag element: absent means set
fn flag(e: &BytesStart<'_>) -> Result<bool, XlsxError> {
    Ok(!matches!(
        get_attribute(e.attributes(), QName(b"val"))?,
        Some(b"0") | Some(b"false")
    ))
}

/// Parses a `<font>` (or a rich text `<rPr>`) up to its closing tag
pub(crate) fn parse_font<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<Font, XlsxError> {
    let mut font = Font::new();
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"b" => font.bold = Some(flag(e)?),
                b"i" => font.italic = Some(flag(e)?),
                b"strike" => font.strike = Some(flag(e)?),
                b"u" => {
                    let val = attribute_value(e, b"val", xml.decoder())?;
                    font.underline = Underline::from_val(val.as_deref());
                }
                b"vertAlign" => {
                    font.script = match get_attribute(e.attributes(), QName(b"val"))? {
                        Some(b"superscript") => Some(Script::Superscript),
                        Some(b"subscript") => Some(Script::Subscript),
                        _ => None,
                    }
                }
                b"sz" => {
                    font.size = get_attribute(e.attributes(), QName(b"val"))?
                        .and_then(|v| fast_float2::parse::<f64, _>(v).ok())
                }
                b"color" => font.color = read_color_ref(e)?.resolve(theme),
                b"name" | b"rFont" => font.name = attribute_value(e, b"val", xml.decoder())?,
                _ => (),
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("font")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(font)
}

/// Parser position inside a `<fill>`
enum FillState {
    Idle,
    Pattern,
    GradientStop,
}

/// Parses a `<fill>` up to its closing tag. Only solid colors are kept: the
/// pattern color of the requested layer (the other one if it is missing) or
/// the first gradient stop.
pub(crate) fn parse_fill<RS: BufRead>(
    xml: &mut Reader<RS>,
    theme: &ThemeColors,
    layer: FillLayer,
) -> Result<Fill, XlsxError> {
    let mut state = FillState::Idle;
    let mut no_pattern = false;
    let mut foreground = None;
    let mut background = None;
    let mut gradient = None;
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let in_pattern = matches!(state, FillState::Pattern);
                let in_stop = matches!(state, FillState::GradientStop);
                match e.local_name().as_ref() {
                    b"patternFill" => {
                        no_pattern = matches!(
                            get_attribute(e.attributes(), QName(b"patternType"))?,
                            Some(b"none")
                        );
                        state = FillState::Pattern;
                    }
                    b"fgColor" if in_pattern => foreground = read_color_ref(e)?.resolve(theme),
                    b"bgColor" if in_pattern => background = read_color_ref(e)?.resolve(theme),
                    b"stop" => state = FillState::GradientStop,
                    b"color" if in_stop && gradient.is_none() => {
                        gradient = read_color_ref(e)?.resolve(theme)
                    }
                    _ => (),
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"patternFill" | b"stop" => state = FillState::Idle,
                b"fill" => break,
                _ => (),
            },
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("fill")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    if no_pattern {
        return Ok(Fill::default());
    }
    let color = match layer {
        FillLayer::Cell => foreground.or(background),
        FillLayer::Differential => background.or(foreground),
    };
    Ok(Fill {
        color: color.or(gradient),
    })
}

/// Parser position inside a `<border>`
enum BorderState {
    Idle,
    Side {
        side: Side,
        style: Option<BorderStyle>,
        color: Option<Rgb>,
    },
    Diagonal,
}

fn side_of(tag: &[u8]) -> Option<Side> {
    match tag {
        b"left" | b"start" => Some(Side::Left),
        b"right" | b"end" => Some(Side::Right),
        b"top" => Some(Side::Top),
        b"bottom" => Some(Side::Bottom),
        _ => None,
    }
}

/// Parses a `<border>` up to its closing tag
pub(crate) fn parse_border<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<Border, XlsxError> {
    let mut border = Border::new();
    for a in start.attributes() {
        match a.map_err(XlsxError::XmlAttr)? {
            Attribute {
                key: QName(b"diagonalUp"),
                value: v,
            } => border.diagonal_up = matches!(&*v, b"1" | b"true"),
            Attribute {
                key: QName(b"diagonalDown"),
                value: v,
            } => border.diagonal_down = matches!(&*v, b"1" | b"true"),
            _ => (),
        }
    }
    let mut state = BorderState::Idle;
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = e.local_name();
                if let Some(side) = side_of(tag.as_ref()) {
                    let style = match get_attribute(e.attributes(), QName(b"style"))? {
                        Some(s) => std::str::from_utf8(s).ok().and_then(BorderStyle::from_name),
                        None => None,
                    };
                    state = BorderState::Side {
                        side,
                        style,
                        color: None,
                    };
                } else if tag.as_ref() == b"diagonal" {
                    state = BorderState::Diagonal;
                } else if tag.as_ref() == b"color" {
                    let resolved = read_color_ref(e)?.resolve(theme);
                    match &mut state {
                        BorderState::Side { color, .. } => *color = resolved,
                        BorderState::Diagonal => border.diagonal_color = resolved,
                        BorderState::Idle => (),
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = e.local_name();
                if tag.as_ref() == b"border" {
                    break;
                }
                if let BorderState::Side { side, style, color } = state {
                    if side_of(tag.as_ref()) == Some(side) {
                        if let Some(style) = style {
                            border.set_side(side, Some(BorderSide::new(style, color)));
                        }
                        state = BorderState::Idle;
                    }
                } else if tag.as_ref() == b"diagonal" {
                    state = BorderState::Idle;
                }
            }
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("border")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(border)
}

/// Parses a `<xf>` of `<cellXfs>` up to its closing tag
fn parse_xf<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
) -> Result<CellFormat, XlsxError> {
    let mut format = CellFormat::default();
    for a in start.attributes() {
        match a.map_err(XlsxError::XmlAttr)? {
            Attribute {
                key: QName(b"numFmtId"),
                value: v,
            } => format.num_fmt_id = atoi_simd::parse::<u32>(&v).unwrap_or(0),
            Attribute {
                key: QName(b"fontId"),
                value: v,
            } => format.font_id = atoi_simd::parse::<usize>(&v).unwrap_or(0),
            Attribute {
                key: QName(b"fillId"),
                value: v,
            } => format.fill_id = atoi_simd::parse::<usize>(&v).unwrap_or(0),
            Attribute {
                key: QName(b"borderId"),
                value: v,
            } => format.border_id = atoi_simd::parse::<usize>(&v).unwrap_or(0),
            Attribute {
                key: QName(b"xfId"),
                value: v,
            } => format.xf_id = atoi_simd::parse::<usize>(&v).ok(),
            _ => (),
        }
    }
    let mut buf = Vec::with_capacity(128);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"alignment" => {
                for a in e.attributes() {
                    match a.map_err(XlsxError::XmlAttr)? {
                        Attribute {
                            key: QName(b"horizontal"),
                            value: v,
                        } => {
                            format.horizontal = std::str::from_utf8(&v)
                                .ok()
                                .and_then(HorizontalAlignment::from_name)
                        }
                        Attribute {
                            key: QName(b"vertical"),
                            value: v,
                        } => {
                            format.vertical = std::str::from_utf8(&v)
                                .ok()
                                .and_then(VerticalAlignment::from_name)
                        }
                        _ => (),
                    }
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"xf" => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("xf")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(format)
}

/// Parses a differential format (`<dxf>`, or the inline `<x14:dxf>` of a
/// conditional rule) up to its closing tag
pub(crate) fn parse_dxf<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<DifferentialFormat, XlsxError> {
    let mut dxf = DifferentialFormat::default();
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"font" => dxf.font = Some(parse_font(xml, e, theme)?),
                b"fill" => dxf.fill = Some(parse_fill(xml, theme, FillLayer::Differential)?),
                b"border" => dxf.border = Some(parse_border(xml, e, theme)?),
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("dxf")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(dxf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::configure_reader;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1">
    <numFmt numFmtId="164" formatCode="&quot;£&quot;#,##0.00"/>
  </numFmts>
  <fonts count="3">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/></font>
    <font><b/><i val="0"/><strike val="0"/><u val="doubleAccounting"/><sz val="14"/><color rgb="FFFF0000"/><name val="Helvetica Neue"/></font>
    <font><u/><vertAlign val="superscript"/><color theme="4" tint="-0.249977111117893"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor indexed="13"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1">
      <left style="thin"><color indexed="64"/></left>
      <right style="medium"/>
      <top/>
      <bottom style="double"><color rgb="FF0000FF"/></bottom>
      <diagonal style="thin"><color rgb="FF00FF00"/></diagonal>
    </border>
  </borders>
  <cellStyleXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="0" fontId="2" fillId="0" borderId="0"/>
  </cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1">
      <alignment horizontal="centerContinuous" vertical="center"/>
    </xf>
    <xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="1"/>
  </cellXfs>
  <cellStyles count="2">
    <cellStyle name="Hyperlink" xfId="1" builtinId="8"/>
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="1">
    <dxf>
      <font><b/><color rgb="FF9C0006"/></font>
      <fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill>
    </dxf>
  </dxfs>
</styleSheet>"#;

    fn read(xml: &str) -> Stylesheet {
        let mut reader = configure_reader(xml.as_bytes());
        read_stylesheet(&mut reader, &ThemeColors::office()).unwrap()
    }

    #[test]
    fn test_read_fonts() {
        let styles = read(STYLES);
        assert_eq!(styles.fonts.len(), 3);
        assert_eq!(styles.fonts[0].name.as_deref(), Some("Calibri"));
        assert_eq!(styles.fonts[0].size, Some(11.));
        assert_eq!(styles.fonts[0].color, Some(Rgb::BLACK));

        let bold = &styles.fonts[1];
        assert_eq!(bold.bold, Some(true));
        assert_eq!(bold.italic, Some(false));
        assert!(!bold.is_struck());
        assert_eq!(bold.underline, Some(Underline::DoubleAccounting));
        assert_eq!(bold.color, Some(Rgb::new(255, 0, 0)));
        assert_eq!(bold.family(), Some("Helvetica"));

        let sup = &styles.fonts[2];
        assert_eq!(sup.underline, Some(Underline::Single));
        assert_eq!(sup.script, Some(Script::Superscript));
        assert_eq!(sup.color, Some(Rgb::new(0x4F, 0x81, 0xBD).tint(-0.25)));
    }

    #[test]
    fn test_read_fills() {
        let styles = read(STYLES);
        assert_eq!(styles.fills.len(), 3);
        assert_eq!(styles.fills[0].color, None);
        assert_eq!(styles.fills[1].color, None);
        assert_eq!(styles.fills[2].color, Some(Rgb::new(255, 255, 0)));
    }

    #[test]
    fn test_read_borders() {
        let styles = read(STYLES);
        assert_eq!(styles.borders.len(), 2);
        assert!(styles.borders[0].is_empty());
        let b = &styles.borders[1];
        assert_eq!(
            b.left,
            Some(BorderSide::new(BorderStyle::Thin, Some(Rgb::BLACK)))
        );
        assert_eq!(b.right, Some(BorderSide::new(BorderStyle::Medium, None)));
        assert_eq!(b.top, None);
        assert_eq!(
            b.bottom,
            Some(BorderSide::new(BorderStyle::Double, Some(Rgb::new(0, 0, 255))))
        );
        assert!(b.diagonal_up);
        assert!(!b.diagonal_down);
        assert_eq!(b.diagonal_color, Some(Rgb::new(0, 255, 0)));
    }

    #[test]
    fn test_read_cell_formats() {
        let styles = read(STYLES);
        assert_eq!(styles.cell_formats.len(), 3);
        let xf = &styles.cell_formats[1];
        assert_eq!(xf.num_fmt_id, 164);
        assert_eq!(xf.font_id, 1);
        assert_eq!(xf.fill_id, 2);
        assert_eq!(xf.border_id, 1);
        assert_eq!(xf.horizontal, Some(HorizontalAlignment::CenterContinuous));
        assert_eq!(xf.vertical, Some(VerticalAlignment::Center));
        assert_eq!(styles.number_format(164), "\"£\"#,##0.00");
        assert_eq!(styles.number_format(9), "0%");

        assert!(!styles.resolve(1).hyperlink);
        assert!(styles.resolve(2).hyperlink);
    }

    #[test]
    fn test_read_dxfs() {
        let styles = read(STYLES);
        assert_eq!(styles.dxfs.len(), 1);
        let dxf = &styles.dxfs[0];
        let font = dxf.font.as_ref().unwrap();
        assert!(font.is_bold());
        assert_eq!(font.color, Some(Rgb::new(0x9C, 0x00, 0x06)));
        assert_eq!(dxf.fill, Some(Fill::solid(Rgb::new(0xFF, 0xC7, 0xCE))));
        assert_eq!(dxf.border, None);
    }

    #[test]
    fn test_dxf_font_clears_flags() {
        let styles = read(
            r#"<styleSheet><dxfs count="1"><dxf>
                <font><b val="0"/><strike val="false"/></font>
            </dxf></dxfs></styleSheet>"#,
        );
        let font = styles.dxfs[0].font.as_ref().unwrap();
        assert_eq!(font.bold, Some(false));
        assert_eq!(font.strike, Some(false));
        assert_eq!(font.italic, None);
    }

    #[test]
    fn test_empty_stylesheet() {
        let styles = read(r#"<styleSheet/>"#);
        assert_eq!(styles, Stylesheet::default());
    }
}
