// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Reading of the xlsx package: workbook, theme, shared strings, styles,
//! worksheets and drawings

mod cf_parser;
mod sheet_parser;
mod style_parser;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Seek};

use log::{debug, warn};
use quick_xml::{
    encoding::Decoder,
    events::{
        attributes::{Attribute, Attributes},
        BytesStart, Event,
    },
    name::QName,
    Reader as XmlReader,
};
use zip::read::{ZipArchive, ZipFile};
use zip::result::ZipError;

use crate::color::Rgb;
use crate::shared_strings::{RichText, SharedStrings, TextRun};
use crate::style::Stylesheet;
use crate::theme::{ThemeColors, ThemeRole};
use crate::utils::unescape_entity_to_buffer;
use crate::worksheet::{Dimensions, ImageAnchor, Worksheet};

pub(crate) type XlReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

/// Maximum number of rows allowed in an xlsx file
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns allowed in an xlsx file
pub const MAX_COLUMNS: u32 = 16_384;

/// English Metric Units per rendered pixel for drawing extents
const EMU_PER_PIXEL: f64 = 9000.;

/// An enum for Xlsx specific errors
#[derive(Debug)]
pub enum XlsxError {
    /// Io error
    Io(std::io::Error),
    /// Zip error
    Zip(zip::result::ZipError),
    /// Xml error
    Xml(quick_xml::Error),
    /// Xml attribute error
    XmlAttr(quick_xml::events::attributes::AttrError),
    /// XML Encoding error
    Encoding(quick_xml::encoding::EncodingError),
    /// Unexpected end of xml
    XmlEof(&'static str),
    /// File not found
    FileNotFound(String),
    /// Relationship not found
    RelationshipNotFound,
    /// Expecting alphanumeric character
    Alphanumeric(u8),
    /// Numeric column
    NumericColumn(u8),
    /// Wrong dimension count
    DimensionCount(usize),
    /// Cell 't' attribute error
    CellTAttribute(String),
    /// There is no column component in the range string
    RangeWithoutColumnComponent,
    /// There is no row component in the range string
    RangeWithoutRowComponent,
    /// Unexpected error
    Unexpected(&'static str),
    /// Worksheet not found
    WorksheetNotFound(String),
}

from_err!(std::io::Error, XlsxError, Io);
from_err!(zip::result::ZipError, XlsxError, Zip);
from_err!(quick_xml::Error, XlsxError, Xml);
from_err!(quick_xml::events::attributes::AttrError, XlsxError, XmlAttr);
from_err!(quick_xml::encoding::EncodingError, XlsxError, Encoding);

impl std::fmt::Display for XlsxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlsxError::Io(e) => write!(f, "I/O error: {e}"),
            XlsxError::Zip(e) => write!(f, "Zip error: {e}"),
            XlsxError::Xml(e) => write!(f, "Xml error: {e}"),
            XlsxError::XmlAttr(e) => write!(f, "Xml attribute error: {e}"),
            XlsxError::Encoding(e) => write!(f, "XML encoding error: {e}"),
            XlsxError::XmlEof(e) => write!(f, "Unexpected end of xml, expecting '</{e}>'"),
            XlsxError::FileNotFound(e) => write!(f, "File not found '{e}'"),
            XlsxError::RelationshipNotFound => write!(f, "Relationship not found"),
            XlsxError::Alphanumeric(e) => {
                write!(f, "Expecting alphanumeric character, got {e:X}")
            }
            XlsxError::NumericColumn(e) => write!(
                f,
                "Numeric character is not allowed for column name, got {e}",
            ),
            XlsxError::DimensionCount(e) => {
                write!(f, "Range dimension must be lower than 2. Got {e}")
            }
            XlsxError::CellTAttribute(e) => write!(f, "Unknown cell 't' attribute: {e:?}"),
            XlsxError::RangeWithoutColumnComponent => {
                write!(f, "Range is missing the expected column component.")
            }
            XlsxError::RangeWithoutRowComponent => {
                write!(f, "Range is missing the expected row component.")
            }
            XlsxError::Unexpected(e) => write!(f, "Unexpected {e}"),
            XlsxError::WorksheetNotFound(n) => write!(f, "Worksheet '{n}' not found"),
        }
    }
}

impl std::error::Error for XlsxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XlsxError::Io(e) => Some(e),
            XlsxError::Zip(e) => Some(e),
            XlsxError::Xml(e) => Some(e),
            XlsxError::XmlAttr(e) => Some(e),
            XlsxError::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

/// A package relationship
#[derive(Debug, Clone, Default, PartialEq)]
struct Relationship {
    target: String,
    kind: String,
}

/// An opened xlsx package with its document wide tables
pub struct Xlsx<RS> {
    zip: ZipArchive<RS>,
    /// Sheet names and part paths, in workbook order
    sheets: Vec<(String, String)>,
    theme: ThemeColors,
    strings: SharedStrings,
    styles: Stylesheet,
}

impl<RS: Read + Seek> Xlsx<RS> {
    /// Opens the package and reads the theme, shared strings, styles and
    /// sheet list
    pub fn new(reader: RS) -> Result<Self, XlsxError> {
        let mut xlsx = Xlsx {
            zip: ZipArchive::new(reader)?,
            sheets: Vec::new(),
            theme: ThemeColors::default(),
            strings: SharedStrings::default(),
            styles: Stylesheet::default(),
        };
        let relationships = xlsx
            .read_relationships("xl/_rels/workbook.xml.rels")?
            .ok_or_else(|| XlsxError::FileNotFound("xl/_rels/workbook.xml.rels".to_string()))?;
        let theme_path = relationships
            .values()
            .find(|r| r.kind.ends_with("/theme"))
            .map_or_else(
                || "xl/theme/theme1.xml".to_string(),
                |r| resolve_target("xl", &r.target),
            );
        xlsx.read_theme(&theme_path)?;
        xlsx.read_shared_strings()?;
        xlsx.read_styles()?;
        xlsx.read_workbook(&relationships)?;
        Ok(xlsx)
    }

    /// Names of the worksheets, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Theme palette
    pub fn theme(&self) -> &ThemeColors {
        &self.theme
    }

    /// Shared text table
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.strings
    }

    /// Stylesheet
    pub fn styles(&self) -> &Stylesheet {
        &self.styles
    }

    /// Reads a worksheet by its 0 based position
    pub fn worksheet(&mut self, index: usize) -> Result<Worksheet, XlsxError> {
        let (name, path) = self
            .sheets
            .get(index)
            .cloned()
            .ok_or_else(|| XlsxError::WorksheetNotFound(format!("#{}", index + 1)))?;
        debug!("reading worksheet '{name}' from {path}");
        let mut sheet = {
            let mut xml = match xml_reader(&mut self.zip, &path) {
                None => return Err(XlsxError::WorksheetNotFound(name)),
                Some(x) => x?,
            };
            sheet_parser::read_worksheet(&mut xml, &self.theme)?
        };
        if let Some(rel) = sheet.drawing_rel.clone() {
            let relationships = self
                .read_relationships(&rels_path(&path))?
                .unwrap_or_default();
            match relationships.get(rel.as_bytes()) {
                Some(r) => {
                    let drawing = resolve_target(part_dir(&path), &r.target);
                    sheet.images = self.read_drawing(&drawing)?;
                }
                None => warn!("drawing relationship {rel} of '{name}' not found"),
            }
        }
        Ok(sheet)
    }

    /// Reads a worksheet by name
    pub fn worksheet_by_name(&mut self, name: &str) -> Result<Worksheet, XlsxError> {
        let index = self
            .sheets
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| XlsxError::WorksheetNotFound(name.to_string()))?;
        self.worksheet(index)
    }

    /// Raw bytes of a package part, `None` when the part is missing
    pub fn part_bytes(&mut self, path: &str) -> Result<Option<Vec<u8>>, XlsxError> {
        let Some(actual_path) = self
            .zip
            .file_names()
            .find(|n| n.eq_ignore_ascii_case(path))
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        let mut file = match self.zip.by_name(&actual_path) {
            Ok(f) => f,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn read_theme(&mut self, path: &str) -> Result<(), XlsxError> {
        let mut xml = match xml_reader(&mut self.zip, path) {
            None => {
                warn!("no theme part, using the default palette");
                return Ok(());
            }
            Some(x) => x?,
        };
        let mut role = None;
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if let Some(r) = ThemeRole::from_tag(e.local_name().as_ref()) {
                        role = Some(r);
                        continue;
                    }
                    let hex = match e.local_name().as_ref() {
                        b"sysClr" => attribute_value(e, b"lastClr", xml.decoder())?,
                        b"srgbClr" => attribute_value(e, b"val", xml.decoder())?,
                        _ => None,
                    };
                    if let (Some(r), Some(color)) = (role, hex.as_deref().and_then(Rgb::from_hex)) {
                        self.theme.set(r, color);
                        role = None;
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"clrScheme" => break,
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        Ok(())
    }

    fn read_shared_strings(&mut self) -> Result<(), XlsxError> {
        let mut xml = match xml_reader(&mut self.zip, "xl/sharedStrings.xml") {
            None => return Ok(()),
            Some(x) => x?,
        };
        let mut strings = Vec::new();
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(read_rich_text(&mut xml, e.name(), &self.theme)?);
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sst" => break,
                Ok(Event::Eof) => return Err(XlsxError::XmlEof("sst")),
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        self.strings = SharedStrings::new(strings);
        Ok(())
    }

    fn read_styles(&mut self) -> Result<(), XlsxError> {
        let mut xml = match xml_reader(&mut self.zip, "xl/styles.xml") {
            None => {
                warn!("no styles part, using default styles");
                return Ok(());
            }
            Some(x) => x?,
        };
        self.styles = style_parser::read_stylesheet(&mut xml, &self.theme)?;
        Ok(())
    }

    fn read_workbook(
        &mut self,
        relationships: &BTreeMap<Vec<u8>, Relationship>,
    ) -> Result<(), XlsxError> {
        let mut xml = match xml_reader(&mut self.zip, "xl/workbook.xml") {
            None => return Err(XlsxError::FileNotFound("xl/workbook.xml".to_string())),
            Some(x) => x?,
        };
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                    let mut name = String::new();
                    let mut path = String::new();
                    for a in e.attributes() {
                        let a = a.map_err(XlsxError::XmlAttr)?;
                        match a {
                            Attribute {
                                key: QName(b"name"),
                                ..
                            } => {
                                name = a.decode_and_unescape_value(xml.decoder())?.to_string();
                            }
                            Attribute {
                                key: QName(b"r:id"),
                                value: v,
                            }
                            | Attribute {
                                key: QName(b"relationships:id"),
                                value: v,
                            } => {
                                let r = &relationships
                                    .get(&*v)
                                    .ok_or(XlsxError::RelationshipNotFound)?
                                    .target;
                                // target may have pre-prended "/xl/" or "xl/" path
                                path = if r.starts_with("xl/") {
                                    r.to_string()
                                } else {
                                    resolve_target("xl", r)
                                };
                            }
                            _ => (),
                        }
                    }
                    if path.split('/').nth(1) == Some("worksheets") {
                        self.sheets.push((name, path));
                    } else {
                        debug!("skipping sheet '{name}' ({path}), not a worksheet");
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"workbook" => break,
                Ok(Event::Eof) => return Err(XlsxError::XmlEof("workbook")),
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        Ok(())
    }

    fn read_relationships(
        &mut self,
        path: &str,
    ) -> Result<Option<BTreeMap<Vec<u8>, Relationship>>, XlsxError> {
        let mut xml = match xml_reader(&mut self.zip, path) {
            None => return Ok(None),
            Some(x) => x?,
        };
        let mut relationships = BTreeMap::new();
        let mut buf = Vec::with_capacity(64);
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                    let mut id = Vec::new();
                    let mut relationship = Relationship::default();
                    for a in e.attributes() {
                        match a.map_err(XlsxError::XmlAttr)? {
                            Attribute {
                                key: QName(b"Id"),
                                value: v,
                            } => id.extend_from_slice(&v),
                            Attribute {
                                key: QName(b"Target"),
                                value: v,
                            } => relationship.target = xml.decoder().decode(&v)?.into_owned(),
                            Attribute {
                                key: QName(b"Type"),
                                value: v,
                            } => relationship.kind = xml.decoder().decode(&v)?.into_owned(),
                            _ => (),
                        }
                    }
                    relationships.insert(id, relationship);
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"Relationships" => break,
                Ok(Event::Eof) => return Err(XlsxError::XmlEof("Relationships")),
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        Ok(Some(relationships))
    }

    /// Reads the picture anchors of a drawing part
    fn read_drawing(&mut self, path: &str) -> Result<Vec<ImageAnchor>, XlsxError> {
        let relationships = self.read_relationships(&rels_path(path))?.unwrap_or_default();
        let mut xml = match xml_reader(&mut self.zip, path) {
            None => {
                warn!("drawing part {path} not found");
                return Ok(Vec::new());
            }
            Some(x) => x?,
        };
        let mut anchors = Vec::new();
        let mut anchor = DrawingAnchor::default();
        let mut marker = Marker::None;
        let mut in_transform = false;
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"twoCellAnchor" | b"oneCellAnchor" => anchor = DrawingAnchor::default(),
                    b"from" => marker = Marker::From,
                    b"to" => marker = Marker::To,
                    name @ (b"col" | b"row") => {
                        let text = read_text(&mut xml, e.name())?;
                        let Ok(n) = atoi_simd::parse::<u32>(text.trim().as_bytes()) else {
                            warn!("invalid drawing marker {text:?}");
                            continue;
                        };
                        let cell = match marker {
                            Marker::From => anchor.from.get_or_insert((0, 0)),
                            Marker::To => anchor.to.get_or_insert((0, 0)),
                            Marker::None => continue,
                        };
                        if name == b"row" {
                            cell.0 = n;
                        } else {
                            cell.1 = n;
                        }
                    }
                    b"xfrm" => in_transform = true,
                    b"ext" if in_transform => {
                        let size = |n: &[u8]| -> Result<u64, XlsxError> {
                            Ok(get_attribute(e.attributes(), QName(n))?
                                .and_then(|v| atoi_simd::parse::<u64>(v).ok())
                                .unwrap_or(0))
                        };
                        anchor.extent = (size(b"cx")?, size(b"cy")?);
                    }
                    b"blip" => {
                        anchor.embed = get_attribute(e.attributes(), QName(b"r:embed"))?
                            .map(|v| String::from_utf8_lossy(v).into_owned());
                    }
                    _ => (),
                },
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"from" | b"to" => marker = Marker::None,
                    b"xfrm" => in_transform = false,
                    b"twoCellAnchor" | b"oneCellAnchor" => {
                        let anchor = std::mem::take(&mut anchor);
                        if let Some(image) = anchor.into_image(&relationships, part_dir(path)) {
                            anchors.push(image);
                        }
                    }
                    b"wsDr" => break,
                    _ => (),
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => (),
            }
        }
        Ok(anchors)
    }
}

/// Which cell marker of a drawing anchor is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    None,
    From,
    To,
}

#[derive(Debug, Default)]
struct DrawingAnchor {
    from: Option<(u32, u32)>,
    to: Option<(u32, u32)>,
    extent: (u64, u64),
    embed: Option<String>,
}

impl DrawingAnchor {
    /// Shapes and charts carry no picture and are dropped
    fn into_image(
        self,
        relationships: &BTreeMap<Vec<u8>, Relationship>,
        dir: &str,
    ) -> Option<ImageAnchor> {
        let rel_id = self.embed?;
        let from = self.from?;
        let Some(rel) = relationships.get(rel_id.as_bytes()) else {
            warn!("image relationship {rel_id} not found");
            return None;
        };
        Some(ImageAnchor {
            range: Dimensions::new(from, self.to.unwrap_or(from)),
            width_px: (self.extent.0 as f64 / EMU_PER_PIXEL).round() as u32,
            height_px: (self.extent.1 as f64 / EMU_PER_PIXEL).round() as u32,
            target: resolve_target(dir, &rel.target),
            rel_id,
        })
    }
}

/// Xml reader with the settings used for every package part
pub(crate) fn configure_reader<R: BufRead>(reader: R) -> XmlReader<R> {
    let mut r = XmlReader::from_reader(reader);
    let config = r.config_mut();
    config.check_end_names = false;
    config.trim_text(false);
    config.check_comments = false;
    config.expand_empty_elements = true;
    r
}

fn xml_reader<'a, RS: Read + Seek>(
    zip: &'a mut ZipArchive<RS>,
    path: &str,
) -> Option<Result<XlReader<'a, RS>, XlsxError>> {
    let actual_path = zip
        .file_names()
        .find(|n| n.eq_ignore_ascii_case(path))?
        .to_owned();
    match zip.by_name(&actual_path) {
        Ok(f) => Some(Ok(configure_reader(BufReader::new(f)))),
        Err(ZipError::FileNotFound) => None,
        Err(e) => Some(Err(e.into())),
    }
}

/// Directory of a part, `xl/worksheets` for `xl/worksheets/sheet1.xml`
fn part_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Relationships part of a part
fn rels_path(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{path}.rels"),
    }
}

/// Resolves a relationship target against the directory of its source part
pub(crate) fn resolve_target(dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => (),
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// search through an Element's attributes for the named one
pub(crate) fn get_attribute<'a>(
    atts: Attributes<'a>,
    n: QName,
) -> Result<Option<&'a [u8]>, XlsxError> {
    for a in atts {
        match a {
            Ok(Attribute {
                key,
                value: Cow::Borrowed(value),
            }) if key == n => return Ok(Some(value)),
            Err(e) => return Err(XlsxError::XmlAttr(e)),
            _ => {} // ignore other attributes
        }
    }
    Ok(None)
}

/// Decoded and unescaped value of the named attribute
pub(crate) fn attribute_value(
    e: &BytesStart<'_>,
    name: &[u8],
    decoder: Decoder,
) -> Result<Option<String>, XlsxError> {
    for a in e.attributes() {
        let a = a.map_err(XlsxError::XmlAttr)?;
        if a.key == QName(name) {
            return Ok(Some(a.decode_and_unescape_value(decoder)?.into_owned()));
        }
    }
    Ok(None)
}

/// converts a text representation (e.g. "A6:G67") of a dimension into integers
/// - top left (row, column),
/// - bottom right (row, column)
pub(crate) fn get_dimension(dimension: &[u8]) -> Result<Dimensions, XlsxError> {
    let parts: Vec<_> = dimension
        .split(|c| *c == b':')
        .map(get_row_column)
        .collect::<Result<Vec<_>, XlsxError>>()?;

    match parts.as_slice() {
        [] => Err(XlsxError::DimensionCount(0)),
        [cell] => Ok(Dimensions::new(*cell, *cell)),
        [start, end] => {
            let rows = end.0.saturating_sub(start.0);
            let columns = end.1.saturating_sub(start.1);
            if rows > MAX_ROWS {
                warn!("xlsx has more than maximum number of rows ({rows} > {MAX_ROWS})");
            }
            if columns > MAX_COLUMNS {
                warn!("xlsx has more than maximum number of columns ({columns} > {MAX_COLUMNS})");
            }
            Ok(Dimensions::new(
                (start.0.min(end.0), start.1.min(end.1)),
                (start.0.max(end.0), start.1.max(end.1)),
            ))
        }
        _ => Err(XlsxError::DimensionCount(parts.len())),
    }
}

/// Parses a space separated list of ranges (`sqref`), skipping the invalid ones
pub(crate) fn get_ranges(sqref: &str) -> Vec<Dimensions> {
    sqref
        .split_whitespace()
        .filter_map(|r| match get_dimension(r.as_bytes()) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("skipping range {r:?}: {e}");
                None
            }
        })
        .collect()
}

/// Converts a text range name into its position (row, column) (0 based index).
/// If the row or column component in the range is missing, an Error is returned.
pub(crate) fn get_row_column(range: &[u8]) -> Result<(u32, u32), XlsxError> {
    let (row, col) = get_row_and_optional_column(range)?;
    let col = col.ok_or(XlsxError::RangeWithoutColumnComponent)?;
    Ok((row, col))
}

/// Converts a text row name into its position (0 based index).
/// If the row component in the range is missing, an Error is returned.
/// If the text row name also contains a column component, it is ignored.
pub(crate) fn get_row(range: &[u8]) -> Result<u32, XlsxError> {
    get_row_and_optional_column(range).map(|(row, _)| row)
}

/// Converts a text range name into its position (row, column) (0 based index).
/// If the row component in the range is missing, an Error is returned.
/// If the column component in the range is missing, an None is returned for the column.
fn get_row_and_optional_column(range: &[u8]) -> Result<(u32, Option<u32>), XlsxError> {
    let (mut row, mut col) = (0u32, 0u32);
    let mut pow = 1u32;
    let mut readrow = true;
    for c in range.iter().rev() {
        match *c {
            c @ b'0'..=b'9' => {
                if readrow {
                    row = row.saturating_add(u32::from(c - b'0').saturating_mul(pow));
                    pow = pow.saturating_mul(10);
                } else {
                    return Err(XlsxError::NumericColumn(c));
                }
            }
            c @ (b'A'..=b'Z' | b'a'..=b'z') => {
                if readrow {
                    if row == 0 {
                        return Err(XlsxError::RangeWithoutRowComponent);
                    }
                    pow = 1;
                    readrow = false;
                }
                let digit = u32::from(c.to_ascii_uppercase() - b'A') + 1;
                col = col.saturating_add(digit.saturating_mul(pow));
                pow = pow.saturating_mul(26);
            }
            _ => return Err(XlsxError::Alphanumeric(*c)),
        }
    }
    let row = row
        .checked_sub(1)
        .ok_or(XlsxError::RangeWithoutRowComponent)?;
    Ok((row, col.checked_sub(1)))
}

/// Reads the text content of an element up to its closing tag
pub(crate) fn read_text<RS: BufRead>(
    xml: &mut XmlReader<RS>,
    closing: QName,
) -> Result<String, XlsxError> {
    let mut buf = Vec::with_capacity(64);
    let mut value = String::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Text(t) => value.push_str(&t.xml10_content()?),
            Event::GeneralRef(e) => unescape_entity_to_buffer(&e, &mut value)?,
            Event::CData(t) => value.push_str(&String::from_utf8_lossy(&t)),
            Event::End(end) if end.name() == closing => return Ok(value),
            Event::Start(e) => {
                xml.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::Eof => return Err(XlsxError::XmlEof("text")),
            _ => (),
        }
    }
}

/// Reads a shared or inline string: plain `<t>` or runs `<r>` with their
/// optional `<rPr>` font. Phonetic runs are skipped.
pub(crate) fn read_rich_text<RS: BufRead>(
    xml: &mut XmlReader<RS>,
    closing: QName,
    theme: &ThemeColors,
) -> Result<RichText, XlsxError> {
    let mut buf = Vec::with_capacity(1024);
    let mut runs = Vec::new();
    let mut run_font = None;
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"r" => run_font = None,
                b"rPr" => {
                    let font = style_parser::parse_font(xml, e, theme)?;
                    run_font = (!font.is_empty()).then_some(font);
                }
                b"t" => runs.push(TextRun {
                    text: read_text(xml, e.name())?,
                    font: run_font.clone(),
                }),
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == closing => {
                return Ok(RichText::from_runs(runs));
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"r" => run_font = None,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("si")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
}

/// Converts a 0 based column index to its letters.
/// Indexes past the last column are an error.
pub(crate) fn column_number_to_name(num: u32) -> Result<Vec<u8>, XlsxError> {
    if num >= MAX_COLUMNS {
        return Err(XlsxError::Unexpected("column number overflow"));
    }
    let mut col: Vec<u8> = Vec::new();
    let mut num = num + 1;
    while num > 0 {
        let integer = ((num - 1) % 26 + 65) as u8;
        col.push(integer);
        num = (num - 1) / 26;
    }
    col.reverse();
    Ok(col)
}

/// Converts a 0 based `(row, column)` to its `A1` name.
pub(crate) fn coordinate_to_name(cell: (u32, u32)) -> Result<Vec<u8>, XlsxError> {
    let cell = &[
        column_number_to_name(cell.1)?,
        (cell.0 + 1).to_string().into_bytes(),
    ];
    Ok(cell.concat())
}
