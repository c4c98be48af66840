// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Style records of the workbook stylesheet and their css rendering.
//!
//! All colors are resolved against the theme when the stylesheet is read,
//! so the records here only carry concrete [`Rgb`] values.

use std::collections::BTreeMap;

use log::warn;

use crate::color::Rgb;
use crate::formats::builtin_format_code;
use crate::utils::trim_decimal;

/// Points per rem used for font sizes
const POINTS_PER_REM: f64 = 13.;

/// Underline kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underline {
    /// Single underline
    Single,
    /// Double underline
    Double,
    /// Single accounting underline, drawn as a cell bottom border
    SingleAccounting,
    /// Double accounting underline, drawn as a cell bottom border
    DoubleAccounting,
}

impl Underline {
    /// Parses the `val` attribute of a `<u>` element; a missing value is a
    /// single underline.
    pub fn from_val(val: Option<&str>) -> Option<Self> {
        match val {
            None | Some("single") => Some(Underline::Single),
            Some("double") => Some(Underline::Double),
            Some("singleAccounting") => Some(Underline::SingleAccounting),
            Some("doubleAccounting") => Some(Underline::DoubleAccounting),
            _ => None,
        }
    }

    /// Checks whether the underline is an accounting variant
    pub fn is_accounting(self) -> bool {
        matches!(
            self,
            Underline::SingleAccounting | Underline::DoubleAccounting
        )
    }
}

/// Vertical script position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Superscript
    Superscript,
    /// Subscript
    Subscript,
}

/// Font properties
///
/// The same record is used for differential fonts, where unset fields
/// leave the underlying font untouched. The flags are `Some(false)` when a
/// font explicitly clears them (`<b val="0"/>`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    /// Font name
    pub name: Option<String>,
    /// Font size in points
    pub size: Option<f64>,
    /// Font color
    pub color: Option<Rgb>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Underline kind
    pub underline: Option<Underline>,
    /// Strikethrough
    pub strike: Option<bool>,
    /// Superscript or subscript
    pub script: Option<Script>,
}

impl Font {
    /// Create a new font
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font name
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set font size
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set font color
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// Set bold
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Set italic
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Set underline
    pub fn with_underline(mut self, underline: Underline) -> Self {
        self.underline = Some(underline);
        self
    }

    /// Set strikethrough
    pub fn with_strike(mut self, strike: bool) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Set script position
    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    /// Font family as rendered: any `Helvetica` variant becomes `Helvetica`
    pub fn family(&self) -> Option<&str> {
        self.name.as_deref().map(|n| {
            if n.starts_with("Helvetica") {
                "Helvetica"
            } else {
                n
            }
        })
    }

    /// ` font-family: X;` or nothing
    pub fn family_css(&self) -> String {
        self.family()
            .map(|f| format!(" font-family: {f};"))
            .unwrap_or_default()
    }

    /// ` font-size: Nrem;` or nothing, scaled down for scripts
    pub fn size_css(&self) -> String {
        match self.size {
            Some(pt) => {
                let pt = if self.script.is_some() { pt * 0.75 } else { pt };
                format!(" font-size: {}rem;", trim_decimal(pt / POINTS_PER_REM, 2))
            }
            None => String::new(),
        }
    }

    /// Inline css of the font
    pub fn css(&self) -> String {
        let mut css = self.family_css();
        css.push_str(&self.size_css());
        if let Some(c) = self.color {
            css.push_str(&format!(" color: #{c};"));
        }
        if self.is_bold() {
            css.push_str(" font-weight: bold;");
        }
        match self.underline {
            Some(Underline::Single) => css.push_str(" text-decoration: underline;"),
            Some(Underline::Double) => css.push_str(" border-bottom: 3px double;"),
            _ => (),
        }
        if self.is_italic() {
            css.push_str(" font-style: italic;");
        }
        match self.script {
            Some(Script::Superscript) => css.push_str("position: relative; top: -0.6em;"),
            Some(Script::Subscript) => css.push_str("position: relative; bottom: -0.5em;"),
            None => (),
        }
        if self.is_struck() {
            css.push_str(" text-decoration:line-through;");
        }
        css
    }

    /// Applies the set fields of a differential font over this font
    pub fn overlay(&self, over: &Font) -> Font {
        Font {
            name: over.name.clone().or_else(|| self.name.clone()),
            size: over.size.or(self.size),
            color: over.color.or(self.color),
            bold: over.bold.or(self.bold),
            italic: over.italic.or(self.italic),
            underline: over.underline.or(self.underline),
            strike: over.strike.or(self.strike),
            script: over.script.or(self.script),
        }
    }

    /// Checks whether the font is bold
    pub fn is_bold(&self) -> bool {
        self.bold == Some(true)
    }

    /// Checks whether the font is italic
    pub fn is_italic(&self) -> bool {
        self.italic == Some(true)
    }

    /// Checks whether the font is struck through
    pub fn is_struck(&self) -> bool {
        self.strike == Some(true)
    }

    /// Checks whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Font::default()
    }
}

/// Border line style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    /// Thin
    Thin,
    /// Medium
    Medium,
    /// Thick
    Thick,
    /// Double
    Double,
    /// Dotted
    Dotted,
    /// Hair
    Hair,
    /// Dashed
    Dashed,
    /// Dash dot
    DashDot,
    /// Dash dot dot
    DashDotDot,
    /// Medium dashed
    MediumDashed,
    /// Medium dash dot
    MediumDashDot,
    /// Medium dash dot dot
    MediumDashDotDot,
    /// Slant dash dot
    SlantDashDot,
}

impl BorderStyle {
    /// Parses the `style` attribute of a border side, `None` for `none`
    /// and unknown values
    pub fn from_name(name: &str) -> Option<Self> {
        let style = match name {
            "thin" => BorderStyle::Thin,
            "medium" => BorderStyle::Medium,
            "thick" => BorderStyle::Thick,
            "double" => BorderStyle::Double,
            "dotted" => BorderStyle::Dotted,
            "hair" => BorderStyle::Hair,
            "dashed" => BorderStyle::Dashed,
            "dashDot" => BorderStyle::DashDot,
            "dashDotDot" => BorderStyle::DashDotDot,
            "mediumDashed" => BorderStyle::MediumDashed,
            "mediumDashDot" => BorderStyle::MediumDashDot,
            "mediumDashDotDot" => BorderStyle::MediumDashDotDot,
            "slantDashDot" => BorderStyle::SlantDashDot,
            _ => return None,
        };
        Some(style)
    }

    fn line(self) -> &'static str {
        match self {
            BorderStyle::Thin => "1px solid",
            BorderStyle::Medium => "2px solid",
            BorderStyle::Thick => "3px solid",
            BorderStyle::Double => "double",
            BorderStyle::Dotted | BorderStyle::Hair => "1px dotted",
            BorderStyle::Dashed | BorderStyle::DashDot | BorderStyle::DashDotDot => "1px dashed",
            BorderStyle::MediumDashed
            | BorderStyle::MediumDashDot
            | BorderStyle::MediumDashDotDot
            | BorderStyle::SlantDashDot => "2px dashed",
        }
    }
}

/// A side of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Left
    Left,
    /// Right
    Right,
    /// Top
    Top,
    /// Bottom
    Bottom,
}

impl Side {
    /// Css name of the side
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// One side of a border
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderSide {
    /// Line style
    pub style: BorderStyle,
    /// Line color, black when absent
    pub color: Option<Rgb>,
}

impl BorderSide {
    /// Create a new border side
    pub fn new(style: BorderStyle, color: Option<Rgb>) -> Self {
        BorderSide { style, color }
    }

    /// Css declaration for the given side, e.g. ` border-left: 1px solid #000000;`
    pub fn css(&self, side: Side) -> String {
        format!(
            " border-{}: {} #{};",
            side.name(),
            self.style.line(),
            self.color.unwrap_or(Rgb::BLACK)
        )
    }
}

/// All borders of a cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    /// Left border
    pub left: Option<BorderSide>,
    /// Right border
    pub right: Option<BorderSide>,
    /// Top border
    pub top: Option<BorderSide>,
    /// Bottom border
    pub bottom: Option<BorderSide>,
    /// Diagonal from bottom left to top right
    pub diagonal_up: bool,
    /// Diagonal from top left to bottom right
    pub diagonal_down: bool,
    /// Diagonal line color
    pub diagonal_color: Option<Rgb>,
}

impl Border {
    /// Create new borders
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a side
    pub fn side(&self, side: Side) -> Option<&BorderSide> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
            Side::Top => self.top.as_ref(),
            Side::Bottom => self.bottom.as_ref(),
        }
    }

    /// Sets a side
    pub fn set_side(&mut self, side: Side, value: Option<BorderSide>) {
        match side {
            Side::Left => self.left = value,
            Side::Right => self.right = value,
            Side::Top => self.top = value,
            Side::Bottom => self.bottom = value,
        }
    }

    /// Css of a side, empty when the side has no line
    pub fn side_css(&self, side: Side) -> String {
        self.side(side).map(|s| s.css(side)).unwrap_or_default()
    }

    /// Diagonal lines are drawn as a gradient over the cell background
    pub fn diagonal_css(&self, fill: Option<Rgb>) -> Option<String> {
        let direction = match (self.diagonal_up, self.diagonal_down) {
            (false, false) => return None,
            (true, false) => "to right bottom",
            _ => "to right top",
        };
        let f = fill.unwrap_or(Rgb::WHITE);
        let d = self.diagonal_color.unwrap_or(Rgb::BLACK);
        Some(format!(
            " background: linear-gradient({direction}, #{f} 0%,#{f} 48%,#{d} 50%,#{d} 51%,#{f} 52%,#{f} 100%);"
        ))
    }

    /// Applies the sides set in a differential border over this one
    pub fn overlay(&self, over: &Border) -> Border {
        Border {
            left: over.left.or(self.left),
            right: over.right.or(self.right),
            top: over.top.or(self.top),
            bottom: over.bottom.or(self.bottom),
            ..self.clone()
        }
    }

    /// Checks whether no side is set
    pub fn is_empty(&self) -> bool {
        *self == Border::default()
    }
}

/// A solid cell background
///
/// Cell fills carry the pattern foreground color, differential fills the
/// pattern background color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fill {
    /// Background color
    pub color: Option<Rgb>,
}

impl Fill {
    /// A solid fill
    pub fn solid(color: Rgb) -> Self {
        Fill { color: Some(color) }
    }
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// General alignment (text left, numbers right)
    General,
    /// Left
    Left,
    /// Center
    Center,
    /// Center across selection
    CenterContinuous,
    /// Right
    Right,
    /// Fill
    Fill,
    /// Justify
    Justify,
    /// Distributed
    Distributed,
}

impl HorizontalAlignment {
    /// Parses the `horizontal` attribute of an `<alignment>` element
    pub fn from_name(name: &str) -> Option<Self> {
        let a = match name {
            "general" => HorizontalAlignment::General,
            "left" => HorizontalAlignment::Left,
            "center" => HorizontalAlignment::Center,
            "centerContinuous" => HorizontalAlignment::CenterContinuous,
            "right" => HorizontalAlignment::Right,
            "fill" => HorizontalAlignment::Fill,
            "justify" => HorizontalAlignment::Justify,
            "distributed" => HorizontalAlignment::Distributed,
            _ => return None,
        };
        Some(a)
    }

    /// Css `text-align` value, `None` for the general alignment
    pub fn css_value(self) -> Option<&'static str> {
        match self {
            HorizontalAlignment::General => None,
            HorizontalAlignment::Left | HorizontalAlignment::Fill => Some("left"),
            HorizontalAlignment::Center | HorizontalAlignment::CenterContinuous => Some("center"),
            HorizontalAlignment::Right => Some("right"),
            HorizontalAlignment::Justify | HorizontalAlignment::Distributed => Some("justify"),
        }
    }
}

/// Vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlignment {
    /// Top
    Top,
    /// Center
    Center,
    /// Bottom
    Bottom,
}

impl VerticalAlignment {
    /// Parses the `vertical` attribute of an `<alignment>` element; justify
    /// and distributed fall back to bottom
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(VerticalAlignment::Top),
            "center" => Some(VerticalAlignment::Center),
            "bottom" | "justify" | "distributed" => Some(VerticalAlignment::Bottom),
            _ => None,
        }
    }

    /// Css `vertical-align` value
    pub fn css_value(self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "middle",
            VerticalAlignment::Bottom => "bottom",
        }
    }
}

/// A cell format (`<xf>` of `<cellXfs>`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    /// Index in the font table
    pub font_id: usize,
    /// Index in the border table
    pub border_id: usize,
    /// Index in the fill table
    pub fill_id: usize,
    /// Number format id
    pub num_fmt_id: u32,
    /// Horizontal alignment
    pub horizontal: Option<HorizontalAlignment>,
    /// Vertical alignment
    pub vertical: Option<VerticalAlignment>,
    /// Named cell style (`<cellStyleXfs>` index)
    pub xf_id: Option<usize>,
}

/// A partial style used by conditional formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferentialFormat {
    /// Font overrides
    pub font: Option<Font>,
    /// Border overrides
    pub border: Option<Border>,
    /// Fill override
    pub fill: Option<Fill>,
}

impl DifferentialFormat {
    /// Checks whether the format overrides nothing
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.border.is_none() && self.fill.is_none()
    }
}

/// The fully resolved style of a cell format
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    /// Font
    pub font: Font,
    /// Borders
    pub border: Border,
    /// Background color
    pub fill: Option<Rgb>,
    /// Number format code
    pub number_format: String,
    /// Horizontal alignment
    pub horizontal: Option<HorizontalAlignment>,
    /// Vertical alignment
    pub vertical: Option<VerticalAlignment>,
    /// The cell uses the `Hyperlink` named style
    pub hyperlink: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        ResolvedStyle {
            font: Font::default(),
            border: Border::default(),
            fill: None,
            number_format: "General".to_string(),
            horizontal: None,
            vertical: None,
            hyperlink: false,
        }
    }
}

/// The workbook stylesheet (`xl/styles.xml`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    /// Fonts
    pub fonts: Vec<Font>,
    /// Borders
    pub borders: Vec<Border>,
    /// Fills
    pub fills: Vec<Fill>,
    /// Custom number formats by id
    pub number_formats: BTreeMap<u32, String>,
    /// Cell formats
    pub cell_formats: Vec<CellFormat>,
    /// Named cell styles by their `xfId`
    pub cell_style_names: BTreeMap<usize, String>,
    /// Differential formats
    pub dxfs: Vec<DifferentialFormat>,
}

impl Stylesheet {
    /// The document default font (font 0)
    pub fn default_font(&self) -> Font {
        self.fonts.first().cloned().unwrap_or_default()
    }

    /// Format code of a number format id, falling back to the built-in codes
    pub fn number_format(&self, id: u32) -> &str {
        match self.number_formats.get(&id) {
            Some(code) => code,
            None => builtin_format_code(id),
        }
    }

    /// Differential format by index
    pub fn dxf(&self, id: usize) -> Option<&DifferentialFormat> {
        self.dxfs.get(id)
    }

    /// Resolves a cell format through the font, border, fill and number
    /// format tables. Undefined ids resolve to empty records.
    pub fn resolve(&self, xf: usize) -> ResolvedStyle {
        let Some(format) = self.cell_formats.get(xf) else {
            if xf != 0 {
                warn!("undefined cell format {xf}");
            }
            return ResolvedStyle::default();
        };
        let font = self.fonts.get(format.font_id).cloned().unwrap_or_else(|| {
            warn!("cell format {xf}: undefined font {}", format.font_id);
            Font::default()
        });
        let border = self
            .borders
            .get(format.border_id)
            .cloned()
            .unwrap_or_else(|| {
                warn!("cell format {xf}: undefined border {}", format.border_id);
                Border::default()
            });
        let fill = match self.fills.get(format.fill_id) {
            Some(f) => f.color,
            None => {
                warn!("cell format {xf}: undefined fill {}", format.fill_id);
                None
            }
        };
        let hyperlink = format
            .xf_id
            .and_then(|id| self.cell_style_names.get(&id))
            .is_some_and(|name| name == "Hyperlink");
        ResolvedStyle {
            font,
            border,
            fill,
            number_format: self.number_format(format.num_fmt_id).to_string(),
            horizontal: format.horizontal,
            vertical: format.vertical,
            hyperlink,
        }
    }

    /// Resolves every cell format once
    pub fn resolve_all(&self) -> Vec<ResolvedStyle> {
        (0..self.cell_formats.len().max(1))
            .map(|xf| self.resolve(xf))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_font_css() {
        let font = Font::new()
            .with_name("Calibri")
            .with_size(11.)
            .with_color(Rgb::new(255, 0, 0))
            .with_bold(true)
            .with_italic(true);
        assert_eq!(
            font.css(),
            " font-family: Calibri; font-size: 0.85rem; color: #FF0000; font-weight: bold; font-style: italic;"
        );
    }

    #[test]
    fn test_font_css_script_and_strike() {
        let font = Font::new()
            .with_size(13.)
            .with_script(Script::Superscript)
            .with_strike(true)
            .with_underline(Underline::Double);
        assert_eq!(
            font.css(),
            " font-size: 0.75rem; border-bottom: 3px double;position: relative; top: -0.6em; text-decoration:line-through;"
        );
    }

    #[test]
    fn test_accounting_underline_not_in_font_css() {
        let font = Font::new().with_underline(Underline::SingleAccounting);
        assert_eq!(font.css(), "");
    }

    #[test]
    fn test_helvetica() {
        let font = Font::new().with_name("Helvetica Neue");
        assert_eq!(font.family(), Some("Helvetica"));
        assert_eq!(font.family_css(), " font-family: Helvetica;");
    }

    #[test]
    fn test_font_overlay() {
        let base = Font::new().with_name("Arial").with_size(10.);
        let over = Font::new().with_bold(true).with_color(Rgb::new(0x9C, 0, 6));
        let f = base.overlay(&over);
        assert_eq!(f.name.as_deref(), Some("Arial"));
        assert_eq!(f.size, Some(10.));
        assert!(f.is_bold());
        assert_eq!(f.color, Some(Rgb::new(0x9C, 0, 6)));
    }

    #[test]
    fn test_font_overlay_clears_flags() {
        let base = Font::new()
            .with_bold(true)
            .with_italic(true)
            .with_strike(true);
        let over = Font::new().with_bold(false).with_strike(false);
        let f = base.overlay(&over);
        assert!(!f.is_bold());
        assert!(f.is_italic());
        assert!(!f.is_struck());
        assert_eq!(f.css(), " font-style: italic;");
    }

    #[rstest]
    #[case("thin", Side::Left, " border-left: 1px solid #112233;")]
    #[case("medium", Side::Right, " border-right: 2px solid #112233;")]
    #[case("thick", Side::Top, " border-top: 3px solid #112233;")]
    #[case("double", Side::Bottom, " border-bottom: double #112233;")]
    #[case("hair", Side::Left, " border-left: 1px dotted #112233;")]
    #[case("dotted", Side::Left, " border-left: 1px dotted #112233;")]
    #[case("dashDotDot", Side::Left, " border-left: 1px dashed #112233;")]
    #[case("slantDashDot", Side::Left, " border-left: 2px dashed #112233;")]
    #[case("mediumDashed", Side::Left, " border-left: 2px dashed #112233;")]
    fn test_border_css(#[case] style: &str, #[case] side: Side, #[case] expected: &str) {
        let s = BorderSide::new(
            BorderStyle::from_name(style).unwrap(),
            Some(Rgb::new(0x11, 0x22, 0x33)),
        );
        assert_eq!(s.css(side), expected);
    }

    #[test]
    fn test_border_default_color() {
        let s = BorderSide::new(BorderStyle::Thin, None);
        assert_eq!(s.css(Side::Bottom), " border-bottom: 1px solid #000000;");
        assert_eq!(BorderStyle::from_name("none"), None);
    }

    #[test]
    fn test_diagonal() {
        let mut border = Border::new();
        assert_eq!(border.diagonal_css(None), None);
        border.diagonal_up = true;
        assert_eq!(
            border.diagonal_css(None).unwrap(),
            " background: linear-gradient(to right bottom, #FFFFFF 0%,#FFFFFF 48%,#000000 50%,#000000 51%,#FFFFFF 52%,#FFFFFF 100%);"
        );
        border.diagonal_down = true;
        border.diagonal_color = Some(Rgb::new(255, 0, 0));
        assert!(border
            .diagonal_css(Some(Rgb::new(0, 0, 255)))
            .unwrap()
            .starts_with(" background: linear-gradient(to right top, #0000FF 0%,#0000FF 48%,#FF0000 50%"));
    }

    #[test]
    fn test_alignment() {
        assert_eq!(
            HorizontalAlignment::from_name("centerContinuous").and_then(|a| a.css_value()),
            Some("center")
        );
        assert_eq!(
            HorizontalAlignment::from_name("distributed").and_then(|a| a.css_value()),
            Some("justify")
        );
        assert_eq!(
            HorizontalAlignment::from_name("general").and_then(|a| a.css_value()),
            None
        );
        assert_eq!(
            VerticalAlignment::from_name("center").map(|v| v.css_value()),
            Some("middle")
        );
    }

    #[test]
    fn test_resolve_undefined_ids() {
        let mut styles = Stylesheet::default();
        styles.fonts.push(Font::new().with_name("Calibri"));
        styles.cell_formats.push(CellFormat {
            font_id: 7,
            border_id: 3,
            fill_id: 9,
            num_fmt_id: 14,
            ..Default::default()
        });
        let resolved = styles.resolve(0);
        assert_eq!(resolved.font, Font::default());
        assert!(resolved.border.is_empty());
        assert_eq!(resolved.fill, None);
        assert_eq!(resolved.number_format, "dd/mm/yyyy;@");
        assert_eq!(styles.resolve(42), ResolvedStyle::default());
    }

    #[test]
    fn test_resolve_hyperlink_and_custom_format() {
        let mut styles = Stylesheet::default();
        styles.fonts.push(Font::new());
        styles.fills.push(Fill::solid(Rgb::new(1, 2, 3)));
        styles.borders.push(Border::new());
        styles.number_formats.insert(164, "0.000".to_string());
        styles.cell_style_names.insert(1, "Hyperlink".to_string());
        styles.cell_formats.push(CellFormat {
            num_fmt_id: 164,
            xf_id: Some(1),
            ..Default::default()
        });
        let resolved = styles.resolve(0);
        assert!(resolved.hyperlink);
        assert_eq!(resolved.fill, Some(Rgb::new(1, 2, 3)));
        assert_eq!(resolved.number_format, "0.000");
    }
}
