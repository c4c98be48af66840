// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Conditional formatting rules and their evaluation
//!
//! Rules are grouped by the ranges they apply to. Evaluating a sheet yields a
//! sparse [`OverlayMap`]: for each affected cell the discrete style fields of
//! the winning rules, a color scale background and a data bar graphic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::color::Rgb;
use crate::formats::format_general;
use crate::shared_strings::SharedStrings;
use crate::style::{Border, DifferentialFormat, Font, Stylesheet};
use crate::utils::trim_decimal;
use crate::worksheet::{Cell, CellValue, Dimensions, Worksheet};

/// Conditional formatting rule type
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalFormatType {
    /// Cell value comparison
    CellIs {
        /// Comparison operator
        operator: ComparisonOperator,
        /// One operand, two for `between`/`notBetween`
        operands: Vec<Operand>,
    },
    /// Text match
    Text {
        /// Kind of match
        operator: TextOperator,
        /// Text to look for
        text: Operand,
    },
    /// Duplicate values
    DuplicateValues,
    /// Unique values
    UniqueValues,
    /// Top/bottom N values or percentiles
    Top10 {
        /// Bottom instead of top
        bottom: bool,
        /// Use percent instead of rank
        percent: bool,
        /// Number of items or percentage
        rank: u32,
    },
    /// Above or below average
    AboveAverage {
        /// Below instead of above
        below: bool,
        /// Include equal to average
        equal_average: bool,
        /// Standard deviations
        std_dev: Option<u32>,
    },
    /// Color scale
    ColorScale(ColorScale),
    /// Data bar
    DataBar(DataBar),
    /// Any other rule type (expression, time period, icon set...), never rendered
    Unsupported(String),
}

impl ConditionalFormatType {
    /// Rules contributing discrete style fields
    pub fn is_discrete(&self) -> bool {
        !matches!(
            self,
            ConditionalFormatType::ColorScale(_)
                | ConditionalFormatType::DataBar(_)
                | ConditionalFormatType::Unsupported(_)
        )
    }
}

/// Comparison operators for CellIs rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// Less than
    LessThan,
    /// Less than or equal
    LessThanOrEqual,
    /// Equal
    Equal,
    /// Not equal
    NotEqual,
    /// Greater than or equal
    GreaterThanOrEqual,
    /// Greater than
    GreaterThan,
    /// Between (inclusive)
    Between,
    /// Not between (exclusive)
    NotBetween,
}

impl ComparisonOperator {
    /// Parses the `operator` attribute of a `cellIs` rule
    pub fn from_name(name: &str) -> Option<Self> {
        use ComparisonOperator::*;
        Some(match name {
            "lessThan" => LessThan,
            "lessThanOrEqual" => LessThanOrEqual,
            "equal" => Equal,
            "notEqual" => NotEqual,
            "greaterThanOrEqual" => GreaterThanOrEqual,
            "greaterThan" => GreaterThan,
            "between" => Between,
            "notBetween" => NotBetween,
            _ => return None,
        })
    }

    /// Number of operands the operator needs
    pub fn arity(self) -> usize {
        match self {
            ComparisonOperator::Between | ComparisonOperator::NotBetween => 2,
            _ => 1,
        }
    }
}

/// Text matching rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperator {
    /// Contains, ignoring case
    Contains,
    /// Does not contain, ignoring case
    NotContains,
    /// Starts with
    BeginsWith,
    /// Ends with
    EndsWith,
}

impl TextOperator {
    /// Parses a rule `type` (or the `operator` of a text rule)
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "containsText" => TextOperator::Contains,
            "notContainsText" | "notContains" => TextOperator::NotContains,
            "beginsWith" => TextOperator::BeginsWith,
            "endsWith" => TextOperator::EndsWith,
            _ => return None,
        })
    }

    fn matches(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextOperator::Contains => haystack.to_lowercase().contains(&needle.to_lowercase()),
            TextOperator::NotContains => !haystack.to_lowercase().contains(&needle.to_lowercase()),
            TextOperator::BeginsWith => haystack.starts_with(needle),
            TextOperator::EndsWith => haystack.ends_with(needle),
        }
    }
}

/// A rule operand, as written in a `<formula>` element
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),
    /// Reference to a cell of the same sheet, 0 based
    Cell {
        /// Row
        row: u32,
        /// Column
        column: u32,
    },
}

impl Operand {
    /// Parses a formula operand: a number, a quoted string or a single cell
    /// reference. Anything else is unsupported.
    pub fn parse(formula: &str) -> Option<Operand> {
        let f = formula.trim();
        if f.len() >= 2 && f.starts_with('"') && f.ends_with('"') {
            return Some(Operand::Text(f[1..f.len() - 1].replace("\"\"", "\"")));
        }
        if let Ok(n) = fast_float2::parse::<f64, _>(f) {
            return Some(Operand::Number(n));
        }
        let reference = f.rsplit_once('!').map_or(f, |(_, r)| r).replace('$', "");
        match crate::xlsx::get_row_column(reference.as_bytes()) {
            Ok((row, column)) if !reference.is_empty() => Some(Operand::Cell { row, column }),
            _ => None,
        }
    }

    fn value(&self, sheet: &Worksheet, strings: &SharedStrings) -> Option<RuleValue> {
        match self {
            Operand::Number(n) => Some(RuleValue::Number(*n)),
            Operand::Text(t) => Some(RuleValue::Text(t.clone())),
            Operand::Cell { row, column } => sheet
                .cell(*row, *column)
                .and_then(|c| RuleValue::of_cell(c, strings)),
        }
    }
}

/// Conditional format value object (threshold)
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormatValue {
    /// Value type
    pub value_type: CfvoType,
    /// The actual value (if applicable)
    pub value: Option<String>,
}

impl ConditionalFormatValue {
    /// A threshold without value
    pub fn new(value_type: CfvoType) -> Self {
        ConditionalFormatValue {
            value_type,
            value: None,
        }
    }

    /// A threshold with a value
    pub fn with_value<S: Into<String>>(value_type: CfvoType, value: S) -> Self {
        ConditionalFormatValue {
            value_type,
            value: Some(value.into()),
        }
    }
}

/// Conditional format value object type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfvoType {
    /// Minimum value in the range
    Min,
    /// Maximum value in the range
    Max,
    /// Specific number
    Number,
    /// Percentage
    Percent,
    /// Percentile
    Percentile,
    /// Formula
    Formula,
    /// Automatic minimum
    AutoMin,
    /// Automatic maximum
    AutoMax,
}

impl CfvoType {
    /// Parses the `type` attribute of a `cfvo`
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "min" => CfvoType::Min,
            "max" => CfvoType::Max,
            "num" => CfvoType::Number,
            "percent" => CfvoType::Percent,
            "percentile" => CfvoType::Percentile,
            "formula" => CfvoType::Formula,
            "autoMin" => CfvoType::AutoMin,
            "autoMax" => CfvoType::AutoMax,
            _ => return None,
        })
    }
}

/// Color scale configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorScale {
    /// Color scale stops (2 or 3)
    pub cfvos: Vec<ConditionalFormatValue>,
    /// Colors corresponding to each stop
    pub colors: Vec<Rgb>,
}

/// Data bar configuration, merged with its 2010 extension when present
#[derive(Debug, Clone, PartialEq)]
pub struct DataBar {
    /// Minimum threshold
    pub min_cfvo: Option<ConditionalFormatValue>,
    /// Maximum threshold
    pub max_cfvo: Option<ConditionalFormatValue>,
    /// Bar color
    pub color: Option<Rgb>,
    /// Negative bar color
    pub negative_color: Option<Rgb>,
    /// Border color
    pub border_color: Option<Rgb>,
    /// Negative bar border color
    pub negative_border_color: Option<Rgb>,
    /// Axis color
    pub axis_color: Option<Rgb>,
    /// Draw a border around bars
    pub border: bool,
    /// Gradient instead of solid fill
    pub gradient: bool,
    /// Id linking the bar to its extension
    pub ext_id: Option<String>,
}

impl Default for DataBar {
    fn default() -> Self {
        DataBar {
            min_cfvo: None,
            max_cfvo: None,
            color: None,
            negative_color: None,
            border_color: None,
            negative_border_color: None,
            axis_color: None,
            border: false,
            gradient: true,
            ext_id: None,
        }
    }
}

impl DataBar {
    /// Copies the extension settings of another bar
    pub fn extend(&mut self, ext: &DataBar) {
        self.min_cfvo = ext.min_cfvo.clone().or(self.min_cfvo.take());
        self.max_cfvo = ext.max_cfvo.clone().or(self.max_cfvo.take());
        self.color = self.color.or(ext.color);
        self.negative_color = ext.negative_color.or(self.negative_color);
        self.border_color = ext.border_color.or(self.border_color);
        self.negative_border_color = ext.negative_border_color.or(self.negative_border_color);
        self.axis_color = ext.axis_color.or(self.axis_color);
        self.border = ext.border;
        self.gradient = ext.gradient;
    }
}

/// Style applied by a discrete rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleFormat {
    /// Index in the stylesheet differential formats
    Dxf(usize),
    /// Format carried by the rule itself
    Inline(DifferentialFormat),
}

impl RuleFormat {
    fn resolve<'a>(&'a self, styles: &'a Stylesheet) -> Option<&'a DifferentialFormat> {
        match self {
            RuleFormat::Dxf(id) => {
                let dxf = styles.dxf(*id);
                if dxf.is_none() {
                    warn!("conditional format refers to undefined dxf {id}");
                }
                dxf
            }
            RuleFormat::Inline(dxf) => Some(dxf),
        }
    }
}

/// A single conditional formatting rule
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormatRule {
    /// Rule type and configuration
    pub rule_type: ConditionalFormatType,
    /// Priority (lower number = higher priority)
    pub priority: i32,
    /// Style of discrete rules
    pub format: Option<RuleFormat>,
}

/// Conditional formatting for a range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalFormatting {
    /// Cell ranges this formatting applies to (space-separated in XML)
    pub ranges: Vec<Dimensions>,
    /// Rules, in document order
    pub rules: Vec<ConditionalFormatRule>,
}

/// Proportional bar drawn inside a cell
#[derive(Debug, Clone, PartialEq)]
pub struct DataBarGraphic {
    /// Bar length in percent of the cell width
    pub width: f64,
    /// Left offset in percent of the cell width
    pub offset: Option<f64>,
    /// Bar height in pixels
    pub height: u32,
    /// Fill color
    pub color: Rgb,
    /// Negative value, drawn leftwards from the axis
    pub negative: bool,
    /// Gradient fill
    pub gradient: bool,
    /// Full border color, top and bottom lines in the fill color otherwise
    pub border: Option<Rgb>,
    /// Dashed axis line color
    pub axis: Option<Rgb>,
}

impl DataBarGraphic {
    /// The bar as a `div`
    pub fn to_html(&self) -> String {
        let c = self.color;
        let mut html = format!(
            "<div style='width: {}%; margin-top: 1px; height: {}px;",
            trim_decimal(self.width, 2),
            self.height
        );
        match (self.gradient, self.negative) {
            (true, false) => html.push_str(&format!(
                " background: linear-gradient(to right, #{c} 0%, #FFFFFF 100%);"
            )),
            (true, true) => html.push_str(&format!(
                " background: linear-gradient(to right, #FFFFFF 0%, #{c} 100%);"
            )),
            (false, _) => html.push_str(&format!(" background: #{c};")),
        }
        match self.border {
            Some(b) => html.push_str(&format!(" border: 1px solid #{b};")),
            None => html.push_str(&format!(
                " border-top: 1px solid #{c}; border-bottom: 1px solid #{c};"
            )),
        }
        if let Some(offset) = self.offset {
            html.push_str(&format!(" margin-left: {}%;", trim_decimal(offset, 2)));
        }
        if let Some(a) = self.axis {
            let side = if self.negative { "right" } else { "left" };
            html.push_str(&format!(" border-{side}: 1px dashed #{a};"));
        }
        html.push_str("'></div>");
        html
    }
}

/// What conditional formatting changes on a cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalOverlay {
    /// Font fields of the winning rules
    pub font: Option<Font>,
    /// Border sides of the winning rules
    pub border: Option<Border>,
    /// Background of the winning rules
    pub fill: Option<Rgb>,
    /// Background computed by a color scale
    pub scale_fill: Option<Rgb>,
    /// Data bar
    pub data_bar: Option<DataBarGraphic>,
}

impl ConditionalOverlay {
    /// Adds the fields of a lower precedence format which are still unset
    fn merge_format(&mut self, dxf: &DifferentialFormat) {
        if let Some(font) = &dxf.font {
            self.font = Some(match &self.font {
                Some(current) => font.overlay(current),
                None => font.clone(),
            });
        }
        if let Some(border) = &dxf.border {
            self.border = Some(match &self.border {
                Some(current) => border.overlay(current),
                None => border.clone(),
            });
        }
        if self.fill.is_none() {
            self.fill = dxf.fill.and_then(|f| f.color);
        }
    }

    /// Background shown under the cell content: discrete fill first, then
    /// color scale
    pub fn background(&self) -> Option<Rgb> {
        self.fill.or(self.scale_fill)
    }
}

/// Overlays by `(row, column)`
pub type OverlayMap = BTreeMap<(u32, u32), ConditionalOverlay>;

/// A cell value as seen by rules
#[derive(Debug, Clone, PartialEq)]
enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    fn of_cell(cell: &Cell, strings: &SharedStrings) -> Option<RuleValue> {
        match &cell.value {
            CellValue::Number(n) => Some(RuleValue::Number(*n)),
            CellValue::Empty => None,
            _ => cell.text(strings).map(RuleValue::Text),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Text(_) => None,
        }
    }

    fn text(&self) -> String {
        match self {
            RuleValue::Number(n) => format_general(*n),
            RuleValue::Text(t) => t.clone(),
        }
    }

    /// Key for occurrence counting, case insensitive
    fn key(&self) -> String {
        match self {
            RuleValue::Number(n) => format!("n{n}"),
            RuleValue::Text(t) => format!("t{}", t.to_lowercase()),
        }
    }

    /// Numbers sort before text, text ignores case
    fn compare(&self, other: &RuleValue) -> Ordering {
        match (self, other) {
            (RuleValue::Number(a), RuleValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (RuleValue::Text(a), RuleValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (RuleValue::Number(_), RuleValue::Text(_)) => Ordering::Less,
            (RuleValue::Text(_), RuleValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Values and aggregates of the cells a group applies to
struct RangeStats {
    values: BTreeMap<(u32, u32), RuleValue>,
    sorted: Vec<f64>,
    counts: BTreeMap<String, usize>,
}

impl RangeStats {
    fn collect(ranges: &[Dimensions], sheet: &Worksheet, strings: &SharedStrings) -> Self {
        let positions: BTreeSet<(u32, u32)> = ranges
            .iter()
            .flat_map(|r| sheet.cells_in(r).map(|c| (c.row, c.column)))
            .collect();
        let mut values = BTreeMap::new();
        let mut sorted = Vec::new();
        let mut counts = BTreeMap::new();
        for pos in positions {
            let Some(value) = sheet
                .cell(pos.0, pos.1)
                .and_then(|c| RuleValue::of_cell(c, strings))
            else {
                continue;
            };
            if let Some(n) = value.number() {
                sorted.push(n);
            }
            *counts.entry(value.key()).or_insert(0) += 1;
            values.insert(pos, value);
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        RangeStats {
            values,
            sorted,
            counts,
        }
    }

    fn min(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }

    fn mean(&self) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        Some(self.sorted.iter().sum::<f64>() / self.sorted.len() as f64)
    }

    fn std_dev(&self, mean: f64) -> f64 {
        let n = self.sorted.len() as f64;
        (self.sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
    }

    /// Value at percentile `p`, interpolated between ranks
    fn percentile(&self, p: f64) -> Option<f64> {
        let n = self.sorted.len();
        if n == 0 || !p.is_finite() {
            return None;
        }
        let pos = (p / 100. * (n as f64 + 1.)).clamp(1., n as f64);
        let lo = *self.sorted.get(pos.floor() as usize - 1)?;
        let hi = *self.sorted.get(pos.ceil() as usize - 1)?;
        Some(lo + (pos - pos.floor()) * (hi - lo))
    }

    fn occurrences(&self, value: &RuleValue) -> usize {
        self.counts.get(&value.key()).copied().unwrap_or(0)
    }
}

/// A rule with everything depending on the range precomputed
enum Prepared<'a> {
    Compare {
        operator: ComparisonOperator,
        operands: Vec<RuleValue>,
    },
    Text {
        operator: TextOperator,
        needle: String,
    },
    Occurrences {
        duplicate: bool,
    },
    AtLeast(f64),
    AtMost(f64),
    Average {
        bound: f64,
        below: bool,
        inclusive: bool,
    },
    Scale(Vec<(f64, Rgb)>),
    Bar(BarGeometry<'a>),
    Never,
}

impl Prepared<'_> {
    fn matches(&self, value: &RuleValue, stats: &RangeStats) -> bool {
        match self {
            Prepared::Compare { operator, operands } => compare(*operator, value, operands),
            Prepared::Text { operator, needle } => operator.matches(&value.text(), needle),
            Prepared::Occurrences { duplicate } => {
                let n = stats.occurrences(value);
                if *duplicate {
                    n > 1
                } else {
                    n == 1
                }
            }
            Prepared::AtLeast(t) => value.number().is_some_and(|v| v >= *t),
            Prepared::AtMost(t) => value.number().is_some_and(|v| v <= *t),
            Prepared::Average {
                bound,
                below,
                inclusive,
            } => value.number().is_some_and(|v| match (below, inclusive) {
                (false, false) => v > *bound,
                (false, true) => v >= *bound,
                (true, false) => v < *bound,
                (true, true) => v <= *bound,
            }),
            Prepared::Scale(_) | Prepared::Bar(_) | Prepared::Never => false,
        }
    }
}

fn compare(operator: ComparisonOperator, value: &RuleValue, operands: &[RuleValue]) -> bool {
    use ComparisonOperator::*;
    let Some(first) = operands.first() else {
        return false;
    };
    let ord = value.compare(first);
    match operator {
        LessThan => ord == Ordering::Less,
        LessThanOrEqual => ord != Ordering::Greater,
        Equal => ord == Ordering::Equal,
        NotEqual => ord != Ordering::Equal,
        GreaterThanOrEqual => ord != Ordering::Less,
        GreaterThan => ord == Ordering::Greater,
        Between | NotBetween => {
            let Some(second) = operands.get(1) else {
                return false;
            };
            let (low, high) = if first.compare(second) == Ordering::Greater {
                (second, first)
            } else {
                (first, second)
            };
            let inside = value.compare(low) != Ordering::Less
                && value.compare(high) != Ordering::Greater;
            inside == (operator == Between)
        }
    }
}

/// Resolves a threshold against the range, `None` when it has no usable value
fn resolve_cfvo(
    cfvo: &ConditionalFormatValue,
    stats: &RangeStats,
    sheet: &Worksheet,
    strings: &SharedStrings,
) -> Option<f64> {
    let literal = || {
        cfvo.value
            .as_deref()
            .and_then(Operand::parse)
            .and_then(|o| o.value(sheet, strings))
            .and_then(|v| v.number())
            .filter(|v| v.is_finite())
    };
    match cfvo.value_type {
        CfvoType::Min => stats.min(),
        CfvoType::Max => stats.max(),
        CfvoType::AutoMin => stats.min().map(|m| m.min(0.)),
        CfvoType::AutoMax => stats.max().map(|m| m.max(0.)),
        CfvoType::Number | CfvoType::Formula => literal(),
        CfvoType::Percent => {
            let (min, max) = (stats.min()?, stats.max()?);
            Some(min + literal()? / 100. * (max - min))
        }
        CfvoType::Percentile => stats.percentile(literal()?),
    }
}

fn prepare_scale(
    scale: &ColorScale,
    stats: &RangeStats,
    sheet: &Worksheet,
    strings: &SharedStrings,
) -> Option<Vec<(f64, Rgb)>> {
    if !(2..=3).contains(&scale.cfvos.len()) || scale.colors.len() < scale.cfvos.len() {
        warn!(
            "color scale with {} stops and {} colors ignored",
            scale.cfvos.len(),
            scale.colors.len()
        );
        return None;
    }
    let last = scale.cfvos.len() - 1;
    let mut stops = Vec::with_capacity(scale.cfvos.len());
    for (i, (cfvo, color)) in scale.cfvos.iter().zip(&scale.colors).enumerate() {
        let position = match resolve_cfvo(cfvo, stats, sheet, strings) {
            Some(p) => p,
            None if i == 0 => stats.min()?,
            None if i == last => stats.max()?,
            None => stats.percentile(50.)?,
        };
        stops.push((position, *color));
    }
    Some(stops)
}

/// Color of a value on a 2 or 3 stop scale
fn scale_color(stops: &[(f64, Rgb)], value: f64) -> Option<Rgb> {
    let (low, c_low) = *stops.first()?;
    let (high, c_high) = *stops.last()?;
    let v = value.max(low).min(high);
    if stops.len() == 2 {
        return Some(c_low.interpolate(c_high, (v - low) / (high - low)));
    }
    let (mid, c_mid) = *stops.get(1)?;
    if v < mid {
        Some(c_low.interpolate(c_mid, (v - low) / (mid - low)))
    } else {
        Some(c_mid.interpolate(c_high, (v - mid) / (high - mid)))
    }
}

/// Effective bounds and zero point of a data bar
struct BarGeometry<'a> {
    bar: &'a DataBar,
    color: Rgb,
    min: f64,
    max: f64,
    negative_ratio: f64,
    positive_ratio: f64,
}

const NEGATIVE_BAR: Rgb = Rgb::new(0xFF, 0, 0);

impl<'a> BarGeometry<'a> {
    fn new(
        bar: &'a DataBar,
        stats: &RangeStats,
        sheet: &Worksheet,
        strings: &SharedStrings,
    ) -> Option<Self> {
        let Some(color) = bar.color else {
            warn!("data bar without color ignored");
            return None;
        };
        let bound = |cfvo: &Option<ConditionalFormatValue>| match cfvo {
            Some(c) if !matches!(c.value_type, CfvoType::Min | CfvoType::Max) => {
                resolve_cfvo(c, stats, sheet, strings)
            }
            _ => None,
        };
        let min = bound(&bar.min_cfvo).unwrap_or(stats.min()?.min(0.));
        let max = bound(&bar.max_cfvo).unwrap_or(stats.max()?.max(0.));
        let diff = max - min;
        let negative_ratio = if min < 0. && diff > 0. {
            min.abs() / diff * 100.
        } else {
            0.
        };
        let positive_ratio = if max > 0. { 100. - negative_ratio } else { 0. };
        Some(BarGeometry {
            bar,
            color,
            min,
            max,
            negative_ratio,
            positive_ratio,
        })
    }

    fn graphic(&self, value: f64, height: u32) -> DataBarGraphic {
        let bar = self.bar;
        let axis = bar.axis_color.unwrap_or(Rgb::BLACK);
        if value >= 0. {
            let width = if self.min < 0. {
                value / self.max * self.positive_ratio
            } else {
                (value - self.min) / (self.max - self.min) * self.positive_ratio
            };
            let width = finite_or_zero(width).clamp(0., self.positive_ratio);
            let has_axis = self.negative_ratio != 0.;
            DataBarGraphic {
                width,
                offset: has_axis.then_some(self.negative_ratio),
                height,
                color: self.color,
                negative: false,
                gradient: bar.gradient,
                border: (bar.border && width != 0.)
                    .then(|| bar.border_color.unwrap_or(self.color)),
                axis: has_axis.then_some(axis),
            }
        } else {
            let start = if self.max < 0. {
                value / self.min * self.negative_ratio
            } else {
                (value - self.min) / (0. - self.min) * self.negative_ratio
            };
            let start = finite_or_zero(start).clamp(0., 100.);
            let width = (self.negative_ratio - start).max(0.);
            let color = bar.negative_color.unwrap_or(NEGATIVE_BAR);
            DataBarGraphic {
                width,
                offset: (width != 0.).then_some(start),
                height,
                color,
                negative: true,
                gradient: bar.gradient,
                border: (bar.border && width != 0.)
                    .then(|| bar.negative_border_color.unwrap_or(color)),
                axis: (self.max > 0.).then_some(axis),
            }
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.
    }
}

/// Bar height for a row: 14px, or the row height less 5px for tall rows
fn bar_height(sheet: &Worksheet, row: u32) -> u32 {
    match sheet.row_heights.get(&row) {
        Some(ht) if (ht * 1.3) as u32 > 20 => (ht * 1.3) as u32 - 5,
        _ => 14,
    }
}

fn prepare<'a>(
    rule: &'a ConditionalFormatRule,
    stats: &RangeStats,
    sheet: &Worksheet,
    strings: &SharedStrings,
) -> Prepared<'a> {
    match &rule.rule_type {
        ConditionalFormatType::CellIs { operator, operands } => {
            let values: Option<Vec<RuleValue>> =
                operands.iter().map(|o| o.value(sheet, strings)).collect();
            match values {
                Some(operands) if operands.len() >= operator.arity() => Prepared::Compare {
                    operator: *operator,
                    operands,
                },
                _ => Prepared::Never,
            }
        }
        ConditionalFormatType::Text { operator, text } => match text.value(sheet, strings) {
            Some(v) => Prepared::Text {
                operator: *operator,
                needle: v.text(),
            },
            None => Prepared::Never,
        },
        ConditionalFormatType::DuplicateValues => Prepared::Occurrences { duplicate: true },
        ConditionalFormatType::UniqueValues => Prepared::Occurrences { duplicate: false },
        ConditionalFormatType::Top10 {
            bottom,
            percent,
            rank,
        } => {
            let n = stats.sorted.len();
            let rank = if *percent {
                (n * *rank as usize / 100).max(1)
            } else {
                *rank as usize
            };
            if n == 0 || rank == 0 {
                return Prepared::Never;
            }
            let rank = rank.min(n);
            if *bottom {
                stats
                    .sorted
                    .get(rank - 1)
                    .map_or(Prepared::Never, |t| Prepared::AtMost(*t))
            } else {
                stats
                    .sorted
                    .get(n - rank)
                    .map_or(Prepared::Never, |t| Prepared::AtLeast(*t))
            }
        }
        ConditionalFormatType::AboveAverage {
            below,
            equal_average,
            std_dev,
        } => match stats.mean() {
            Some(mean) => {
                let spread = std_dev.map_or(0., |k| f64::from(k) * stats.std_dev(mean));
                Prepared::Average {
                    bound: if *below { mean - spread } else { mean + spread },
                    below: *below,
                    inclusive: *equal_average,
                }
            }
            None => Prepared::Never,
        },
        ConditionalFormatType::ColorScale(scale) => prepare_scale(scale, stats, sheet, strings)
            .map_or(Prepared::Never, Prepared::Scale),
        ConditionalFormatType::DataBar(bar) => {
            BarGeometry::new(bar, stats, sheet, strings).map_or(Prepared::Never, Prepared::Bar)
        }
        ConditionalFormatType::Unsupported(kind) => {
            debug!("skipping unsupported conditional format {kind}");
            Prepared::Never
        }
    }
}

/// Contribution of one rule to one cell
enum Contribution<'a> {
    Format(&'a DifferentialFormat),
    Scale(Rgb),
    Bar(DataBarGraphic),
}

/// Evaluates every conditional formatting group of a sheet
pub fn evaluate(sheet: &Worksheet, strings: &SharedStrings, styles: &Stylesheet) -> OverlayMap {
    let mut contributions: BTreeMap<(u32, u32), Vec<(i32, Contribution<'_>)>> = BTreeMap::new();
    for group in &sheet.conditional_formats {
        let stats = RangeStats::collect(&group.ranges, sheet, strings);
        let mut rules: Vec<_> = group.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        let prepared: Vec<_> = rules
            .iter()
            .map(|r| (*r, prepare(r, &stats, sheet, strings)))
            .collect();
        for (&pos, value) in &stats.values {
            let cell = contributions.entry(pos).or_default();
            let winner = prepared
                .iter()
                .find(|(r, p)| r.rule_type.is_discrete() && p.matches(value, &stats));
            if let Some(dxf) = winner
                .and_then(|(r, _)| r.format.as_ref())
                .and_then(|f| f.resolve(styles))
            {
                cell.push((winner.map_or(0, |(r, _)| r.priority), Contribution::Format(dxf)));
            }
            let Some(number) = value.number() else {
                continue;
            };
            for (rule, p) in &prepared {
                match p {
                    Prepared::Scale(stops) => {
                        if let Some(c) = scale_color(stops, number) {
                            cell.push((rule.priority, Contribution::Scale(c)));
                        }
                    }
                    Prepared::Bar(geometry) => {
                        let graphic = geometry.graphic(number, bar_height(sheet, pos.0));
                        cell.push((rule.priority, Contribution::Bar(graphic)));
                    }
                    _ => (),
                }
            }
        }
    }

    let mut overlays = OverlayMap::new();
    for (pos, mut list) in contributions {
        if list.is_empty() {
            continue;
        }
        list.sort_by_key(|(priority, _)| *priority);
        let mut overlay = ConditionalOverlay::default();
        for (_, contribution) in list {
            match contribution {
                Contribution::Format(dxf) => overlay.merge_format(dxf),
                Contribution::Scale(c) => {
                    overlay.scale_fill.get_or_insert(c);
                }
                Contribution::Bar(bar) => {
                    overlay.data_bar.get_or_insert(bar);
                }
            }
        }
        overlays.insert(pos, overlay);
    }
    overlays
}
