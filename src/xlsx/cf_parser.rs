// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Parser of `<conditionalFormatting>` blocks, including the 2010 extension
//! list variant (`x14:conditionalFormatting`) which carries the extended data
//! bar settings and rules whose operands are cell references.

use std::io::BufRead;

use log::warn;
use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    name::QName,
    Reader,
};

use super::style_parser::{parse_dxf, read_color_ref};
use super::{attribute_value, get_attribute, get_ranges, read_text, XlsxError};
use crate::color::Rgb;
use crate::conditional_formatting::{
    CfvoType, ColorScale, ComparisonOperator, ConditionalFormatRule, ConditionalFormatType,
    ConditionalFormatValue, ConditionalFormatting, DataBar, Operand, RuleFormat, TextOperator,
};
use crate::style::DifferentialFormat;
use crate::theme::ThemeColors;
use crate::worksheet::Dimensions;

/// A conditional formatting block as read from the sheet
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedGroup {
    pub group: ConditionalFormatting,
    /// The ranges came from an `xm:sqref` child, i.e. an extension block
    pub extension: bool,
}

/// Reads a `<conditionalFormatting>` element up to its closing tag
pub(crate) fn read_conditional_formatting<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<ParsedGroup, XlsxError> {
    let mut ranges = attribute_value(start, b"sqref", xml.decoder())?
        .map(|s| get_ranges(&s))
        .unwrap_or_default();
    let mut extension = false;
    let mut rules = Vec::new();
    let mut buf = Vec::with_capacity(512);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"cfRule" => rules.push(read_rule(xml, e, theme)?),
                b"sqref" => {
                    ranges = get_ranges(&read_text(xml, e.name())?);
                    extension = true;
                }
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("conditionalFormatting")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(ParsedGroup {
        group: ConditionalFormatting { ranges, rules },
        extension,
    })
}

/// Attributes and children of a `<cfRule>`, collected before the rule is built
struct RuleBuilder {
    kind: String,
    operator: Option<String>,
    priority: i32,
    dxf_id: Option<usize>,
    inline_dxf: Option<DifferentialFormat>,
    text: Option<String>,
    formulas: Vec<String>,
    rank: Option<u32>,
    bottom: bool,
    percent: bool,
    above_average: bool,
    equal_average: bool,
    std_dev: Option<u32>,
    id: Option<String>,
    scale: ColorScale,
    bar: DataBar,
}

impl RuleBuilder {
    fn new() -> Self {
        RuleBuilder {
            kind: String::new(),
            operator: None,
            priority: 0,
            dxf_id: None,
            inline_dxf: None,
            text: None,
            formulas: Vec::new(),
            rank: None,
            bottom: false,
            percent: false,
            above_average: true,
            equal_average: false,
            std_dev: None,
            id: None,
            scale: ColorScale::default(),
            bar: DataBar::default(),
        }
    }

    fn build(self) -> ConditionalFormatRule {
        let rule_type = match self.kind.as_str() {
            "cellIs" => match self
                .operator
                .as_deref()
                .and_then(ComparisonOperator::from_name)
            {
                Some(operator) => {
                    let operands = self
                        .formulas
                        .iter()
                        .map(|f| Operand::parse(f))
                        .collect::<Option<Vec<_>>>()
                        .unwrap_or_else(|| {
                            warn!("unsupported cellIs operands {:?}", self.formulas);
                            Vec::new()
                        });
                    ConditionalFormatType::CellIs { operator, operands }
                }
                None => ConditionalFormatType::Unsupported(format!(
                    "cellIs {}",
                    self.operator.as_deref().unwrap_or_default()
                )),
            },
            kind @ ("containsText" | "notContainsText" | "beginsWith" | "endsWith") => {
                let operator = self
                    .operator
                    .as_deref()
                    .and_then(TextOperator::from_name)
                    .or_else(|| TextOperator::from_name(kind));
                let text = match self.text {
                    Some(t) => Some(Operand::Text(t)),
                    None => self.formulas.iter().rev().find_map(|f| Operand::parse(f)),
                };
                match (operator, text) {
                    (Some(operator), Some(text)) => ConditionalFormatType::Text { operator, text },
                    _ => ConditionalFormatType::Unsupported(kind.to_string()),
                }
            }
            "duplicateValues" => ConditionalFormatType::DuplicateValues,
            "uniqueValues" => ConditionalFormatType::UniqueValues,
            "top10" => ConditionalFormatType::Top10 {
                bottom: self.bottom,
                percent: self.percent,
                rank: self.rank.unwrap_or(10),
            },
            "aboveAverage" => ConditionalFormatType::AboveAverage {
                below: !self.above_average,
                equal_average: self.equal_average,
                std_dev: self.std_dev,
            },
            "colorScale" => ConditionalFormatType::ColorScale(self.scale),
            "dataBar" => {
                let mut bar = self.bar;
                if bar.ext_id.is_none() {
                    bar.ext_id = self.id;
                }
                ConditionalFormatType::DataBar(bar)
            }
            other => ConditionalFormatType::Unsupported(other.to_string()),
        };
        ConditionalFormatRule {
            rule_type,
            priority: self.priority,
            format: self
                .inline_dxf
                .map(RuleFormat::Inline)
                .or(self.dxf_id.map(RuleFormat::Dxf)),
        }
    }
}

fn is_true(v: &[u8]) -> bool {
    v == b"1" || v == b"true"
}

/// Reads a `<cfRule>` up to its closing tag
fn read_rule<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<ConditionalFormatRule, XlsxError> {
    let mut rule = RuleBuilder::new();
    for a in start.attributes() {
        let a = a.map_err(XlsxError::XmlAttr)?;
        match a {
            Attribute {
                key: QName(b"type"),
                value: ref v,
            } => rule.kind = xml.decoder().decode(v)?.into_owned(),
            Attribute {
                key: QName(b"operator"),
                value: ref v,
            } => rule.operator = Some(xml.decoder().decode(v)?.into_owned()),
            Attribute {
                key: QName(b"priority"),
                value: ref v,
            } => rule.priority = atoi_simd::parse::<i32>(v).unwrap_or(0),
            Attribute {
                key: QName(b"dxfId"),
                value: ref v,
            } => rule.dxf_id = atoi_simd::parse::<usize>(v).ok(),
            Attribute {
                key: QName(b"text"),
                ..
            } => rule.text = Some(a.decode_and_unescape_value(xml.decoder())?.into_owned()),
            Attribute {
                key: QName(b"rank"),
                value: ref v,
            } => rule.rank = atoi_simd::parse::<u32>(v).ok(),
            Attribute {
                key: QName(b"bottom"),
                value: ref v,
            } => rule.bottom = is_true(v),
            Attribute {
                key: QName(b"percent"),
                value: ref v,
            } => rule.percent = is_true(v),
            Attribute {
                key: QName(b"aboveAverage"),
                value: ref v,
            } => rule.above_average = !matches!(&**v, b"0" | b"false"),
            Attribute {
                key: QName(b"equalAverage"),
                value: ref v,
            } => rule.equal_average = is_true(v),
            Attribute {
                key: QName(b"stdDev"),
                value: ref v,
            } => rule.std_dev = atoi_simd::parse::<u32>(v).ok(),
            Attribute {
                key: QName(b"id"),
                value: ref v,
            } => rule.id = Some(xml.decoder().decode(v)?.into_owned()),
            _ => (),
        }
    }

    let mut buf = Vec::with_capacity(512);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"formula" | b"f" => rule.formulas.push(read_text(xml, e.name())?),
                b"colorScale" => rule.scale = read_color_scale(xml, e, theme)?,
                b"dataBar" => read_data_bar(xml, e, theme, &mut rule.bar)?,
                b"dxf" => rule.inline_dxf = Some(parse_dxf(xml, e, theme)?),
                b"id" => rule.bar.ext_id = Some(read_text(xml, e.name())?.trim().to_string()),
                b"extLst" | b"ext" => (),
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("cfRule")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(rule.build())
}

/// Reads a `<cfvo>`, its value either in `val` or in an `xm:f` child
fn read_cfvo<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
) -> Result<ConditionalFormatValue, XlsxError> {
    let value_type = match attribute_value(start, b"type", xml.decoder())? {
        Some(t) => CfvoType::from_name(&t).unwrap_or_else(|| {
            warn!("unknown cfvo type {t:?}");
            CfvoType::Number
        }),
        None => CfvoType::Min,
    };
    let mut cfvo = ConditionalFormatValue {
        value_type,
        value: attribute_value(start, b"val", xml.decoder())?,
    };
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"f" => {
                cfvo.value = Some(read_text(xml, e.name())?);
            }
            Ok(Event::Start(ref e)) => {
                xml.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("cfvo")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(cfvo)
}

fn read_color_scale<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
) -> Result<ColorScale, XlsxError> {
    let mut cfvos = Vec::new();
    let mut colors: Vec<Option<Rgb>> = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"cfvo" => cfvos.push(read_cfvo(xml, e)?),
                b"color" => {
                    colors.push(read_color_ref(e)?.resolve(theme));
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
                _ => {
                    xml.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("colorScale")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    let colors = colors.into_iter().collect::<Option<Vec<_>>>().unwrap_or_else(|| {
        warn!("color scale with an unresolved color");
        Vec::new()
    });
    Ok(ColorScale { cfvos, colors })
}

fn read_data_bar<RS: BufRead>(
    xml: &mut Reader<RS>,
    start: &BytesStart<'_>,
    theme: &ThemeColors,
    bar: &mut DataBar,
) -> Result<(), XlsxError> {
    if let Some(v) = get_attribute(start.attributes(), QName(b"border"))? {
        bar.border = is_true(v);
    }
    if let Some(v) = get_attribute(start.attributes(), QName(b"gradient"))? {
        bar.gradient = !matches!(v, b"0" | b"false");
    }
    let mut cfvo_count = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"cfvo" => {
                        let cfvo = read_cfvo(xml, e)?;
                        if cfvo_count == 0 {
                            bar.min_cfvo = Some(cfvo);
                        } else if cfvo_count == 1 {
                            bar.max_cfvo = Some(cfvo);
                        }
                        cfvo_count += 1;
                        continue;
                    }
                    b"color" | b"fillColor" => bar.color = read_color_ref(e)?.resolve(theme),
                    b"borderColor" => bar.border_color = read_color_ref(e)?.resolve(theme),
                    b"negativeFillColor" => {
                        bar.negative_color = read_color_ref(e)?.resolve(theme)
                    }
                    b"negativeBorderColor" => {
                        bar.negative_border_color = read_color_ref(e)?.resolve(theme)
                    }
                    b"axisColor" => bar.axis_color = read_color_ref(e)?.resolve(theme),
                    _ => (),
                }
                xml.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Ok(Event::End(ref e)) if e.name() == start.name() => break,
            Ok(Event::Eof) => return Err(XlsxError::XmlEof("dataBar")),
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => (),
        }
    }
    Ok(())
}

/// Folds extension blocks into the main ones: an extension data bar completes
/// the main data bar with the same id (or, failing that, the same ranges).
/// Other extension rules are kept as their own groups.
pub(crate) fn merge_extensions(
    mut groups: Vec<ConditionalFormatting>,
    extensions: Vec<ConditionalFormatting>,
) -> Vec<ConditionalFormatting> {
    for ext in extensions {
        let mut rest = Vec::new();
        for rule in ext.rules {
            let joined = match &rule.rule_type {
                ConditionalFormatType::DataBar(bar) => {
                    match find_data_bar(&mut groups, bar, &ext.ranges) {
                        Some(main) => {
                            main.extend(bar);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            };
            if !joined {
                rest.push(rule);
            }
        }
        if !rest.is_empty() {
            groups.push(ConditionalFormatting {
                ranges: ext.ranges,
                rules: rest,
            });
        }
    }
    groups
}

fn find_data_bar<'a>(
    groups: &'a mut [ConditionalFormatting],
    ext: &DataBar,
    ranges: &[Dimensions],
) -> Option<&'a mut DataBar> {
    let mut by_id = None;
    let mut by_range = None;
    for (g, group) in groups.iter().enumerate() {
        for (r, rule) in group.rules.iter().enumerate() {
            if let ConditionalFormatType::DataBar(bar) = &rule.rule_type {
                if bar.ext_id.is_some() && bar.ext_id == ext.ext_id {
                    by_id = Some((g, r));
                } else if by_range.is_none() && group.ranges == ranges {
                    by_range = Some((g, r));
                }
            }
        }
    }
    let (g, r) = by_id.or(by_range)?;
    match &mut groups.get_mut(g)?.rules.get_mut(r)?.rule_type {
        ConditionalFormatType::DataBar(bar) => Some(bar),
        _ => None,
    }
}
