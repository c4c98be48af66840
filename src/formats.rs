// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Number format interpreter
//!
//! Applies a spreadsheet number format code to a numeric cell value. The
//! interpreter never fails: codes it cannot make sense of fall back to the
//! general display of the number.
//!
//! ```
//! use xlsx_html::format_number;
//!
//! assert_eq!(format_number("0.00", 3.14159).to_string(), "3.14");
//! assert_eq!(format_number("\"£\"#,##0.00", -1234.5).to_string(), "-£1,234.50");
//! assert_eq!(format_number("ZZZ", 1.5).to_string(), "36:00:00");
//! ```

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::color::{indexed_color, Rgb};
use crate::utils::trim_decimal;

/// Category of a number format code, deciding how a value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormatKind {
    /// Adaptive rounding of the raw value
    General,
    /// Digit placeholders (decimal, grouped, percentage, scientific, currency)
    Number,
    /// Vulgar fractions (`# ?/?`)
    Fraction,
    /// Calendar date and/or time of day
    DateTime,
    /// Elapsed time (`[h]:mm:ss`)
    TimeDelta,
    /// The `ZZZ` duration sentinel, rendered as `H:MM:SS`
    Duration,
}

/// A value rendered through a number format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedNumber {
    /// Displayed text
    pub text: String,
    /// Color forced by a `[Red]`-like section tag
    pub color: Option<Rgb>,
    /// Two-column layout of accounting formats
    pub accounting: Option<Accounting>,
}

/// Accounting layout: the currency unit is pushed to the left edge of the
/// cell and the amount to the right edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accounting {
    /// Left column (sign and currency unit)
    pub lead: String,
    /// Right column (amount or a dash for zero)
    pub amount: String,
}

impl FormattedNumber {
    fn plain(text: String) -> Self {
        FormattedNumber {
            text,
            ..Default::default()
        }
    }
}

impl fmt::Display for FormattedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Default code of the built-in number format ids, used when the workbook
/// does not declare them
pub fn builtin_format_code(id: u32) -> &'static str {
    match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"£\"#,##0;\\-\"£\"#,##0",
        6 => "\"£\"#,##0;[Red]\\-\"£\"#,##0",
        7 => "\"£\"#,##0.00;\\-\"£\"#,##0.00",
        8 => "\"£\"#,##0.00;[Red]\\-\"£\"#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "#\\ ?/?",
        13 => "#\\ ??/??",
        14 => "dd/mm/yyyy;@",
        15 => "dd-mmm-yy;@",
        16 => "dd-mmm;@",
        17 => "mmm-yy;@",
        18 => "h:mm\\ AM/PM;@",
        19 => "h:mm:ss\\ AM/PM;@",
        20 => "hh:mm;@",
        21 => "hh:mm:ss;@",
        22 => "dd/mm/yyyy\\ hh:mm;@",
        37 => "#,##0;\\-#,##0",
        38 => "#,##0;[Red]\\-#,##0",
        39 => "#,##0.00;\\-#,##0.00",
        40 => "#,##0.00;[Red]\\-#,##0.00",
        42 => "_-\"£\"* #,##0_-;\\-\"£\"* #,##0_-;_-\"£\"* \"-\"_-;_-@_-",
        44 => "_-\"£\"* #,##0.00_-;\\-\"£\"* #,##0.00_-;_-\"£\"* \"-\"??_-;_-@_-",
        45 => "mm:ss;@",
        46 => "ZZZ",
        47 => "mm:ss.0;@",
        _ => "General",
    }
}

/// Scans the first section of a code for date and time tokens outside of
/// quotes, escapes and brackets. `None` when there are none.
fn detect_date_tokens(format: &str) -> Option<NumberFormatKind> {
    let mut escaped = false;
    let mut is_quote = false;
    let mut brackets = 0u8;
    let mut prev = ' ';
    let mut hms = false;
    let mut ap = false;

    for s in format.chars() {
        match (s, escaped, is_quote, ap, brackets) {
            (_, true, ..) => escaped = false, // if escaped, ignore
            ('_' | '\\' | '*', ..) => escaped = true,
            ('"', _, true, _, _) => is_quote = false,
            (_, _, true, _, _) => (),
            ('"', _, _, _, _) => is_quote = true,
            (';', ..) => return None, // first section only
            ('[', ..) => brackets += 1,
            (']', .., 1) if hms => return Some(NumberFormatKind::TimeDelta),
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => ap = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => {
                return Some(NumberFormatKind::DateTime)
            }
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return Some(NumberFormatKind::DateTime)
            }
            _ => {
                if hms && s.eq_ignore_ascii_case(&prev) {
                    // ok ...
                } else {
                    hms = prev == '[' && matches!(s, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            }
        }
        prev = s;
    }
    None
}

/// Detects how a format code renders numbers
pub fn detect_number_format(code: &str) -> NumberFormatKind {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("general") {
        return NumberFormatKind::General;
    }
    if trimmed == "ZZZ" {
        return NumberFormatKind::Duration;
    }
    if let Some(kind) = detect_date_tokens(code) {
        return kind;
    }
    let sections = split_sections(code);
    let first = decode_section(sections.first().copied().unwrap_or_default()).0;
    if trimmed.ends_with(";@") && !first.iter().any(Sym::is_placeholder) {
        return NumberFormatKind::DateTime;
    }
    if first.contains(&Sym::Code('/')) && first.iter().any(Sym::is_placeholder) {
        return NumberFormatKind::Fraction;
    }
    let numeric = sections.iter().any(|s| {
        let syms = decode_section(s).0;
        syms.iter().any(Sym::is_placeholder) || (0..syms.len()).any(|i| is_general_at(&syms, i))
    });
    if numeric {
        NumberFormatKind::Number
    } else {
        NumberFormatKind::General
    }
}

/// Renders `value` through the format `code`
pub fn format_number(code: &str, value: f64) -> FormattedNumber {
    if !value.is_finite() {
        return FormattedNumber::plain(format_general(value));
    }
    let formatted = match detect_number_format(code) {
        NumberFormatKind::General => None,
        NumberFormatKind::Duration => Some(FormattedNumber::plain(format_duration(value))),
        NumberFormatKind::DateTime | NumberFormatKind::TimeDelta => format_datetime(code, value),
        NumberFormatKind::Fraction => format_fraction(code, value),
        NumberFormatKind::Number => Some(format_sections(code, value)),
    };
    formatted.unwrap_or_else(|| FormattedNumber::plain(format_general(value)))
}

/// Displays a raw number, keeping fewer decimals as the magnitude grows:
/// 9 decimals below 10, none at or above 1e9
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    let mut decimals = 9usize;
    let mut bound = 10.0;
    while decimals > 0 && magnitude >= bound {
        decimals -= 1;
        bound *= 10.0;
    }
    trim_decimal(value, decimals)
}

/// `ZZZ`: whole hours (days included), minutes and seconds
fn format_duration(value: f64) -> String {
    let sign = if value < 0. { "-" } else { "" };
    let total = (value.abs() * 86400.).round() as u64;
    format!(
        "{sign}{}:{:02}:{:02}",
        total / 3600,
        total / 60 % 60,
        total % 60
    )
}

/// A decoded format code symbol
#[derive(Debug, Clone, PartialEq)]
enum Sym {
    /// Quoted, escaped or currency text
    Lit(char),
    /// Unquoted code character
    Code(char),
    /// `*x` repeat fill
    Fill,
    /// Bracketed content that is neither a color nor a currency
    Bracket(String),
}

impl Sym {
    fn is_placeholder(&self) -> bool {
        matches!(self, Sym::Code('0' | '#' | '?'))
    }
}

/// Splits a code on `;` outside of quotes, escapes and brackets
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    let mut bracket = false;
    for (i, c) in code.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '"' => quoted = !quoted,
            _ if quoted => (),
            '\\' | '_' | '*' => escaped = true,
            '[' => bracket = true,
            ']' => bracket = false,
            ';' if !bracket => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    sections.push(&code[start..]);
    sections
}

fn named_color(name: &str) -> Option<Rgb> {
    let lower = name.to_ascii_lowercase();
    let rgb = match lower.as_str() {
        "black" => 0x000000,
        "blue" => 0x0000FF,
        "cyan" => 0x00FFFF,
        "green" => 0x00FF00,
        "magenta" => 0xFF00FF,
        "red" => 0xFF0000,
        "white" => 0xFFFFFF,
        "yellow" => 0xFFFF00,
        _ => {
            let n = lower.strip_prefix("color")?.parse::<u32>().ok()?;
            return indexed_color(n + 7);
        }
    };
    Some(Rgb::from_u32(rgb))
}

/// Resolves quotes, escapes, paddings and bracket tags of a section
fn decode_section(section: &str) -> (Vec<Sym>, Option<Rgb>) {
    let mut syms = Vec::new();
    let mut color = None;
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                    syms.push(Sym::Lit(q));
                }
            }
            '\\' => {
                if let Some(n) = chars.next() {
                    syms.push(Sym::Lit(n));
                }
            }
            '_' => {
                chars.next();
            }
            '*' => {
                chars.next();
                syms.push(Sym::Fill);
            }
            '[' => {
                let mut content = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    content.push(b);
                }
                if let Some(currency) = content.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or_default();
                    syms.extend(symbol.chars().map(Sym::Lit));
                } else if let Some(c) = named_color(&content) {
                    color = Some(c);
                } else {
                    syms.push(Sym::Bracket(content));
                }
            }
            c => syms.push(Sym::Code(c)),
        }
    }
    (syms, color)
}

fn is_general_at(syms: &[Sym], i: usize) -> bool {
    let word: String = syms
        .iter()
        .skip(i)
        .take(7)
        .map_while(|s| match s {
            Sym::Code(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect();
    word == "general"
}

/// Picks the section used for `value`: positive; negative; zero.
/// Returns the section and whether a minus sign must be added.
fn pick_section<'a>(sections: &[&'a str], value: f64) -> (&'a str, bool) {
    match sections {
        [] => ("", value < 0.),
        [only] => (only, value < 0.),
        [pos, neg, rest @ ..] => {
            if value < 0. {
                (neg, false)
            } else if value == 0. && !rest.is_empty() {
                (rest[0], false)
            } else {
                (pos, false)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Exponent {
    plus: bool,
    digits: usize,
}

/// Digit placeholder layout of one section
#[derive(Debug, Default)]
struct NumberPattern {
    lead: Option<String>,
    prefix: String,
    suffix: String,
    int_digits: usize,
    int_zeros: usize,
    grouping: bool,
    thousands_scale: i32,
    min_decimals: usize,
    max_decimals: usize,
    percent: i32,
    exponent: Option<Exponent>,
    general: bool,
}

impl NumberPattern {
    fn parse(syms: &[Sym]) -> Self {
        let mut p = NumberPattern::default();
        let mut started = false;
        let mut after_point = false;
        let mut in_exponent = false;
        let mut i = 0;
        while i < syms.len() {
            let next_is_placeholder = syms.get(i + 1).is_some_and(Sym::is_placeholder);
            match &syms[i] {
                Sym::Fill if !started => p.lead = Some(std::mem::take(&mut p.prefix)),
                Sym::Fill | Sym::Bracket(_) => (),
                Sym::Lit(c) => p.push_literal(*c, started),
                Sym::Code(c) => match *c {
                    '0' | '#' | '?' => {
                        started = true;
                        if let (true, Some(e)) = (in_exponent, p.exponent.as_mut()) {
                            e.digits += 1;
                        } else if after_point {
                            p.max_decimals += 1;
                            if *c == '0' {
                                p.min_decimals = p.max_decimals;
                            }
                        } else {
                            p.int_digits += 1;
                            if *c == '0' {
                                p.int_zeros += 1;
                            }
                        }
                    }
                    ',' if started && !after_point && next_is_placeholder => p.grouping = true,
                    ',' if started => p.thousands_scale += 1,
                    '.' if !after_point && !in_exponent && (started || next_is_placeholder) => {
                        started = true;
                        after_point = true;
                    }
                    '%' => {
                        p.percent += 1;
                        p.push_literal('%', started);
                    }
                    'E' | 'e'
                        if started && matches!(syms.get(i + 1), Some(Sym::Code('+' | '-'))) =>
                    {
                        p.exponent = Some(Exponent {
                            plus: syms.get(i + 1) == Some(&Sym::Code('+')),
                            digits: 0,
                        });
                        in_exponent = true;
                        i += 1;
                    }
                    'G' | 'g' if is_general_at(syms, i) => {
                        p.general = true;
                        started = true;
                        i += 6;
                    }
                    '@' => (),
                    c => p.push_literal(c, started),
                },
            }
            i += 1;
        }
        p
    }

    fn push_literal(&mut self, c: char, started: bool) {
        if started {
            self.suffix.push(c);
        } else {
            self.prefix.push(c);
        }
    }

    fn has_number(&self) -> bool {
        self.general || self.int_digits > 0 || self.max_decimals > 0
    }

    /// Renders the digits of a non negative value
    fn digits(&self, value: f64) -> String {
        let v = value * 100f64.powi(self.percent) / 1000f64.powi(self.thousands_scale);
        if self.general {
            return format_general(v);
        }
        if let Some(e) = self.exponent {
            return self.scientific(v, e);
        }
        let s = format!("{:.*}", self.max_decimals, round_half_up(v, self.max_decimals));
        let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), ""));
        let mut frac = frac.to_string();
        while frac.len() > self.min_decimals && frac.ends_with('0') {
            frac.pop();
        }
        let int = if int == "0" && self.int_zeros == 0 {
            String::new()
        } else {
            format!("{int:0>width$}", width = self.int_zeros)
        };
        let mut out = if self.grouping {
            group_thousands(&int)
        } else {
            int
        };
        if !frac.is_empty() {
            out.push('.');
            out.push_str(&frac);
        }
        out
    }

    fn scientific(&self, v: f64, e: Exponent) -> String {
        let (mut exp, mantissa) = if v == 0. {
            (0, 0.)
        } else {
            let exp = v.log10().floor() as i32;
            (exp, v / 10f64.powi(exp))
        };
        let mut m = format!(
            "{:.*}",
            self.max_decimals,
            round_half_up(mantissa, self.max_decimals)
        );
        if m.starts_with("10") {
            exp += 1;
            m = format!(
                "{:.*}",
                self.max_decimals,
                round_half_up(mantissa / 10., self.max_decimals)
            );
        }
        let sign = match (exp < 0, e.plus) {
            (true, _) => "-",
            (false, true) => "+",
            (false, false) => "",
        };
        format!(
            "{m}E{sign}{:0>width$}",
            exp.unsigned_abs(),
            width = e.digits
        )
    }
}

/// Rounds halves away from zero, as spreadsheets display them
fn round_half_up(v: f64, decimals: usize) -> f64 {
    let p = 10f64.powi(decimals.min(15) as i32);
    let r = (v * p).round() / p;
    if r.is_finite() {
        r
    } else {
        v
    }
}

fn group_thousands(int: &str) -> String {
    let len = int.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Digit placeholder branch, with up to four sections
fn format_sections(code: &str, value: f64) -> FormattedNumber {
    let sections = split_sections(code);
    let (section, minus) = pick_section(&sections, value);
    let (syms, color) = decode_section(section);
    let pattern = NumberPattern::parse(&syms);

    let sign = if minus { "-" } else { "" };
    let digits = if !pattern.has_number() {
        String::new()
    } else if pattern.lead.is_some() && value == 0. && sections.len() < 3 {
        "-".to_string()
    } else {
        pattern.digits(value.abs())
    };
    let amount = format!("{}{}{}", pattern.prefix, digits, pattern.suffix);
    let (text, accounting) = match &pattern.lead {
        Some(lead) => {
            let lead = format!("{sign}{lead}");
            (
                format!("{lead}{amount}"),
                Some(Accounting {
                    lead,
                    amount: amount.clone(),
                }),
            )
        }
        None if pattern.has_number() => (format!("{sign}{amount}"), None),
        None => (amount, None),
    };
    FormattedNumber {
        text,
        color,
        accounting,
    }
}

/// Best rational approximation of `x` in `[0, 1)` with a denominator
/// below `limit`, from the continued fraction convergents
fn best_rational(x: f64, limit: u64) -> (u64, u64) {
    if x <= 0. {
        return (0, 1);
    }
    let (mut h0, mut h1) = (0u64, 1u64);
    let (mut k0, mut k1) = (1u64, 0u64);
    let mut b = x;
    let mut best = (0, 1);
    loop {
        let a = b.floor();
        if a > 1e9 {
            break;
        }
        let a = a as u64;
        let (h, k) = (a * h1 + h0, a * k1 + k0);
        if k >= limit {
            break;
        }
        best = (h, k);
        if (x - h as f64 / k as f64).abs() <= x * 1e-6 {
            break;
        }
        (h0, h1) = (h1, h);
        (k0, k1) = (k1, k);
        let f = b - a as f64;
        if f < 1e-12 {
            break;
        }
        b = 1. / f;
    }
    best
}

fn literal_char(s: &Sym) -> Option<char> {
    match s {
        Sym::Lit(c) => Some(*c),
        Sym::Code(c) if !matches!(c, '0' | '#' | '?' | '/') => Some(*c),
        _ => None,
    }
}

/// Fraction branch (`# ?/?`, `# ??/??`, `# ?/8`, `?/?`)
fn format_fraction(code: &str, value: f64) -> Option<FormattedNumber> {
    let sections = split_sections(code);
    let (section, minus) = pick_section(&sections, value);
    let (syms, color) = decode_section(section);
    let slash = syms.iter().position(|s| *s == Sym::Code('/'))?;

    let denominator: String = syms[slash + 1..]
        .iter()
        .map_while(|s| match s {
            Sym::Code(c) if c.is_ascii_digit() || matches!(c, '?' | '#') => Some(*c),
            _ => None,
        })
        .collect();
    if denominator.is_empty() {
        return None;
    }
    let fixed = if denominator.contains(['?', '#']) {
        None
    } else {
        Some(denominator.parse::<u64>().ok().filter(|d| *d > 0)?)
    };

    let numerator_start = (0..slash)
        .rev()
        .take_while(|&i| syms[i].is_placeholder())
        .last()
        .unwrap_or(slash);
    let whole = syms[..numerator_start].iter().any(Sym::is_placeholder);
    let first_placeholder = syms
        .iter()
        .position(Sym::is_placeholder)
        .unwrap_or(numerator_start);
    let prefix: String = syms[..first_placeholder]
        .iter()
        .filter_map(literal_char)
        .collect();
    let suffix: String = syms[slash + 1 + denominator.len()..]
        .iter()
        .filter_map(literal_char)
        .collect();

    let v = value.abs();
    if !v.is_finite() || v >= u64::MAX as f64 {
        return None;
    }
    let mut int = v.trunc() as u64;
    let frac = v - v.trunc();
    let (mut num, den) = match fixed {
        Some(d) => ((frac * d as f64).round() as u64, d),
        None => best_rational(frac, 10u64.pow(denominator.len().min(4) as u32)),
    };
    if num == den {
        int = int.checked_add(1)?;
        num = 0;
    }
    if !whole {
        num = int.checked_mul(den)?.checked_add(num)?;
        int = 0;
    }
    let body = match (num, whole) {
        (0, _) => int.to_string(),
        (_, true) if int > 0 => format!("{int} {num}/{den}"),
        _ => format!("{num}/{den}"),
    };
    let sign = if minus { "-" } else { "" };
    Some(FormattedNumber {
        text: format!("{sign}{prefix}{body}{suffix}"),
        color,
        accounting: None,
    })
}

/// Date and time tokens of a format section
#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Literal(String),
    Year4,
    Year2,
    /// `m` run, month or minute depending on its neighbours
    M(usize),
    Month(usize),
    Day(usize),
    Hour(bool),
    Minute(bool),
    Second(bool),
    SubSecond(usize),
    AmPm,
    AP,
    ElapsedHours,
    ElapsedMinutes,
    ElapsedSeconds,
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn code_run(syms: &[Sym], i: usize, c: char) -> usize {
    syms[i..]
        .iter()
        .take_while(|s| matches!(s, Sym::Code(x) if x.eq_ignore_ascii_case(&c)))
        .count()
}

fn code_word(syms: &[Sym], i: usize, len: usize) -> String {
    syms.iter()
        .skip(i)
        .take(len)
        .map_while(|s| match s {
            Sym::Code(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

fn tokenize_date(syms: &[Sym]) -> Vec<DateToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < syms.len() {
        let mut step = 1;
        let token = match &syms[i] {
            Sym::Lit(c) => {
                literal.push(*c);
                None
            }
            Sym::Fill => None,
            Sym::Bracket(b) => {
                let b = b.to_ascii_lowercase();
                match b.chars().next() {
                    Some(c) if b.chars().all(|x| x == c) => match c {
                        'h' => Some(DateToken::ElapsedHours),
                        'm' => Some(DateToken::ElapsedMinutes),
                        's' => Some(DateToken::ElapsedSeconds),
                        _ => None,
                    },
                    _ => None,
                }
            }
            Sym::Code(c) => {
                let lower = c.to_ascii_lowercase();
                match lower {
                    'y' | 'm' | 'd' | 'h' | 's' => {
                        step = code_run(syms, i, lower);
                        Some(match lower {
                            'y' if step >= 3 => DateToken::Year4,
                            'y' => DateToken::Year2,
                            'm' => DateToken::M(step),
                            'd' => DateToken::Day(step),
                            'h' => DateToken::Hour(step >= 2),
                            _ => DateToken::Second(step >= 2),
                        })
                    }
                    'a' if code_word(syms, i, 5) == "am/pm" => {
                        step = 5;
                        Some(DateToken::AmPm)
                    }
                    'a' if code_word(syms, i, 3) == "a/p" => {
                        step = 3;
                        Some(DateToken::AP)
                    }
                    '.' if matches!(
                        tokens.last(),
                        Some(DateToken::Second(_) | DateToken::ElapsedSeconds)
                    ) && literal.is_empty()
                        && syms.get(i + 1) == Some(&Sym::Code('0')) =>
                    {
                        let zeros = code_run(syms, i + 1, '0');
                        step = 1 + zeros;
                        Some(DateToken::SubSecond(zeros))
                    }
                    _ => {
                        literal.push(*c);
                        None
                    }
                }
            }
        };
        if let Some(token) = token {
            if !literal.is_empty() {
                tokens.push(DateToken::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(token);
        }
        i += step;
    }
    if !literal.is_empty() {
        tokens.push(DateToken::Literal(literal));
    }

    // an `m` run next to hours or seconds is minutes
    let fields: Vec<usize> = (0..tokens.len())
        .filter(|&i| !matches!(tokens[i], DateToken::Literal(_)))
        .collect();
    for (pos, &i) in fields.iter().enumerate() {
        if let DateToken::M(n) = tokens[i] {
            let after_hour = pos > 0
                && matches!(
                    tokens[fields[pos - 1]],
                    DateToken::Hour(_) | DateToken::ElapsedHours
                );
            let before_second = fields.get(pos + 1).is_some_and(|&j| {
                matches!(tokens[j], DateToken::Second(_) | DateToken::ElapsedSeconds)
            });
            tokens[i] = if n <= 2 && (after_hour || before_second) {
                DateToken::Minute(n == 2)
            } else {
                DateToken::Month(n)
            };
        }
    }
    tokens
}

/// Date/time branch, serial days counted from 1899-12-30
fn format_datetime(code: &str, value: f64) -> Option<FormattedNumber> {
    if value < 0. {
        return None;
    }
    let sections = split_sections(code);
    let (syms, color) = decode_section(sections.first().copied().unwrap_or_default());
    let tokens = tokenize_date(&syms);

    let twelve_hours = tokens
        .iter()
        .any(|t| matches!(t, DateToken::AmPm | DateToken::AP));
    let sub_digits = tokens
        .iter()
        .filter_map(|t| match t {
            DateToken::SubSecond(n) => Some(*n),
            _ => None,
        })
        .max()
        .unwrap_or(0)
        .min(3);
    let precision = 10i64.pow(sub_digits as u32);
    let units_per_day = 86400 * precision;
    let total = (value * units_per_day as f64).round() as i64;
    let days = total / units_per_day;
    let in_day = total % units_per_day;
    let secs = in_day / precision;
    let sub = in_day % precision;
    let total_secs = total / precision;
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days as u64))?;

    let hour = secs / 3600;
    let mut text = String::new();
    for token in &tokens {
        let field = match token {
            DateToken::Literal(s) => s.clone(),
            DateToken::Year4 => format!("{:04}", date.year()),
            DateToken::Year2 => format!("{:02}", date.year().rem_euclid(100)),
            DateToken::Month(1) | DateToken::M(1) => date.month().to_string(),
            DateToken::Month(2) | DateToken::M(2) => format!("{:02}", date.month()),
            DateToken::Month(n) | DateToken::M(n) => {
                let name = MONTHS[date.month0() as usize];
                match n {
                    3 => name[..3].to_string(),
                    4 => name.to_string(),
                    _ => name[..1].to_string(),
                }
            }
            DateToken::Day(1) => date.day().to_string(),
            DateToken::Day(2) => format!("{:02}", date.day()),
            DateToken::Day(n) => {
                let name = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
                if *n == 3 {
                    name[..3].to_string()
                } else {
                    name.to_string()
                }
            }
            DateToken::Hour(pad) => {
                let h = if twelve_hours {
                    (hour + 11) % 12 + 1
                } else {
                    hour
                };
                pad_field(h, *pad)
            }
            DateToken::Minute(pad) => pad_field(secs / 60 % 60, *pad),
            DateToken::Second(pad) => pad_field(secs % 60, *pad),
            DateToken::SubSecond(n) => {
                let n = (*n).min(sub_digits);
                let digits = format!("{sub:0>width$}", width = sub_digits);
                format!(".{}", &digits[..n])
            }
            DateToken::AmPm => (if hour < 12 { "AM" } else { "PM" }).to_string(),
            DateToken::AP => (if hour < 12 { "A" } else { "P" }).to_string(),
            DateToken::ElapsedHours => (total_secs / 3600).to_string(),
            DateToken::ElapsedMinutes => (total_secs / 60).to_string(),
            DateToken::ElapsedSeconds => total_secs.to_string(),
        };
        text.push_str(&field);
    }
    Some(FormattedNumber {
        text,
        color,
        accounting: None,
    })
}

fn pad_field(v: i64, pad: bool) -> String {
    if pad {
        format!("{v:02}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.00", 3.14159, "3.14")]
    #[case("\"£\"#,##0.00", -1234.5, "-£1,234.50")]
    #[case("ZZZ", 1.5, "36:00:00")]
    #[case("ZZZ", 0.25 + 61. / 86400., "6:01:01")]
    #[case("0", 2.5, "3")]
    #[case("#,##0", 1234567.8, "1,234,568")]
    #[case("#,##0.00", 0.5, "0.50")]
    #[case("0%", 0.256, "26%")]
    #[case("0.00%", 0.256, "25.60%")]
    #[case("0.00E+00", 12345., "1.23E+04")]
    #[case("0.00E+00", 0.00012, "1.20E-04")]
    #[case("#,##0.0,,\"M\"", 1234567., "1.2M")]
    #[case("0.0#", 2., "2.0")]
    #[case("0.0#", 2.125, "2.13")]
    #[case("000", 7., "007")]
    #[case("#,##0.00;[Red]\\-#,##0.00", -5., "-5.00")]
    #[case("#,##0.00;(#,##0.00)", -5., "(5.00)")]
    #[case("0.00;-0.00;\"zero\"", 0., "zero")]
    #[case("#,##0.00\\ [$€-407]", 1234.5, "1,234.50 €")]
    #[case("[$$-409]#,##0.00", 12., "$12.00")]
    #[case("[Blue]General", 0.5, "0.5")]
    #[case("General", 1. / 3., "0.333333333")]
    #[case("@", 42., "42")]
    fn test_format_number(#[case] code: &str, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(code, value).to_string(), expected);
    }

    #[rstest]
    #[case(14, 45000., "15/03/2023")]
    #[case(15, 45000., "15-Mar-23")]
    #[case(17, 45000., "Mar-23")]
    #[case(18, 0.75, "6:00 PM")]
    #[case(19, 0.25, "6:00:00 AM")]
    #[case(20, 0.5 + 90. / 86400., "12:01")]
    #[case(21, 0.5 + 1. / 86400., "12:00:01")]
    #[case(22, 45000.5, "15/03/2023 12:00")]
    #[case(45, 125. / 86400., "02:05")]
    #[case(47, 1. / 86400., "00:01.0")]
    fn test_builtin_dates(#[case] id: u32, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(
            format_number(builtin_format_code(id), value).to_string(),
            expected
        );
    }

    #[rstest]
    #[case("dddd, mmmm d, yyyy", 45000., "Wednesday, March 15, 2023")]
    #[case("ddd d mmmmm yy", 45000., "Wed 15 M 23")]
    #[case("[$-409]mmmm\\ d\\,\\ yyyy;@", 45000., "March 15, 2023")]
    #[case("[h]:mm:ss", 1.5, "36:00:00")]
    #[case("[mm]:ss", 0.5 / 24., "30:00")]
    #[case("h:mm A/P", 0.25, "6:00 A")]
    #[case("yyyy-mm-dd hh:mm:ss", 0.0, "1899-12-30 00:00:00")]
    fn test_custom_dates(#[case] code: &str, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(code, value).to_string(), expected);
    }

    #[rstest]
    #[case("#\\ ?/?", 1.25, "1 1/4")]
    #[case("#\\ ?/?", 0.5, "1/2")]
    #[case("#\\ ?/?", 3.0, "3")]
    #[case("# ?/8", 0.3, "2/8")]
    #[case("# ?/4", 2.99, "3")]
    #[case("#\\ ??/??", 0.75, "3/4")]
    #[case("?/?", 1.5, "3/2")]
    #[case("#\\ ?/?", -1.5, "-1 1/2")]
    #[case("# ??/100", 0.37, "37/100")]
    fn test_fractions(#[case] code: &str, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(code, value).to_string(), expected);
    }

    #[rstest]
    #[case("?/8", 1e19)]
    #[case("?/?", 1e300)]
    #[case("# ?/8", -1e300)]
    #[case("?/1000", 3e16)]
    fn test_huge_fractions_fall_back_to_general(#[case] code: &str, #[case] value: f64) {
        assert_eq!(format_number(code, value).to_string(), format_general(value));
    }

    #[test]
    fn test_best_rational() {
        assert_eq!(best_rational(0.5, 10), (1, 2));
        assert_eq!(best_rational(1. / 3., 10), (1, 3));
        assert_eq!(best_rational(0.0, 10), (0, 1));
        assert_eq!(best_rational(0.142857, 100), (1, 7));
    }

    #[test]
    fn test_red_negative() {
        let f = format_number(builtin_format_code(8), -2.);
        assert_eq!(f.text, "-£2.00");
        assert_eq!(f.color, Some(Rgb::new(255, 0, 0)));
        assert_eq!(format_number(builtin_format_code(8), 2.).color, None);
    }

    #[test]
    fn test_accounting() {
        let code = builtin_format_code(44);
        let f = format_number(code, 1234.5);
        assert_eq!(
            f.accounting,
            Some(Accounting {
                lead: "£".to_string(),
                amount: "1,234.50".to_string()
            })
        );
        let zero = format_number(code, 0.);
        assert_eq!(zero.accounting.map(|a| a.amount), Some("-".to_string()));
        let neg = format_number(code, -3.);
        assert_eq!(neg.accounting.map(|a| a.lead), Some("-£".to_string()));
        let single = format_number("\"$\"* #,##0", 0.);
        assert_eq!(single.accounting.map(|a| a.amount), Some("-".to_string()));
    }

    #[rstest]
    #[case(0.1 + 0.2, "0.3")]
    #[case(123456.789012, "123456.789")]
    #[case(-12.5, "-12.5")]
    #[case(1234567890.6, "1234567891")]
    #[case(42.0, "42")]
    fn test_general(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_general(value), expected);
    }

    #[test]
    fn test_detect() {
        use NumberFormatKind::*;
        assert_eq!(detect_number_format("DD/MM/YY"), DateTime);
        assert_eq!(detect_number_format("H:MM:SS;@"), DateTime);
        assert_eq!(detect_number_format("#,##0\\ [$\\u20bd-46D]"), Number);
        assert_eq!(detect_number_format("m\"M\"d\"D\";@"), DateTime);
        assert_eq!(detect_number_format("[h]:mm:ss"), TimeDelta);
        assert_eq!(
            detect_number_format("\"Y: \"0.00\"m\";\"Y: \"-0.00\"m\";\"Y: <num>m\";@"),
            Number
        );
        assert_eq!(detect_number_format("\"$\"#,##0_);[Red](\"$\"#,##0)"), Number);
        assert_eq!(detect_number_format("[$-404]e\"\\xfc\"m\"\\xfc\"d\"\\xfc\""), DateTime);
        assert_eq!(detect_number_format("0_ ;[Red]\\-0\\ "), Number);
        assert_eq!(detect_number_format("\\Y000000"), Number);
        assert_eq!(detect_number_format("#,##0.0####\" YMD\""), Number);
        assert_eq!(detect_number_format("[Blue]\\+[h]:mm;[Red]\\-[h]:mm"), TimeDelta);
        assert_eq!(detect_number_format("h:mm:ss AM/PM"), DateTime);
        assert_eq!(detect_number_format("[>=100][Magenta]General"), Number);
        assert_eq!(detect_number_format("#\\ ??/??"), Fraction);
        assert_eq!(detect_number_format("ZZZ"), Duration);
        assert_eq!(detect_number_format("General"), General);
        assert_eq!(detect_number_format("@"), General);
    }

    #[test]
    fn test_split_sections() {
        assert_eq!(
            split_sections("0;\"a;b\";[<0;]0"),
            vec!["0", "\"a;b\"", "[<0;]0"]
        );
        assert_eq!(split_sections("0\\;0"), vec!["0\\;0"]);
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_number("0.00", f64::NAN).text, "NaN");
    }
}
