// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Page header and footer mini-markup
//!
//! `&L`, `&C` and `&R` open the left, center and right sections. Inside a
//! section `&"Font,Style"`, `&NN` (size), `&KRRGGBB` or `&KTT±NNN` (theme color
//! and tint percentage), `&B`, `&I`, `&U`, `&E`, `&S`, `&X` and `&Y` change the
//! font of the following text. `&&` is a literal ampersand, `&P`/`&N` the page
//! number and count, `&A` the sheet name and `&F` the file name.

use crate::color::Rgb;
use crate::style::{Font, Script, Underline};
use crate::theme::ThemeColors;
use crate::utils::escape_html;

/// Names substituted for the `&A` and `&F` fields
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderContext<'a> {
    /// Sheet name
    pub sheet_name: &'a str,
    /// Document file name
    pub file_name: &'a str,
}

/// Rendered sections of a header or footer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderFooter {
    /// Left section html
    pub left: Option<String>,
    /// Center section html
    pub center: Option<String>,
    /// Right section html
    pub right: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Slot {
    Left,
    Center,
    Right,
}

/// One section being rendered: finished html plus the pending text run and
/// the font it is written in
struct Section {
    html: String,
    run: String,
    font: Font,
}

impl Section {
    fn new(base: &Font) -> Self {
        Section {
            html: String::new(),
            run: String::new(),
            font: base.clone(),
        }
    }

    fn flush(&mut self) {
        if self.run.is_empty() {
            return;
        }
        self.html.push_str("<span style='");
        self.html.push_str(&self.font.css());
        self.html.push_str("'>");
        let escaped = escape_html(&self.run).replace('\n', "<br />");
        self.html.push_str(&escaped);
        self.html.push_str("</span>");
        self.run.clear();
    }

    /// Applies a formatting change, closing the pending run first
    fn restyle<F: FnOnce(&mut Font)>(&mut self, change: F) {
        self.flush();
        change(&mut self.font);
    }

    fn finish(mut self) -> Option<String> {
        self.flush();
        (!self.html.is_empty()).then_some(self.html)
    }
}

/// `&"Arial,Bold Italic"`: the family (`-` keeps the current one) and style
fn apply_font_directive(font: &mut Font, directive: &str) {
    let (family, style) = directive.split_once(',').unwrap_or((directive, ""));
    if !family.is_empty() && family != "-" {
        font.name = Some(family.to_string());
    }
    let style = style.to_ascii_lowercase();
    font.bold = Some(style.contains("bold"));
    font.italic = Some(style.contains("italic"));
}

/// `&K` argument: `RRGGBB`, or `TT±NNN` for a theme color with a tint
fn parse_color(arg: &str, theme: &ThemeColors) -> Option<Rgb> {
    let bytes = arg.as_bytes();
    if bytes.len() == 6 && matches!(bytes[2], b'+' | b'-') {
        let index = arg.get(..2)?.parse::<u32>().ok()?;
        let percent = arg.get(3..)?.parse::<f64>().ok()?;
        let tint = if bytes[2] == b'-' { -percent } else { percent } / 100.;
        theme.by_index(index).map(|c| c.tint(tint))
    } else {
        Rgb::from_hex(arg)
    }
}

impl HeaderFooter {
    /// Renders the mini-markup of a header or footer with `base` as the
    /// starting font of every section
    pub fn parse(
        markup: &str,
        base: &Font,
        theme: &ThemeColors,
        context: &HeaderContext<'_>,
    ) -> HeaderFooter {
        let base = Font {
            name: base.name.clone(),
            size: base.size,
            ..Font::default()
        };
        let mut sections = [Section::new(&base), Section::new(&base), Section::new(&base)];
        let mut slot = Slot::Center;
        let mut chars = markup.chars().peekable();
        while let Some(c) = chars.next() {
            let section = &mut sections[slot as usize];
            if c != '&' {
                section.run.push(c);
                continue;
            }
            let Some(code) = chars.next() else {
                break;
            };
            match code {
                'L' => slot = Slot::Left,
                'C' => slot = Slot::Center,
                'R' => slot = Slot::Right,
                '&' => section.run.push('&'),
                '"' => {
                    let mut directive = String::new();
                    for c in chars.by_ref() {
                        if c == '"' {
                            break;
                        }
                        directive.push(c);
                    }
                    section.restyle(|f| apply_font_directive(f, &directive));
                }
                '0'..='9' => {
                    let mut size = String::from(code);
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        size.push(d);
                    }
                    if let Ok(pt) = size.parse::<f64>() {
                        section.restyle(|f| f.size = Some(pt));
                    }
                }
                'K' => {
                    let arg: String = chars.by_ref().take(6).collect();
                    if let Some(color) = parse_color(&arg, theme) {
                        section.restyle(|f| f.color = Some(color));
                    }
                }
                'B' => section.restyle(|f| f.bold = Some(!f.is_bold())),
                'I' => section.restyle(|f| f.italic = Some(!f.is_italic())),
                'S' => section.restyle(|f| f.strike = Some(!f.is_struck())),
                'U' => section.restyle(|f| {
                    f.underline = match f.underline {
                        Some(Underline::Single) => None,
                        _ => Some(Underline::Single),
                    }
                }),
                'E' => section.restyle(|f| {
                    f.underline = match f.underline {
                        Some(Underline::Double) => None,
                        _ => Some(Underline::Double),
                    }
                }),
                'X' => section.restyle(|f| {
                    f.script = match f.script {
                        Some(Script::Superscript) => None,
                        _ => Some(Script::Superscript),
                    }
                }),
                'Y' => section.restyle(|f| {
                    f.script = match f.script {
                        Some(Script::Subscript) => None,
                        _ => Some(Script::Subscript),
                    }
                }),
                'P' | 'N' => section.run.push('1'),
                'A' => section.run.push_str(context.sheet_name),
                'F' => section.run.push_str(context.file_name),
                // date, time, path and picture fields
                _ => (),
            }
        }
        let [left, center, right] = sections;
        HeaderFooter {
            left: left.finish(),
            center: center.finish(),
            right: right.finish(),
        }
    }

    /// Checks whether every section is empty
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.center.is_none() && self.right.is_none()
    }

    /// Html table laying out the sections, `None` when all are empty
    pub fn to_html(&self) -> Option<String> {
        let cell = |width: &str, align: &str, html: &Option<String>| {
            format!(
                "<td{width} style='text-align:{align}; '>{}</td>",
                html.as_deref().unwrap_or("&nbsp;")
            )
        };
        let row = match (&self.left, &self.center, &self.right) {
            (None, None, None) => return None,
            (Some(_), Some(_), _) | (_, Some(_), Some(_)) => {
                let w = " width='33%'";
                cell(w, "left", &self.left)
                    + &cell(w, "center", &self.center)
                    + &cell(w, "right", &self.right)
            }
            (Some(_), None, Some(_)) => {
                let w = " width='50%'";
                cell(w, "left", &self.left) + &cell(w, "right", &self.right)
            }
            (Some(_), None, None) => cell("", "left", &self.left),
            (None, Some(_), None) => cell("", "center", &self.center),
            (None, None, Some(_)) => cell("", "right", &self.right),
        };
        Some(format!("<table width='100%'><tr>{row}</tr></table>"))
    }
}
