// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Shared text table (`xl/sharedStrings.xml`)

use crate::style::Font;
use crate::utils::escape_html;

/// A run of text with an optional inline font
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    /// Text of the run
    pub text: String,
    /// Inline font overriding the cell font
    pub font: Option<Font>,
}

/// A sequence of text runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText {
    runs: Vec<TextRun>,
}

impl RichText {
    /// A single run without inline formatting
    pub fn plain<S: Into<String>>(text: S) -> Self {
        RichText {
            runs: vec![TextRun {
                text: text.into(),
                font: None,
            }],
        }
    }

    /// Builds a rich text from its runs
    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        RichText { runs }
    }

    /// The runs
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Checks whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Html of the text: escaped runs, those with an inline font wrapped in a
    /// styled span
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for run in &self.runs {
            match &run.font {
                Some(font) => {
                    html.push_str("<span style='");
                    html.push_str(&font.css());
                    html.push_str("'>");
                    html.push_str(&escape_html(&run.text));
                    html.push_str("</span>");
                }
                None => html.push_str(&escape_html(&run.text)),
            }
        }
        html
    }
}

/// The shared text table of a workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedStrings {
    strings: Vec<RichText>,
}

impl SharedStrings {
    /// Builds the table from its entries
    pub fn new(strings: Vec<RichText>) -> Self {
        SharedStrings { strings }
    }

    /// Entry by index
    pub fn get(&self, index: usize) -> Option<&RichText> {
        self.strings.get(index)
    }

    /// Plain text of an entry
    pub fn text(&self, index: usize) -> Option<String> {
        self.get(index).map(RichText::text)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Checks whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_text() {
        let text = RichText::from_runs(vec![
            TextRun {
                text: "a < ".to_string(),
                font: None,
            },
            TextRun {
                text: "bold".to_string(),
                font: Some(Font::new().with_bold(true)),
            },
        ]);
        assert_eq!(text.text(), "a < bold");
        assert_eq!(
            text.to_html(),
            "a &lt; <span style=' font-weight: bold;'>bold</span>"
        );
    }

    #[test]
    fn test_lookup() {
        let strings = SharedStrings::new(vec![RichText::plain("x"), RichText::default()]);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.text(0).as_deref(), Some("x"));
        assert!(strings.get(1).unwrap().is_empty());
        assert_eq!(strings.text(2), None);
    }
}
