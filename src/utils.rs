// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Internal module providing handy function

use std::borrow::Cow;

use quick_xml::events::BytesRef;

use crate::xlsx::XlsxError;

macro_rules! from_err {
    ($from:ty, $to:tt, $var:tt) => {
        impl From<$from> for $to {
            fn from(e: $from) -> $to {
                $to::$var(e)
            }
        }
    };
}

/// Pushes the text of a general entity reference (`&amp;`, `&#38;`) into `buffer`.
///
/// Unknown named entities are kept verbatim.
pub(crate) fn unescape_entity_to_buffer(
    entity: &BytesRef<'_>,
    buffer: &mut String,
) -> Result<(), XlsxError> {
    if let Some(ch) = entity.resolve_char_ref()? {
        buffer.push(ch);
        return Ok(());
    }
    let name = entity.decode()?;
    match quick_xml::escape::resolve_predefined_entity(&name) {
        Some(s) => buffer.push_str(s),
        None => {
            buffer.push('&');
            buffer.push_str(&name);
            buffer.push(';');
        }
    }
    Ok(())
}

/// Escapes text for inclusion in html content or a single quoted attribute
pub(crate) fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Formats `v` with at most `decimals` decimals, dropping trailing zeros.
///
/// `0.846153` with 2 decimals gives `"0.85"`, `50.0` gives `"50"`.
pub(crate) fn trim_decimal(v: f64, decimals: usize) -> String {
    let mut s = format!("{v:.decimals$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
