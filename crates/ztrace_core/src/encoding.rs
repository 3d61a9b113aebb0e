//! Field-level encoding for metadata lines.
//!
//! Records are space-separated fields. Numbers are written in decimal, pointers in
//! `0x`-prefixed hex. When reading, integers accept an optional sign and an optional
//! `0x` prefix, so hand-edited traces and older captures both parse.

use crate::error::{FormatError, FormatResult};
use std::str::SplitAsciiWhitespace;

/// Parse a signed integer in decimal or `0x` hex
#[must_use]
pub fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_unsigned(digits)?;
    let magnitude = i64::try_from(magnitude).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse an unsigned integer in decimal or `0x` hex
#[must_use]
pub fn parse_unsigned(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parse a pointer value; the `0x` prefix is optional
#[must_use]
pub fn parse_pointer(text: &str) -> Option<usize> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    usize::from_str_radix(hex, 16).ok()
}

/// Sequential reader over the fields of one line
pub struct Fields<'a> {
    line: &'a str,
    iter: SplitAsciiWhitespace<'a>,
}

impl<'a> Fields<'a> {
    /// Split a line into fields
    #[must_use]
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            iter: line.split_ascii_whitespace(),
        }
    }

    /// The line being read
    #[must_use]
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Next raw field
    ///
    /// # Errors
    ///
    /// Returns error if the line has no more fields
    pub fn text(&mut self, field: &'static str) -> FormatResult<&'a str> {
        self.iter.next().ok_or_else(|| FormatError::MissingField {
            field,
            line: self.line.to_string(),
        })
    }

    /// Next field as a C `int`
    ///
    /// # Errors
    ///
    /// Returns error if the field is absent or out of range
    pub fn int(&mut self, field: &'static str) -> FormatResult<i32> {
        let text = self.text(field)?;
        parse_int(text)
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| invalid(field, text))
    }

    /// Next field as a C `unsigned int`
    ///
    /// # Errors
    ///
    /// Returns error if the field is absent or out of range
    pub fn uint(&mut self, field: &'static str) -> FormatResult<u32> {
        let text = self.text(field)?;
        parse_unsigned(text)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| invalid(field, text))
    }

    /// Next field as a file offset
    ///
    /// # Errors
    ///
    /// Returns error if the field is absent or not a number
    pub fn offset(&mut self, field: &'static str) -> FormatResult<u64> {
        let text = self.text(field)?;
        parse_unsigned(text).ok_or_else(|| invalid(field, text))
    }

    /// Next field as a pointer
    ///
    /// # Errors
    ///
    /// Returns error if the field is absent or not hex
    pub fn pointer(&mut self, field: &'static str) -> FormatResult<usize> {
        let text = self.text(field)?;
        parse_pointer(text).ok_or_else(|| invalid(field, text))
    }

    /// Require that every field was consumed
    ///
    /// # Errors
    ///
    /// Returns error if fields remain
    pub fn finish(mut self) -> FormatResult<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(_) => Err(FormatError::TrailingData {
                line: self.line.to_string(),
            }),
        }
    }
}

fn invalid(field: &'static str, value: &str) -> FormatError {
    FormatError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}
