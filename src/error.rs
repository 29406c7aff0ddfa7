//! Grammar errors and their diagnostics

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// A reference or value token that could not be parsed
///
/// Every variant carries the byte offset at which parsing stopped, so the
/// caller can point at the offending qualifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected an attribute reference")]
    ExpectedAttribute { offset: usize },

    #[error("invalid list qualifier")]
    InvalidList { offset: usize },

    #[error("attribute '{name}' cannot have a tag")]
    TagNotAllowed { name: String, offset: usize },

    #[error("tag value is not an integer")]
    TagNotInteger { offset: usize },

    #[error("invalid tag value '{value}' (should be between 0-31)")]
    InvalidTag { value: String, offset: usize },

    #[error("array index is not an integer")]
    IndexNotInteger { offset: usize },

    #[error("invalid array reference '{value}' (should be between 0-1000)")]
    InvalidIndex { value: String, offset: usize },

    #[error("no closing ']' for array index")]
    UnclosedIndex { offset: usize },

    #[error("attribute name is too long")]
    NameTooLong { offset: usize },

    #[error("unexpected text after attribute name")]
    TrailingText { offset: usize },

    #[error("unterminated or malformed value")]
    InvalidToken { offset: usize },

    #[error("expected a value")]
    EmptyValue { offset: usize },

    #[error("unexpected text after value")]
    TrailingValue { offset: usize },
}

impl ParseError {
    /// Byte offset at which parsing stopped
    pub fn offset(&self) -> usize {
        match self {
            ParseError::ExpectedAttribute { offset }
            | ParseError::InvalidList { offset }
            | ParseError::TagNotAllowed { offset, .. }
            | ParseError::TagNotInteger { offset }
            | ParseError::InvalidTag { offset, .. }
            | ParseError::IndexNotInteger { offset }
            | ParseError::InvalidIndex { offset, .. }
            | ParseError::UnclosedIndex { offset }
            | ParseError::NameTooLong { offset }
            | ParseError::TrailingText { offset }
            | ParseError::InvalidToken { offset }
            | ParseError::EmptyValue { offset }
            | ParseError::TrailingValue { offset } => *offset,
        }
    }

    /// The offset as a negative count, the form callers use to report how
    /// far parsing got
    pub fn slen(&self) -> isize {
        -(self.offset() as isize)
    }

    /// Shift the offset by `base`, for errors raised while parsing a suffix
    pub(crate) fn shifted(mut self, base: usize) -> Self {
        match &mut self {
            ParseError::ExpectedAttribute { offset }
            | ParseError::InvalidList { offset }
            | ParseError::TagNotAllowed { offset, .. }
            | ParseError::TagNotInteger { offset }
            | ParseError::InvalidTag { offset, .. }
            | ParseError::IndexNotInteger { offset }
            | ParseError::InvalidIndex { offset, .. }
            | ParseError::UnclosedIndex { offset }
            | ParseError::NameTooLong { offset }
            | ParseError::TrailingText { offset }
            | ParseError::InvalidToken { offset }
            | ParseError::EmptyValue { offset }
            | ParseError::TrailingValue { offset } => *offset += base,
        }
        self
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        // Past the end, point at the last character instead
        let mut offset = self.offset().min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        if offset == source.len() {
            offset = source.char_indices().last().map_or(0, |(i, _)| i);
        }
        let end = source[offset..]
            .chars()
            .next()
            .map_or(offset, |c| offset + c.len_utf8());

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, offset)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, offset..end))
                    .with_message(self.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        if written.is_err() {
            return format!("{}:{}: {}", filename, offset, self);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
