//! Lexer for value tokens using logos
//!
//! A value token is the right-hand side of a configuration item: a bare
//! word, a quoted string in one of three quoting styles, or a regular
//! expression between slashes.

use logos::Logos;

use crate::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    #[regex(r"'([^'\\]|\\.)*'", |lex| inner(lex.slice(), 1))]
    SingleQuoted(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| inner(lex.slice(), 1))]
    DoubleQuoted(String),

    #[regex(r"`([^`\\]|\\.)*`", |lex| inner(lex.slice(), 1))]
    BackQuoted(String),

    /// Pattern and case-insensitivity flag
    #[regex(r"/([^/\\]|\\.)*/i?", regex_body)]
    Regex((String, bool)),

    #[regex(r#"[^ \t\n\r'"`/][^ \t\n\r'"`]*"#, |lex| lex.slice().to_string())]
    BareWord(String),
}

/// Text between the delimiters, escapes still in place
fn inner(slice: &str, trailing: usize) -> String {
    slice[1..slice.len() - trailing].to_string()
}

fn regex_body(lex: &mut logos::Lexer<Token>) -> (String, bool) {
    let slice = lex.slice();
    match slice.strip_suffix('i') {
        Some(body) => (inner(body, 1), true),
        None => (inner(slice, 1), false),
    }
}

/// How a value token was quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Bare,
    Single,
    Double,
    Back,
    Regex { case_insensitive: bool },
}

impl Quote {
    /// Delimiter character, if the token had one
    pub fn delimiter(self) -> Option<char> {
        match self {
            Quote::Bare => None,
            Quote::Single => Some('\''),
            Quote::Double => Some('"'),
            Quote::Back => Some('`'),
            Quote::Regex { .. } => Some('/'),
        }
    }
}

/// A single lexed value with its contents still escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueToken {
    pub quote: Quote,
    pub text: String,
    pub span: Span,
}

impl ValueToken {
    /// Contents with escape sequences resolved
    pub fn unescaped(&self) -> String {
        match self.quote {
            Quote::Bare => self.text.clone(),
            quote => unescape(&self.text, quote),
        }
    }
}

/// Tokenize input into a stream of tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}

/// Lex exactly one value token from `input`
///
/// Surrounding whitespace is ignored. Anything after the first token is an
/// error, as is input with no token at all.
pub fn lex_value(input: &str) -> Result<ValueToken, ParseError> {
    let mut tokens = lex(input);

    let (token, span) = match tokens.next() {
        None => {
            return Err(ParseError::EmptyValue {
                offset: input.len(),
            })
        }
        Some((Err(()), span)) => return Err(ParseError::InvalidToken { offset: span.start }),
        Some((Ok(token), span)) => (token, span),
    };

    if let Some((_, trailing)) = tokens.next() {
        return Err(ParseError::TrailingValue {
            offset: trailing.start,
        });
    }

    let (quote, text) = match token {
        Token::BareWord(text) => (Quote::Bare, text),
        Token::SingleQuoted(text) => (Quote::Single, text),
        Token::DoubleQuoted(text) => (Quote::Double, text),
        Token::BackQuoted(text) => (Quote::Back, text),
        Token::Regex((text, case_insensitive)) => (Quote::Regex { case_insensitive }, text),
    };
    Ok(ValueToken { quote, text, span })
}

/// Resolve backslash escapes in quoted text
///
/// `\n`, `\r` and `\t` become control characters and an escaped delimiter
/// or backslash becomes itself. Regex bodies keep every escape except an
/// escaped `/`, since the regex engine interprets the rest.
pub fn unescape(text: &str, quote: Quote) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match (quote, next) {
            (Quote::Regex { .. }, '/') => out.push('/'),
            (Quote::Regex { .. }, other) => {
                out.push('\\');
                out.push(other);
            }
            (_, 'n') => out.push('\n'),
            (_, 'r') => out.push('\r'),
            (_, 't') => out.push('\t'),
            (_, other) => out.push(other),
        }
    }
    out
}

/// Whether double-quoted text contains a `%` that is not escaped
pub fn has_unescaped_percent(text: &str) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '%' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}
