#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::borrow::Cow;

use lazy_static::lazy_static;
use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while},
    character::complete::{one_of, satisfy},
    combinator::{all_consuming, map_res, peek, value},
    number::complete::recognize_float,
    IResult,
};
use regex::{Captures, Regex};

use crate::error::ParseErrorKind;

lazy_static! {
    // Pattern used to check for escape characters
    static ref UNESCAPE_RE: Regex = Regex::new(r#"(\\[n"\\])"#).expect("valid escape pattern");
}

/// ```abnf
/// ; Any unicode character, except double quote and backslash.  Newlines never reach us, the
/// ; exposition is split into lines before any of this runs.
/// normal-char = %x00-21 / %x23-5B / %x5D-10FFFF
/// ```
fn is_normal_char(c: char) -> bool {
    c != '"' && c != '\\'
}

/// Separators between the tokens of a sample line
pub(super) fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Characters that terminate an identifier
fn is_delimiter(c: char) -> bool {
    is_blank(c) || matches!(c, '{' | '}' | ',' | '=' | '"')
}

/// Recognize single "normal_char"
pub(super) fn normal_char(input: &str) -> IResult<&str, char> {
    satisfy(is_normal_char)(input)
}

/// Recognize a sequence of one or more "normal char"
pub(super) fn normal_char1(input: &str) -> IResult<&str, &str> {
    nom::InputTakeAtPosition::split_at_position1_complete(
        &input,
        |item| !is_normal_char(item),
        nom::error::ErrorKind::AlphaNumeric,
    )
}

/// ```abnf
/// escaped-string = *escaped-char
///
/// escaped-char = normal-char
/// escaped-char =/ BS ("n" / DQUOTE / BS)
/// escaped-char =/ BS normal-char
/// ```
pub(super) fn escaped_string1(input: &str) -> IResult<&str, &str> {
    escaped(normal_char1, '\\', alt((one_of(r#""\"#), normal_char)))(input)
}

/// ```abnf
/// identifier = identifier-initial-char 0*identifier-char
///
/// identifier-char = identifier-initial-char / DIGIT
/// identifier-initial-char = ALPHA / "_" / ":"
/// ```
///
/// Metric names and label names share the same grammar.
pub(super) fn identifier1(input: &str) -> IResult<&str, &str> {
    peek(satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == ':'))(input)?;

    take_while(|item: char| item.is_ascii_alphanumeric() || item == '_' || item == ':')(input)
}

/// Splits off the next identifier.  Anything up to the next delimiter that isn't a valid
/// identifier is reported in full.
pub(super) fn identifier(input: &str) -> Result<(&str, &str), ParseErrorKind> {
    let (rest, token) = split_token(input, is_delimiter);

    match all_consuming(identifier1)(token) {
        Ok(_) => Ok((rest, token)),
        Err(_) => Err(ParseErrorKind::InvalidIdentifier(offending(input))),
    }
}

/// Splits off everything up to the next blank
pub(super) fn blank_token(input: &str) -> (&str, &str) {
    split_token(input, is_blank)
}

pub(super) fn skip_blank(input: &str) -> &str {
    input.trim_start_matches(is_blank)
}

fn split_token(input: &str, is_end: fn(char) -> bool) -> (&str, &str) {
    let end = input.find(is_end).unwrap_or(input.len());
    (&input[end..], &input[..end])
}

/// The token found where something else was expected, used for error context
pub(super) fn offending(input: &str) -> String {
    match split_token(input, is_delimiter) {
        (_, "") => input.chars().next().map(String::from).unwrap_or_default(),
        (_, token) => token.to_string(),
    }
}

/// Reports a token that doesn't belong, or the end of the line if there's nothing left
pub(super) fn unexpected(input: &str) -> ParseErrorKind {
    match input.is_empty() {
        true => ParseErrorKind::UnexpectedEndOfInput,
        false => ParseErrorKind::InvalidIdentifier(offending(input)),
    }
}

/// Sample values.  The special values are case sensitive, everything else must be plain
/// decimal or exponential notation.
pub(super) fn floatlike(input: &str) -> IResult<&str, f64> {
    all_consuming(alt((
        value(f64::NAN, tag("NaN")),
        value(f64::NEG_INFINITY, tag("-Inf")),
        value(f64::INFINITY, tag("+Inf")),
        map_res(recognize_float, |s: &str| s.parse::<f64>()),
    )))(input)
}

/// Millisecond timestamps
pub(super) fn timestamp(input: &str) -> IResult<&str, i64> {
    all_consuming(nom::character::complete::i64)(input)
}

pub(crate) fn unescape_string(input: &str) -> Cow<'_, str> {
    UNESCAPE_RE.replace_all(input, |caps: &Captures| match &caps[0] {
        r"\n" => "\n".to_string(),
        r#"\""# => r#"""#.to_string(),
        r#"\\"# => r#"\"#.to_string(),
        c => c.to_string(),
    })
}
