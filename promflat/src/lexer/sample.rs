#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::{borrow::Cow, collections::HashMap, fmt};

use itertools::Itertools;
use nom::combinator::opt;
use serde_derive::Serialize;

use super::types::*;
use crate::error::{ParseError, ParseErrorKind, Result};

/// A single observation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample<'a> {
    pub name: &'a str,
    pub labels: HashMap<&'a str, Cow<'a, str>>,
    pub number: f64,
    /// Milliseconds
    pub timestamp: Option<i64>,
}

type LabelResult<'a, T> = std::result::Result<(&'a str, T), ParseErrorKind>;

impl<'a> Sample<'a> {
    /// Parses one trimmed sample line.  `line_number` is only used for error context.
    #[tracing::instrument]
    pub fn parse(line: &'a str, line_number: usize) -> Result<Self> {
        Self::nom(line).map_err(|kind| ParseError::new(kind, line_number, line))
    }

    /// ```abnf
    /// sample = metricname [labels] 1*BLANK number [1*BLANK timestamp]
    /// ```
    fn nom(input: &'a str) -> std::result::Result<Self, ParseErrorKind> {
        let (input, name) = identifier(input)?;
        let input = skip_blank(input);

        let (input, labels) = match input.strip_prefix('{') {
            Some(input) => Self::labels(input)?,
            None => (input, vec![]),
        };

        let labels = labels
            .into_iter()
            .try_fold(HashMap::new(), |mut acc, (name, value)| {
                match acc.insert(name, value) {
                    Some(_) => Err(ParseErrorKind::DuplicateLabel(name.to_string())),
                    None => Ok(acc),
                }
            })?;

        let (input, number) = blank_token(skip_blank(input));
        let (_, number) =
            floatlike(number).map_err(|_| ParseErrorKind::InvalidValue(number.to_string()))?;

        let (input, raw_timestamp) = blank_token(skip_blank(input));
        let timestamp = match raw_timestamp {
            "" => None,
            raw => Some(
                timestamp(raw)
                    .map_err(|_| ParseErrorKind::InvalidValue(raw.to_string()))?
                    .1,
            ),
        };

        match blank_token(skip_blank(input)) {
            (_, "") => {}
            (_, trailing) => Err(ParseErrorKind::InvalidValue(trailing.to_string()))?,
        }

        Ok(Self {
            name,
            labels,
            number,
            timestamp,
        })
    }

    /// Everything after the opening brace, up to and including the closing brace
    ///
    /// ```abnf
    /// labels = "{" *BLANK [label *("," *BLANK label) [","]] *BLANK "}"
    /// label = label-name *BLANK "=" *BLANK DQUOTE escaped-string DQUOTE
    /// ```
    fn labels(input: &'a str) -> LabelResult<'a, Vec<(&'a str, Cow<'a, str>)>> {
        let mut labels = vec![];
        let mut input = skip_blank(input);

        loop {
            if let Some(rest) = input.strip_prefix('}') {
                return Ok((rest, labels));
            }

            let (rest, label) = Self::label(input)?;
            debug!(name = label.0, value = %label.1);
            labels.push(label);

            let rest = skip_blank(rest);
            input = match rest.strip_prefix(',') {
                Some(rest) => skip_blank(rest),
                None if rest.starts_with('}') => rest,
                None => Err(unexpected(rest))?,
            };
        }
    }

    fn label(input: &'a str) -> LabelResult<'a, (&'a str, Cow<'a, str>)> {
        if input.is_empty() {
            Err(ParseErrorKind::UnexpectedEndOfInput)?
        }

        let (input, name) = identifier(input)?;
        let input = skip_blank(input);
        let input = input.strip_prefix('=').ok_or_else(|| unexpected(input))?;
        let input = skip_blank(input);
        let (input, value) = Self::quoted(input)?;

        Ok((input, (name, value)))
    }

    /// A double quoted label value.  Running out of line before the closing quote, including
    /// in the middle of an escape sequence, is reported as the end of input.
    fn quoted(input: &'a str) -> LabelResult<'a, Cow<'a, str>> {
        let input = input.strip_prefix('"').ok_or_else(|| unexpected(input))?;
        let (input, value) = opt(escaped_string1)(input)
            .map_err(|_| ParseErrorKind::UnexpectedEndOfInput)?;
        let input = input
            .strip_prefix('"')
            .ok_or(ParseErrorKind::UnexpectedEndOfInput)?;

        Ok((input, unescape_string(value.unwrap_or_default())))
    }
}

impl<'a> fmt::Display for Sample<'a> {
    /// Renders the sample back into exposition form, labels sorted by name
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .sorted_by_key(|(name, _)| *name)
                .map(|(name, value)| format!("{}={:?}", name, value))
                .join(",");
            write!(f, "{{{}}}", labels)?;
        }

        match self.number {
            n if n.is_nan() => write!(f, " NaN")?,
            n if n.is_infinite() && n.is_sign_positive() => write!(f, " +Inf")?,
            n if n.is_infinite() => write!(f, " -Inf")?,
            n => write!(f, " {}", n)?,
        }

        match self.timestamp {
            Some(timestamp) => write!(f, " {}", timestamp),
            None => Ok(()),
        }
    }
}
