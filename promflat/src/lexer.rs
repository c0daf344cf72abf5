#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::{borrow::Cow, iter::Enumerate, str::FromStr};

use nom::{
    bytes::complete::take_till,
    character::complete::space0,
    combinator::all_consuming,
    sequence::{pair, preceded},
    IResult,
};
use serde_derive::Serialize;

use crate::error::{ParseError, ParseErrorKind, Result};

mod sample;
mod types;

pub use sample::Sample;
use types::*;

/// Metadata carried by `# HELP` and `# TYPE` comment lines
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MetricDescriptor<'a> {
    Type {
        metric_name: &'a str,
        metric_type: MetricType,
    },
    Help {
        metric_name: &'a str,
        help_text: Cow<'a, str>,
    },
}

/// A line that survived classification.  Blank lines and plain comments are dropped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MetricToken<'a> {
    Descriptor(MetricDescriptor<'a>),
    /// The trimmed text of a candidate sample line
    Sample(&'a str),
}

/// [`MetricFamily`](crate::parser::MetricFamily) type.  The default is `Untyped`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MetricType {
    /// Counters measure discrete events.
    Counter,
    /// Gauges are current measurements, such as bytes of memory currently used or the number of items in a queue.
    Gauge,
    /// Summaries expose quantiles plus a count and a sum of observations.
    Summary,
    /// Histograms expose cumulative buckets plus a count and a sum of observations.
    Histogram,
    /// No `# TYPE` line, or one we didn't recognize.
    Untyped,
}

/// Lazily classifies an exposition document line by line.  Yields the 1-based line number along
/// with each token.
pub struct Tokens<'a> {
    lines: Enumerate<std::str::Lines<'a>>,
}

impl<'a> MetricDescriptor<'a> {
    /// Everything after the leading `#`.  `Ok(None)` means this is an ordinary comment.
    ///
    /// ```abnf
    /// metric-descriptor = HASH *BLANK "TYPE" 1*BLANK metricname [1*BLANK metric-type]
    /// metric-descriptor =/ HASH *BLANK "HELP" 1*BLANK metricname [1*BLANK escaped-string]
    /// ```
    #[tracing::instrument]
    fn nom(input: &'a str) -> std::result::Result<Option<Self>, ParseErrorKind> {
        let (rest, (keyword, metric_name)) = Self::keyword_and_name(input)
            .map_err(|_| ParseErrorKind::MalformedMetadataLine)?;

        if keyword != "HELP" && keyword != "TYPE" {
            return Ok(None);
        }

        if metric_name.is_empty() {
            Err(ParseErrorKind::MalformedMetadataLine)?
        }

        if all_consuming(identifier1)(metric_name).is_err() {
            Err(ParseErrorKind::InvalidIdentifier(metric_name.to_string()))?
        }

        let rest = skip_blank(rest);

        let descriptor = match keyword {
            "TYPE" => {
                let (_, metric_type) = blank_token(rest);
                Self::Type {
                    metric_name,
                    metric_type: metric_type.parse().unwrap_or(MetricType::Untyped),
                }
            }
            _ => Self::Help {
                metric_name,
                help_text: unescape_string(rest),
            },
        };

        Ok(Some(descriptor))
    }

    fn keyword_and_name(input: &'a str) -> IResult<&str, (&str, &str)> {
        pair(
            preceded(space0, take_till(is_blank)),
            preceded(space0, take_till(is_blank)),
        )(input)
    }
}

impl<'a> MetricToken<'a> {
    /// Classifies a single raw line.  Errors carry the trimmed line.
    fn classify(raw: &'a str, number: usize) -> Result<Option<Self>> {
        let line = raw.trim();

        match line.strip_prefix('#') {
            _ if line.is_empty() => Ok(None),
            Some(comment) => MetricDescriptor::nom(comment)
                .map(|descriptor| descriptor.map(MetricToken::Descriptor))
                .map_err(|kind| ParseError::new(kind, number, line)),
            None => Ok(Some(MetricToken::Sample(line))),
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<(usize, MetricToken<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let number = index + 1;
            match MetricToken::classify(raw, number) {
                Ok(Some(token)) => {
                    trace!(number, ?token);
                    return Some(Ok((number, token)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        None
    }
}

impl FromStr for MetricType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "summary" => Ok(Self::Summary),
            "histogram" => Ok(Self::Histogram),
            "untyped" => Ok(Self::Untyped),
            _ => Err(()),
        }
    }
}

/// Splits an exposition document into classified lines
pub fn exposition(input: &str) -> Tokens<'_> {
    Tokens {
        lines: input.lines().enumerate(),
    }
}
