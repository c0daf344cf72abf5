//! `promflat` parses the Prometheus text exposition format and flattens it into one
//! `{name, value}` record per observation.
//!
//! Counters, gauges, and untyped samples keep their own value.  Summaries and histograms are
//! reduced to their `_sum` sample.

#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::io::Read;

/// Error types
pub mod error;

/// Classifies lines and parses sample lines
pub mod lexer;

/// Groups samples into metric families
pub mod parser;

/// Flattens metric families into [`NormalizedMetric`] records
pub mod normalize;

#[cfg(test)]
mod test;

pub use error::{Error, ParseError, ParseErrorKind};
pub use normalize::NormalizedMetric;
pub use parser::{MetricFamily, MetricType, Sample};

/// Reads an exposition document from `reader` and flattens it into [`NormalizedMetric`] records.
pub fn parse<R: Read>(mut reader: R) -> Result<Vec<NormalizedMetric>, Error> {
    let mut data = String::new();
    reader.read_to_string(&mut data)?;
    debug!(bytes = data.len(), "read exposition");

    Ok(parse_str(&data)?)
}

/// Flattens an in-memory exposition document into [`NormalizedMetric`] records.
pub fn parse_str(data: &str) -> Result<Vec<NormalizedMetric>, ParseError> {
    Ok(normalize::normalize(parse_families(data)?))
}

/// Parses an exposition document into its [`MetricFamily`] entries, in the order each family was
/// first seen.
pub fn parse_families(data: &str) -> Result<Vec<MetricFamily<'_>>, ParseError> {
    parser::parse(lexer::exposition(data))
}
