#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use serde::Serializer;
use serde_derive::Serialize;

use crate::parser::{MetricFamily, MetricType, Sample};

/// One scalar per observation, named after the family it came from
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedMetric {
    pub name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number"
    )]
    pub value: Option<f64>,
}

impl MetricType {
    /// The value a sample contributes to the flattened output, if any.  Summaries and histograms
    /// are represented by their `_sum` sample alone.
    fn representative(self, family_name: &str, sample: &Sample) -> Option<f64> {
        match self {
            Self::Counter | Self::Gauge | Self::Untyped => Some(sample.number),
            Self::Summary | Self::Histogram => match sample.name.strip_prefix(family_name) {
                Some("_sum") => Some(sample.number),
                _ => None,
            },
        }
    }
}

/// Flattens families into records, keeping family order and sample order within each family
#[tracing::instrument(skip_all)]
pub fn normalize<'a, I>(families: I) -> Vec<NormalizedMetric>
where
    I: IntoIterator<Item = MetricFamily<'a>>,
{
    families
        .into_iter()
        .flat_map(|family| {
            let MetricFamily {
                name,
                metric_type,
                samples,
                ..
            } = family;

            samples.into_iter().filter_map(move |sample| {
                let value = metric_type.representative(name, &sample)?;
                trace!(name, value);
                Some(NormalizedMetric {
                    name: name.to_string(),
                    value: Some(value),
                })
            })
        })
        .collect()
}

/// JSON has no NaN or infinities, so those go out as their exposition tokens.  Whole numbers are
/// written without a fractional part.
fn serialize_number<S>(number: &Option<f64>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *number {
        None => s.serialize_none(),
        Some(n) if n.is_nan() => s.serialize_str("NaN"),
        Some(n) if n.is_infinite() && n.is_sign_positive() => s.serialize_str("+Inf"),
        Some(n) if n.is_infinite() => s.serialize_str("-Inf"),
        Some(n) if n.fract() == 0. && n.abs() < 9_007_199_254_740_992. => {
            s.serialize_i64(n as i64)
        }
        Some(n) => s.serialize_f64(n),
    }
}
