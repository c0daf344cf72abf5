#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_derive::Serialize;

use crate::error::Result;
use crate::lexer::{self, MetricDescriptor, MetricToken};

pub use crate::lexer::{MetricType, Sample};

// Sample name suffixes that fold a sample into a composite MetricFamily, along with the family
// types that own them.  A summary's quantiles use the bare family name and need no entry here.
//
// Summary: '_sum', '_count', '' (empty)
// Histogram: '_sum', '_count', '_bucket'
const COMPOSITE_SUFFIXES: &[(&str, &[MetricType])] = &[
    ("_sum", &[MetricType::Summary, MetricType::Histogram]),
    ("_count", &[MetricType::Summary, MetricType::Histogram]),
    ("_bucket", &[MetricType::Histogram]),
];

#[cfg(feature = "hash_fnv")]
type FamilyIndex<'a> = IndexMap<&'a str, MetricFamily<'a>, fnv::FnvBuildHasher>;

#[cfg(not(feature = "hash_fnv"))]
type FamilyIndex<'a> = IndexMap<&'a str, MetricFamily<'a>>;

#[derive(Default)]
struct Builder<'a> {
    families: FamilyIndex<'a>,
}

/// A MetricFamily is a collection of related (and similarly named) metrics
#[derive(Debug, PartialEq, Serialize)]
pub struct MetricFamily<'a> {
    pub name: &'a str,
    pub metric_type: MetricType,
    pub help: Option<Cow<'a, str>>,
    pub samples: Vec<Sample<'a>>,
}

impl<'a> MetricFamily<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            metric_type: MetricType::Untyped,
            help: None,
            samples: vec![],
        }
    }
}

impl<'a> Builder<'a> {
    fn new() -> Self {
        Self::default()
    }

    fn family(&mut self, name: &'a str) -> &mut MetricFamily<'a> {
        self.families.entry(name).or_insert_with(|| {
            debug!(name, "new family");
            MetricFamily::new(name)
        })
    }

    fn meta(mut self, meta: MetricDescriptor<'a>) -> Result<Self> {
        match meta {
            MetricDescriptor::Type {
                metric_name,
                metric_type,
            } => self.family(metric_name).metric_type = metric_type,
            MetricDescriptor::Help {
                metric_name,
                help_text,
            } => self.family(metric_name).help = Some(help_text),
        }

        Ok(self)
    }

    /// Works out which family a sample belongs to.  A family declared under the sample's exact
    /// name always wins, so an untyped `foo_sum` never ends up inside a summary called `foo`.
    fn family_name(&self, sample_name: &'a str) -> &'a str {
        if self.families.contains_key(sample_name) {
            return sample_name;
        }

        COMPOSITE_SUFFIXES
            .iter()
            .filter_map(|(suffix, owners)| {
                let base = sample_name.strip_suffix(suffix)?;
                let family = self.families.get(base)?;
                owners.contains(&family.metric_type).then(|| base)
            })
            .next()
            .map(|base| {
                trace!(sample_name, base, "composite sample");
                base
            })
            .unwrap_or(sample_name)
    }

    fn sample(mut self, sample: Sample<'a>) -> Result<Self> {
        let name = self.family_name(sample.name);
        trace!(family = name, %sample);
        self.family(name).samples.push(sample);

        Ok(self)
    }

    fn finalize(self) -> Vec<MetricFamily<'a>> {
        self.families.into_values().collect()
    }
}

/// Groups classified lines into metric families, in the order each family was first seen.
/// Sample lines are parsed here, so any failure carries the line it came from.
#[tracing::instrument(skip_all)]
pub fn parse<'a, I>(tokens: I) -> Result<Vec<MetricFamily<'a>>>
where
    I: IntoIterator<Item = Result<(usize, MetricToken<'a>)>>,
{
    Ok(tokens
        .into_iter()
        .try_fold(Builder::new(), |builder, token| match token? {
            (_, lexer::MetricToken::Descriptor(meta)) => builder.meta(meta),
            (number, lexer::MetricToken::Sample(line)) => {
                builder.sample(Sample::parse(line, number)?)
            }
        })?
        .finalize())
}
