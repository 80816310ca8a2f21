//! The shared, read-only root collection of records.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::record::{Attribute, Record};

/// A filtered or unfiltered set of records as passed between views.
pub type RecordSet = Arc<[Record]>;

/// Observed extent of one attribute, sentinel values excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDomain {
    /// Smallest known value.
    pub min: f64,
    /// Largest known value. This is the "global maximum" of the attribute.
    pub max: f64,
}

/// Per-attribute domains of the root dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDomains {
    domains: [Option<AttributeDomain>; Attribute::COUNT],
}

impl AttributeDomains {
    /// Computes the domains of `records`.
    ///
    /// Fertility rate is anchored at zero, matching its slider and axis.
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let mut domains = [None; Attribute::COUNT];
        for attr in Attribute::ALL {
            let mut known = records.iter().filter_map(|r| r.known(attr));
            let Some(first) = known.next() else {
                continue;
            };
            let (min, max) = known.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            let min = if attr == Attribute::FertilityRate { min.min(0.0) } else { min };
            domains[attr.index()] = Some(AttributeDomain { min, max });
        }
        Self { domains }
    }

    /// Domain of `attribute`, or `None` if every value is missing.
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<AttributeDomain> {
        self.domains[attribute.index()]
    }

    /// Global maximum of `attribute`.
    #[must_use]
    pub fn max(&self, attribute: Attribute) -> Option<f64> {
        self.get(attribute).map(|d| d.max)
    }
}

/// The loaded dataset, shared read-only by every view.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: RecordSet,
    years: (i32, i32),
    regions: Vec<Arc<str>>,
    domains: AttributeDomains,
}

impl Dataset {
    /// Wraps loaded records and derives the year extent, region list and domains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] if `records` is empty.
    pub fn new(records: impl Into<RecordSet>) -> Result<Self> {
        let records: RecordSet = records.into();
        let Some(first) = records.first() else {
            return Err(Error::EmptyDataset);
        };

        let years = records
            .iter()
            .fold((first.year, first.year), |(lo, hi), r| (lo.min(r.year), hi.max(r.year)));

        let mut seen = HashSet::new();
        let regions: Vec<Arc<str>> = records
            .iter()
            .filter(|r| seen.insert(Arc::clone(&r.region)))
            .map(|r| Arc::clone(&r.region))
            .collect();

        let domains = AttributeDomains::from_records(&records);

        crate::debug!(
            "dataset",
            "loaded {} records, years {}-{}",
            records.len(),
            years.0,
            years.1
        );

        Ok(Self {
            records,
            years,
            regions,
            domains,
        })
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: construction rejects empty input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest year (inclusive).
    #[must_use]
    pub fn year_extent(&self) -> (i32, i32) {
        self.years
    }

    /// Distinct regions in order of first appearance.
    #[must_use]
    pub fn regions(&self) -> &[Arc<str>] {
        &self.regions
    }

    /// Looks up the canonical shared name of a region.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&Arc<str>> {
        self.regions.iter().find(|r| r.as_ref() == name)
    }

    /// Attribute domains.
    #[must_use]
    pub fn domains(&self) -> &AttributeDomains {
        &self.domains
    }
}
