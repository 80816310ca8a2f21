//! Grouped means over a record set.
//!
//! Every attribute mean skips the missing-data sentinel. A group with no
//! valid value for an attribute reports [`MISSING`] for it, never 0 or NaN.
//! Groups come out in order of first appearance in the input.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use crate::dataset::RecordSet;
use crate::record::{Attribute, Record, MISSING};

/// How the population column of a group is reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopulationRule {
    /// Value of the latest year with a known population.
    Latest,
    /// Sum of every known population.
    Sum,
}

/// A derived record produced by grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<K = Arc<str>> {
    /// Group key (country, region or year).
    pub key: K,
    /// Region of the group's first record, for per-country aggregates.
    pub region: Option<Arc<str>>,
    /// Number of input records in the group.
    pub records: usize,
    values: [f64; Attribute::COUNT],
}

impl<K> Aggregate<K> {
    /// Aggregated value; [`MISSING`] if the group had no valid input.
    #[must_use]
    pub fn value(&self, attribute: Attribute) -> f64 {
        self.values[attribute.index()]
    }

    /// Aggregated value unless missing.
    #[must_use]
    pub fn known(&self, attribute: Attribute) -> Option<f64> {
        let v = self.value(attribute);
        (v != MISSING).then_some(v)
    }
}

#[derive(Debug, Clone)]
struct Accumulator {
    region: Arc<str>,
    records: usize,
    sums: [f64; Attribute::COUNT],
    counts: [usize; Attribute::COUNT],
    latest_population: Option<(i32, f64)>,
}

impl Accumulator {
    fn new(first: &Record) -> Self {
        Self {
            region: Arc::clone(&first.region),
            records: 0,
            sums: [0.0; Attribute::COUNT],
            counts: [0; Attribute::COUNT],
            latest_population: None,
        }
    }

    fn push(&mut self, record: &Record) {
        self.records += 1;
        for attr in Attribute::ALL {
            if let Some(v) = record.known(attr) {
                self.sums[attr.index()] += v;
                self.counts[attr.index()] += 1;
            }
        }
        if let Some(pop) = record.known(Attribute::Population) {
            match self.latest_population {
                Some((year, _)) if year > record.year => {}
                _ => self.latest_population = Some((record.year, pop)),
            }
        }
    }

    fn finish<K>(self, key: K, rule: PopulationRule, with_region: bool) -> Aggregate<K> {
        let mut values = [MISSING; Attribute::COUNT];
        for attr in Attribute::ALL {
            let i = attr.index();
            if self.counts[i] > 0 {
                values[i] = self.sums[i] / self.counts[i] as f64;
            }
        }
        let pop = Attribute::Population.index();
        values[pop] = match rule {
            PopulationRule::Latest => self.latest_population.map_or(MISSING, |(_, p)| p),
            PopulationRule::Sum if self.counts[pop] > 0 => self.sums[pop],
            PopulationRule::Sum => MISSING,
        };
        Aggregate {
            key,
            region: with_region.then_some(self.region),
            records: self.records,
            values,
        }
    }
}

fn group<K, F>(records: &[Record], key_of: F) -> Vec<(K, Accumulator)>
where
    K: Hash + Eq + Clone,
    F: Fn(&Record) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Accumulator)> = Vec::new();
    for record in records {
        let key = key_of(record);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Accumulator::new(record)));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }
    groups
}

/// Per-country means. Population is the latest known value.
#[must_use]
pub fn average_by_country(records: &[Record]) -> Vec<Aggregate> {
    group(records, |r| Arc::clone(&r.country))
        .into_iter()
        .map(|(k, acc)| acc.finish(k, PopulationRule::Latest, true))
        .collect()
}

/// Per-region means. Population is summed over the group.
#[must_use]
pub fn average_by_region(records: &[Record]) -> Vec<Aggregate> {
    group(records, |r| Arc::clone(&r.region))
        .into_iter()
        .map(|(k, acc)| acc.finish(k, PopulationRule::Sum, false))
        .collect()
}

/// Per-year means, ascending by year. Population is summed over the year.
#[must_use]
pub fn average_by_year(records: &[Record]) -> Vec<Aggregate<i32>> {
    let mut out: Vec<Aggregate<i32>> = group(records, |r| r.year)
        .into_iter()
        .map(|(k, acc)| acc.finish(k, PopulationRule::Sum, false))
        .collect();
    out.sort_by_key(|a| a.key);
    out
}

/// Total known population per region.
#[must_use]
pub fn sum_population_by_region(records: &[Record]) -> BTreeMap<Arc<str>, f64> {
    let mut totals: BTreeMap<Arc<str>, f64> = BTreeMap::new();
    for record in records {
        let total = totals.entry(Arc::clone(&record.region)).or_insert(0.0);
        if let Some(pop) = record.known(Attribute::Population) {
            *total += pop;
        }
    }
    totals
}

/// Memoizes aggregates of the most recently seen record set.
///
/// The key is the identity of the shared allocation, so the same `RecordSet`
/// delivered on several topics is aggregated once.
#[derive(Debug, Default)]
pub struct AggregateCache {
    source: Option<RecordSet>,
    by_country: Option<Arc<[Aggregate]>>,
    by_region: Option<Arc<[Aggregate]>>,
    hits: u64,
    misses: u64,
}

impl AggregateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rebind(&mut self, records: &RecordSet) {
        let same = self
            .source
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, records));
        if !same {
            self.source = Some(Arc::clone(records));
            self.by_country = None;
            self.by_region = None;
        }
    }

    /// [`average_by_country`] of `records`, memoized.
    pub fn by_country(&mut self, records: &RecordSet) -> Arc<[Aggregate]> {
        self.rebind(records);
        if let Some(hit) = &self.by_country {
            self.hits += 1;
            return Arc::clone(hit);
        }
        self.misses += 1;
        let fresh: Arc<[Aggregate]> = average_by_country(records).into();
        self.by_country = Some(Arc::clone(&fresh));
        fresh
    }

    /// [`average_by_region`] of `records`, memoized.
    pub fn by_region(&mut self, records: &RecordSet) -> Arc<[Aggregate]> {
        self.rebind(records);
        if let Some(hit) = &self.by_region {
            self.hits += 1;
            return Arc::clone(hit);
        }
        self.misses += 1;
        let fresh: Arc<[Aggregate]> = average_by_region(records).into();
        self.by_region = Some(Arc::clone(&fresh));
        fresh
    }

    /// (hits, misses) since creation.
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
