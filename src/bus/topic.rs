//! Topic markers and their payloads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::RecordSet;
use crate::record::Record;

/// A named channel with a fixed payload type.
///
/// Implementors are zero-sized markers; the bus keys subscriptions on the
/// marker type, so two topics may share a payload type.
pub trait Topic: 'static {
    /// Value delivered to handlers (by reference).
    type Payload: 'static;
    /// Wire name of the topic.
    const NAME: &'static str;
}

/// Globally filtered record set.
#[derive(Debug, Clone, Copy)]
pub struct DataUpdate;

/// Year range and single-year selection.
#[derive(Debug, Clone, Copy)]
pub struct YearRangeTopic;

/// Region focus (set or cleared).
#[derive(Debug, Clone, Copy)]
pub struct RegionSelection;

/// Country focus (set or cleared).
#[derive(Debug, Clone, Copy)]
pub struct CountrySelection;

/// Region under the pointer in the parallel coordinates view.
#[derive(Debug, Clone, Copy)]
pub struct RegionHover;

/// Record set produced by an axis brush.
#[derive(Debug, Clone, Copy)]
pub struct ParallelCoordinatesFilter;

impl Topic for DataUpdate {
    type Payload = RecordSet;
    const NAME: &'static str = "dataUpdate";
}

impl Topic for YearRangeTopic {
    type Payload = YearRangeUpdate;
    const NAME: &'static str = "yearRange";
}

impl Topic for RegionSelection {
    type Payload = Option<RegionSelected>;
    const NAME: &'static str = "regionSelection";
}

impl Topic for CountrySelection {
    type Payload = Option<CountrySelected>;
    const NAME: &'static str = "countrySelection";
}

impl Topic for RegionHover {
    type Payload = Option<Arc<str>>;
    const NAME: &'static str = "regionHover";
}

impl Topic for ParallelCoordinatesFilter {
    type Payload = RecordSet;
    const NAME: &'static str = "parallelCoordinatesFilter";
}

/// Every topic name, in table order.
pub const TOPIC_NAMES: [&str; 6] = [
    DataUpdate::NAME,
    YearRangeTopic::NAME,
    RegionSelection::NAME,
    CountrySelection::NAME,
    RegionHover::NAME,
    ParallelCoordinatesFilter::NAME,
];

/// Payload of [`YearRangeTopic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangeUpdate {
    /// First year of the range (inclusive).
    pub start_year: i32,
    /// Last year of the range (inclusive).
    pub end_year: i32,
    /// Single selected year overriding the range.
    pub selected_year: Option<i32>,
}

/// Payload of [`RegionSelection`] when a region is focused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSelected {
    /// Region name.
    pub region: Arc<str>,
    /// Line colour of the region, if the publisher has one.
    pub color: Option<String>,
}

/// Payload of [`CountrySelection`] when a country is focused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySelected {
    /// Country name.
    pub country: Arc<str>,
    /// Latest record of the country in the root dataset.
    pub record: Option<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_are_distinct() {
        let mut names = TOPIC_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOPIC_NAMES.len());
    }

    #[test]
    fn test_year_range_update_uses_camel_case() {
        let update = YearRangeUpdate {
            start_year: 2015,
            end_year: 2019,
            selected_year: Some(2017),
        };
        let yaml = serde_yaml_ng::to_string(&update).unwrap();
        assert!(yaml.contains("startYear: 2015"));
        assert!(yaml.contains("selectedYear: 2017"));
    }
}
