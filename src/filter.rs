//! The deterministic filter pipeline every view shares.
//!
//! Stages, each narrowing the previous stage's output:
//!
//! 1. region membership (checked regions)
//! 2. year (exact single year, else inclusive range)
//! 3. happiness percentile band per year group
//! 4. attribute brushes (inclusive, sentinel-aware)
//!
//! The single-entity focus is not a stage: [`focus_records`] derives the
//! overlay set for views that isolate one country or region, while the
//! published set stays the output of stages 1-4.

use std::collections::HashMap;

use crate::record::{is_missing, Record};
use crate::selection::{BrushKey, BrushRange, Focus, SelectionState};

/// Applies stages 1-4 to `records`. Neither input is modified.
///
/// An empty result is valid and must be published as such.
#[must_use]
pub fn filter_dataset(records: &[Record], state: &SelectionState) -> Vec<Record> {
    crate::time_scope!("pipeline", format!("filter_dataset({})", records.len()));

    let years = state.year_filter();
    let mut kept: Vec<Record> = records
        .iter()
        .filter(|r| state.is_region_checked(&r.region))
        .filter(|r| years.matches(r.year))
        .cloned()
        .collect();

    if let Some(band) = state.brush(BrushKey::HappinessPercentile) {
        kept = percentile_slice(kept, band);
    }

    for (key, range) in state.brushes() {
        let BrushKey::Attribute(attribute) = key else {
            continue;
        };
        let global_max = state.domains().max(attribute);
        kept.retain(|r| passes_brush(r.value(attribute), range, global_max));
    }

    crate::trace!("pipeline", "kept {} of {} records", kept.len(), records.len());
    kept
}

/// Keeps the `[min%, max%]` band of each year group ranked by descending
/// happiness score.
///
/// A group of `n` keeps indices `floor(n*min/100) .. ceil(n*max/100)`; ties
/// keep their input order. Groups are concatenated in order of first
/// appearance of their year.
#[must_use]
pub fn percentile_slice(records: Vec<Record>, band: BrushRange) -> Vec<Record> {
    let mut order: Vec<i32> = Vec::new();
    let mut groups: HashMap<i32, Vec<Record>> = HashMap::new();
    for record in records {
        let group = groups.entry(record.year).or_insert_with(|| {
            order.push(record.year);
            Vec::new()
        });
        group.push(record);
    }

    let mut out = Vec::new();
    for year in order {
        let Some(mut group) = groups.remove(&year) else {
            continue;
        };
        group.sort_by(|a, b| b.happiness_score.total_cmp(&a.happiness_score));
        let (lo, hi) = band_bounds(group.len(), band);
        if lo < hi {
            out.extend(group.drain(lo..hi));
        }
    }
    out
}

/// Index bounds of a percentile band over `n` ranked records.
#[must_use]
pub fn band_bounds(n: usize, band: BrushRange) -> (usize, usize) {
    let n_f = n as f64;
    let lo = ((n_f * band.min()) / 100.0).floor().max(0.0) as usize;
    let hi = ((n_f * band.max()) / 100.0).ceil().max(0.0) as usize;
    (lo.min(n), hi.min(n))
}

/// Inclusive brush test. A missing value only passes while the brush's upper
/// bound still reaches the attribute's global maximum.
#[inline]
#[must_use]
pub fn passes_brush(value: f64, range: BrushRange, global_max: Option<f64>) -> bool {
    if is_missing(value) {
        global_max.map_or(true, |max| range.max() >= max)
    } else {
        range.contains(value)
    }
}

/// Records a focus-honouring view renders from `records`.
#[must_use]
pub fn focus_records(records: &[Record], focus: &Focus) -> Vec<Record> {
    match focus {
        Focus::None => records.to_vec(),
        Focus::Country(c) => records.iter().filter(|r| r.country == *c).cloned().collect(),
        Focus::Region(g) => records.iter().filter(|r| r.region == *g).cloned().collect(),
    }
}

/// Latest record of `country`, if any.
#[must_use]
pub fn latest_record<'a>(records: &'a [Record], country: &str) -> Option<&'a Record> {
    records
        .iter()
        .filter(|r| &*r.country == country)
        .max_by_key(|r| r.year)
}


// ============================================================================
// Property-based tests with proptest
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::record::{Attribute, MISSING};
    use proptest::prelude::*;

    const REGIONS: [&str; 3] = ["Western Europe", "Latin America", "South Asia"];

    fn arb_record() -> impl Strategy<Value = Record> {
        (
            0usize..8,
            0usize..REGIONS.len(),
            2015i32..2022,
            0.0f64..10.0,
            prop_oneof![Just(MISSING), -5.0f64..30.0],
            0.5f64..7.0,
        )
            .prop_map(|(c, g, year, happiness, temp, fert)| {
                Record::new(format!("Country{c}"), REGIONS[g], year)
                    .with(Attribute::HappinessScore, happiness)
                    .with(Attribute::Temperature, temp)
                    .with(Attribute::FertilityRate, fert)
            })
    }

    fn arb_state_ops() -> impl Strategy<Value = (Option<i32>, (i32, i32), Vec<bool>, Option<(f64, f64)>, Option<(f64, f64)>)> {
        (
            prop::option::of(2015i32..2022),
            (2015i32..2022, 2015i32..2022),
            prop::collection::vec(any::<bool>(), REGIONS.len()),
            prop::option::of((-5.0f64..30.0, -5.0f64..30.0)),
            prop::option::of((0.0f64..7.0, 0.0f64..7.0)),
        )
    }

    fn build_state(
        ds: &Dataset,
        (year, (start, end), checks, temp, fert): (
            Option<i32>,
            (i32, i32),
            Vec<bool>,
            Option<(f64, f64)>,
            Option<(f64, f64)>,
        ),
    ) -> SelectionState {
        let mut state = SelectionState::new(ds);
        state.set_year_range(start, end);
        if let Some(y) = year {
            state.set_single_year(y);
        }
        for (region, checked) in REGIONS.iter().zip(checks) {
            // Regions absent from a small sample are simply unknown.
            let _ = state.toggle_region_checked(region, checked);
        }
        state.set_brush(Attribute::Temperature.into(), temp).unwrap();
        state.set_brush(Attribute::FertilityRate.into(), fert).unwrap();
        state
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Filtering is a projection when no percentile band is active.
        #[test]
        fn prop_filter_is_idempotent(
            records in prop::collection::vec(arb_record(), 1..60),
            ops in arb_state_ops()
        ) {
            let ds = Dataset::new(records).unwrap();
            let state = build_state(&ds, ops);
            let once = filter_dataset(ds.records(), &state);
            let twice = filter_dataset(&once, &state);
            prop_assert_eq!(once, twice);
        }

        /// Output never exceeds input, percentile band included.
        #[test]
        fn prop_filter_never_grows(
            records in prop::collection::vec(arb_record(), 1..60),
            ops in arb_state_ops(),
            band in prop::option::of((0.0f64..100.0, 0.0f64..100.0))
        ) {
            let ds = Dataset::new(records).unwrap();
            let mut state = build_state(&ds, ops);
            state.set_brush(BrushKey::HappinessPercentile, band).unwrap();
            prop_assert!(filter_dataset(ds.records(), &state).len() <= ds.len());
        }

        /// Adding one more brush never increases the result size.
        #[test]
        fn prop_extra_brush_narrows(
            records in prop::collection::vec(arb_record(), 1..60),
            ops in arb_state_ops(),
            happiness in (0.0f64..10.0, 0.0f64..10.0)
        ) {
            let ds = Dataset::new(records).unwrap();
            let mut state = build_state(&ds, ops);
            let before = filter_dataset(ds.records(), &state).len();
            state.set_brush(Attribute::HappinessScore.into(), Some(happiness)).unwrap();
            let after = filter_dataset(ds.records(), &state).len();
            prop_assert!(after <= before);
        }

        /// Same input, same output.
        #[test]
        fn prop_filter_is_deterministic(
            records in prop::collection::vec(arb_record(), 1..60),
            ops in arb_state_ops(),
            band in (0.0f64..100.0, 0.0f64..100.0)
        ) {
            let ds = Dataset::new(records).unwrap();
            let mut state = build_state(&ds, ops);
            state.set_brush(BrushKey::HappinessPercentile, Some(band)).unwrap();
            prop_assert_eq!(
                filter_dataset(ds.records(), &state),
                filter_dataset(ds.records(), &state)
            );
        }
    }
}
