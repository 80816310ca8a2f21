//! Selection state shared by every linked view.
//!
//! [`SelectionState`] owns the active filter predicates and enforces their
//! invariants on every transition:
//!
//! - a selected single year overrides the stored year range without erasing it;
//! - a selected country and a selected region are mutually exclusive;
//! - brush ranges are stored in data units with `min <= max`.
//!
//! Every transition returns `true` if the state actually changed, which the
//! coordinator uses to skip republishing unchanged selections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::{AttributeDomains, Dataset};
use crate::error::{Error, Result};
use crate::record::Attribute;

/// Key of the synthetic "top N% happiest" brush.
pub const HAPPINESS_PERCENTILE_KEY: &str = "happiness_percentile";

/// Inclusive year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (inclusive).
    pub start: i32,
    /// Last year (inclusive).
    pub end: i32,
}

impl YearRange {
    /// Creates a range, swapping inverted bounds.
    #[must_use]
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// True if `year` lies within the bounds.
    #[inline]
    #[must_use]
    pub fn contains(self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// True for a one-year range.
    #[must_use]
    pub fn is_single(self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} - {}", self.start, self.end)
        }
    }
}

/// The year predicate currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    /// Exact-year match from a single-year selection.
    Exact(i32),
    /// Inclusive range.
    Range(YearRange),
}

impl YearFilter {
    /// True if `year` passes the predicate.
    #[inline]
    #[must_use]
    pub fn matches(self, year: i32) -> bool {
        match self {
            YearFilter::Exact(y) => y == year,
            YearFilter::Range(r) => r.contains(year),
        }
    }
}

/// Key of one numeric range constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BrushKey {
    /// A record attribute, in data units.
    Attribute(Attribute),
    /// Percentile band of happiness within each year, in percent.
    HappinessPercentile,
}

impl BrushKey {
    /// Data column key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            BrushKey::Attribute(a) => a.key(),
            BrushKey::HappinessPercentile => HAPPINESS_PERCENTILE_KEY,
        }
    }
}

impl From<Attribute> for BrushKey {
    fn from(a: Attribute) -> Self {
        BrushKey::Attribute(a)
    }
}

impl fmt::Display for BrushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BrushKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == HAPPINESS_PERCENTILE_KEY {
            Ok(BrushKey::HappinessPercentile)
        } else {
            s.parse().map(BrushKey::Attribute)
        }
    }
}

/// A normalized `[min, max]` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushRange {
    min: f64,
    max: f64,
}

impl BrushRange {
    /// Normalizes a range for `key`: bounds are swapped if inverted and
    /// percentile bands are clamped to `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if either bound is not finite.
    pub fn new(key: BrushKey, a: f64, b: f64) -> Result<Self> {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::InvalidRange {
                key: key.to_string(),
                min: a,
                max: b,
            });
        }
        let (mut min, mut max) = if a <= b { (a, b) } else { (b, a) };
        if key == BrushKey::HappinessPercentile {
            min = min.clamp(0.0, 100.0);
            max = max.clamp(0.0, 100.0);
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    /// Inclusive containment.
    #[inline]
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Single-entity highlight applied as a display overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Focus {
    /// Nothing isolated.
    #[default]
    None,
    /// One country isolated (map polygon or line click).
    Country(Arc<str>),
    /// One region isolated (parallel coordinates line click).
    Region(Arc<str>),
}

/// The active filters and highlights.
#[derive(Debug, Clone)]
pub struct SelectionState {
    year_range: YearRange,
    selected_year: Option<i32>,
    all_regions: Vec<Arc<str>>,
    selected_regions: BTreeSet<Arc<str>>,
    selected_region: Option<Arc<str>>,
    selected_country: Option<Arc<str>>,
    brushes: BTreeMap<BrushKey, BrushRange>,
    domains: AttributeDomains,
}

impl SelectionState {
    /// Default state for `dataset`: full year range, every region checked,
    /// no brushes and no single selections.
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        let (start, end) = dataset.year_extent();
        let all_regions = dataset.regions().to_vec();
        Self {
            year_range: YearRange::new(start, end),
            selected_year: None,
            selected_regions: all_regions.iter().cloned().collect(),
            all_regions,
            selected_region: None,
            selected_country: None,
            brushes: BTreeMap::new(),
            domains: dataset.domains().clone(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Stored year range (kept while a single year overrides it).
    #[must_use]
    pub fn year_range(&self) -> YearRange {
        self.year_range
    }

    /// Selected single year, if any.
    #[must_use]
    pub fn selected_year(&self) -> Option<i32> {
        self.selected_year
    }

    /// The year predicate in force.
    #[must_use]
    pub fn year_filter(&self) -> YearFilter {
        match self.selected_year {
            Some(y) => YearFilter::Exact(y),
            None => YearFilter::Range(self.year_range),
        }
    }

    /// Checked regions.
    #[must_use]
    pub fn selected_regions(&self) -> &BTreeSet<Arc<str>> {
        &self.selected_regions
    }

    /// True if `region` is checked.
    #[must_use]
    pub fn is_region_checked(&self, region: &str) -> bool {
        self.selected_regions.contains(region)
    }

    /// Every region of the dataset in first-seen order.
    #[must_use]
    pub fn all_regions(&self) -> &[Arc<str>] {
        &self.all_regions
    }

    /// Region isolated by a line click.
    #[must_use]
    pub fn selected_region(&self) -> Option<&Arc<str>> {
        self.selected_region.as_ref()
    }

    /// Country isolated by a click.
    #[must_use]
    pub fn selected_country(&self) -> Option<&Arc<str>> {
        self.selected_country.as_ref()
    }

    /// Current single-entity focus.
    #[must_use]
    pub fn focus(&self) -> Focus {
        match (&self.selected_country, &self.selected_region) {
            (Some(c), _) => Focus::Country(Arc::clone(c)),
            (None, Some(r)) => Focus::Region(Arc::clone(r)),
            (None, None) => Focus::None,
        }
    }

    /// Range stored for `key`.
    #[must_use]
    pub fn brush(&self, key: BrushKey) -> Option<BrushRange> {
        self.brushes.get(&key).copied()
    }

    /// All brushes in key order.
    pub fn brushes(&self) -> impl Iterator<Item = (BrushKey, BrushRange)> + '_ {
        self.brushes.iter().map(|(k, v)| (*k, *v))
    }

    /// Root dataset domains (for the sentinel rule of attribute brushes).
    #[must_use]
    pub fn domains(&self) -> &AttributeDomains {
        &self.domains
    }

    // ------------------------------------------------------------------
    // Year transitions
    // ------------------------------------------------------------------

    /// Sets the year range and clears the single year.
    pub fn set_year_range(&mut self, start: i32, end: i32) -> bool {
        let range = YearRange::new(start, end);
        let mut changed = range != self.year_range;
        self.year_range = range;
        if self.selected_year.take().is_some() {
            changed = true;
        }
        self.check_invariants();
        changed
    }

    /// Selects one year; the stored range is kept for later restore.
    pub fn set_single_year(&mut self, year: i32) -> bool {
        let changed = self.selected_year != Some(year);
        self.selected_year = Some(year);
        changed
    }

    /// Deselects the single year, re-applying the stored range.
    pub fn clear_single_year(&mut self) -> bool {
        self.selected_year.take().is_some()
    }

    /// Line chart point click: selects `year`, or deselects it if already selected.
    pub fn toggle_year(&mut self, year: i32) -> bool {
        if self.selected_year == Some(year) {
            self.clear_single_year()
        } else {
            self.set_single_year(year)
        }
    }

    // ------------------------------------------------------------------
    // Region checkbox transitions
    // ------------------------------------------------------------------

    /// Checks or unchecks one region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the dataset has no such region.
    pub fn toggle_region_checked(&mut self, region: &str, checked: bool) -> Result<bool> {
        let Some(canonical) = self.all_regions.iter().find(|r| r.as_ref() == region) else {
            return Err(Error::UnknownRegion(region.to_string()));
        };
        let changed = if checked {
            self.selected_regions.insert(Arc::clone(canonical))
        } else {
            self.selected_regions.remove(region)
        };
        Ok(changed)
    }

    /// Checks every region, or none.
    pub fn set_all_regions(&mut self, checked: bool) -> bool {
        let before = self.selected_regions.len();
        if checked {
            self.selected_regions = self.all_regions.iter().cloned().collect();
        } else {
            self.selected_regions.clear();
        }
        before != self.selected_regions.len()
    }

    // ------------------------------------------------------------------
    // Single-entity transitions
    // ------------------------------------------------------------------

    /// Selects `country`, or deselects it if already selected. Clears the
    /// selected region.
    pub fn select_country(&mut self, country: &str) -> bool {
        if self.selected_country.as_deref() == Some(country) {
            self.selected_country = None;
        } else {
            self.selected_country = Some(Arc::from(country));
            self.selected_region = None;
        }
        self.check_invariants();
        true
    }

    /// Selects `region`, or deselects it if already selected. Clears the
    /// selected country.
    pub fn select_region_line(&mut self, region: &str) -> bool {
        if self.selected_region.as_deref() == Some(region) {
            self.selected_region = None;
        } else {
            let canonical = self
                .all_regions
                .iter()
                .find(|r| r.as_ref() == region)
                .map_or_else(|| Arc::from(region), Arc::clone);
            self.selected_region = Some(canonical);
            self.selected_country = None;
        }
        self.check_invariants();
        true
    }

    /// Clears both country and region focus.
    pub fn clear_focus(&mut self) -> bool {
        let had_country = self.selected_country.take().is_some();
        let had_region = self.selected_region.take().is_some();
        had_country || had_region
    }

    // ------------------------------------------------------------------
    // Brush transitions
    // ------------------------------------------------------------------

    /// Sets (`Some`) or clears (`None`) the constraint for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] for non-finite bounds.
    pub fn set_brush(&mut self, key: BrushKey, range: Option<(f64, f64)>) -> Result<bool> {
        match range {
            Some((a, b)) => {
                let range = BrushRange::new(key, a, b)?;
                Ok(self.brushes.insert(key, range) != Some(range))
            }
            None => Ok(self.brushes.remove(&key).is_some()),
        }
    }

    /// Removes every brush.
    pub fn clear_brushes(&mut self) -> bool {
        let changed = !self.brushes.is_empty();
        self.brushes.clear();
        changed
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.selected_country.is_none() || self.selected_region.is_none(),
            "country and region focus are mutually exclusive"
        );
        debug_assert!(self.year_range.start <= self.year_range.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Record::new("Finland", "Western Europe", 2015),
            Record::new("Kenya", "Sub-Saharan Africa", 2017),
            Record::new("Japan", "East and Southeast Asia", 2019),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let state = SelectionState::new(&dataset());
        assert_eq!(state.year_range(), YearRange::new(2015, 2019));
        assert_eq!(state.selected_year(), None);
        assert_eq!(state.selected_regions().len(), 3);
        assert_eq!(state.focus(), Focus::None);
        assert_eq!(state.brushes().count(), 0);
    }

    #[test]
    fn test_year_range_swaps_inverted_bounds() {
        let r = YearRange::new(2020, 2016);
        assert_eq!((r.start, r.end), (2016, 2020));
        assert_eq!(r.to_string(), "2016 - 2020");
        assert_eq!(YearRange::new(2019, 2019).to_string(), "2019");
    }

    #[test]
    fn test_single_year_overrides_and_restores_range() {
        let mut state = SelectionState::new(&dataset());
        state.set_year_range(2016, 2018);
        assert!(state.set_single_year(2017));
        assert_eq!(state.year_filter(), YearFilter::Exact(2017));
        assert_eq!(state.year_range(), YearRange::new(2016, 2018));

        assert!(state.clear_single_year());
        assert_eq!(state.year_filter(), YearFilter::Range(YearRange::new(2016, 2018)));
    }

    #[test]
    fn test_range_clears_single_year() {
        let mut state = SelectionState::new(&dataset());
        state.set_single_year(2017);
        assert!(state.set_year_range(2015, 2016));
        assert_eq!(state.selected_year(), None);
    }

    #[test]
    fn test_degenerate_range_also_clears_single_year() {
        let mut state = SelectionState::new(&dataset());
        state.set_single_year(2017);
        assert!(state.set_year_range(2018, 2018));
        assert_eq!(state.selected_year(), None);
        assert_eq!(state.year_filter(), YearFilter::Range(YearRange::new(2018, 2018)));
    }

    #[test]
    fn test_toggle_year() {
        let mut state = SelectionState::new(&dataset());
        assert!(state.toggle_year(2016));
        assert_eq!(state.selected_year(), Some(2016));
        assert!(state.toggle_year(2016));
        assert_eq!(state.selected_year(), None);
    }

    #[test]
    fn test_unchanged_transitions_report_false() {
        let mut state = SelectionState::new(&dataset());
        assert!(!state.set_year_range(2015, 2019));
        assert!(!state.clear_single_year());
        assert!(!state.set_all_regions(true));
        assert!(!state.clear_focus());
        assert!(!state.set_brush(Attribute::Temperature.into(), None).unwrap());
    }

    #[test]
    fn test_region_checkboxes() {
        let mut state = SelectionState::new(&dataset());
        assert!(state.toggle_region_checked("Western Europe", false).unwrap());
        assert!(!state.is_region_checked("Western Europe"));
        assert!(!state.toggle_region_checked("Western Europe", false).unwrap());
        assert!(state.toggle_region_checked("Western Europe", true).unwrap());

        assert!(state.set_all_regions(false));
        assert!(state.selected_regions().is_empty());
        assert!(state.set_all_regions(true));
        assert_eq!(state.selected_regions().len(), 3);
    }

    #[test]
    fn test_unknown_region_is_an_error() {
        let mut state = SelectionState::new(&dataset());
        let err = state.toggle_region_checked("Atlantis", true).unwrap_err();
        assert!(matches!(err, Error::UnknownRegion(_)));
    }

    #[test]
    fn test_country_and_region_are_exclusive() {
        let mut state = SelectionState::new(&dataset());
        state.select_region_line("Western Europe");
        assert_eq!(state.focus(), Focus::Region(Arc::from("Western Europe")));

        state.select_country("Finland");
        assert_eq!(state.selected_region(), None);
        assert_eq!(state.focus(), Focus::Country(Arc::from("Finland")));

        state.select_region_line("Sub-Saharan Africa");
        assert_eq!(state.selected_country(), None);
    }

    #[test]
    fn test_select_country_toggles_off() {
        let mut state = SelectionState::new(&dataset());
        state.select_country("Finland");
        state.select_country("Finland");
        assert_eq!(state.selected_country(), None);
        assert_eq!(state.focus(), Focus::None);
    }

    #[test]
    fn test_brush_normalizes_inverted_range() {
        let mut state = SelectionState::new(&dataset());
        let key = BrushKey::Attribute(Attribute::FertilityRate);
        assert!(state.set_brush(key, Some((2.0, 0.5))).unwrap());
        let range = state.brush(key).unwrap();
        assert_eq!((range.min(), range.max()), (0.5, 2.0));
        assert!(!state.set_brush(key, Some((0.5, 2.0))).unwrap());
        assert!(state.set_brush(key, None).unwrap());
        assert!(state.brush(key).is_none());
    }

    #[test]
    fn test_percentile_brush_clamped() {
        let range = BrushRange::new(BrushKey::HappinessPercentile, -10.0, 150.0).unwrap();
        assert_eq!((range.min(), range.max()), (0.0, 100.0));
    }

    #[test]
    fn test_non_finite_brush_rejected() {
        let mut state = SelectionState::new(&dataset());
        let err = state
            .set_brush(Attribute::Temperature.into(), Some((f64::NAN, 1.0)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_brush_key_parse() {
        assert_eq!(
            "happiness_percentile".parse::<BrushKey>().unwrap(),
            BrushKey::HappinessPercentile
        );
        assert_eq!(
            "temperature".parse::<BrushKey>().unwrap(),
            BrushKey::Attribute(Attribute::Temperature)
        );
        assert!("pixels".parse::<BrushKey>().is_err());
    }
}
