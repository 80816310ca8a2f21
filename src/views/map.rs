//! Choropleth map: one shade per country, emphasis from the focus topics.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{LinkedView, Poster, Subscriptions, ViewContext};
use crate::aggregate::{Aggregate, AggregateCache};
use crate::bus::{
    CountrySelection, DataUpdate, EventBus, ParallelCoordinatesFilter, RegionHover,
    RegionSelection,
};
use crate::dashboard::Gesture;
use crate::dataset::RecordSet;
use crate::record::Attribute;

/// Attribute the map shades by.
pub const MAP_ATTRIBUTE: Attribute = Attribute::HappinessScore;

/// How strongly a country is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// The focused country, or a member of the focused region.
    Focused,
    /// Another country while something is focused.
    Dimmed,
    /// Nothing is focused.
    Normal,
}

/// One country polygon's data.
#[derive(Debug, Clone, PartialEq)]
pub struct MapCountry {
    /// Country name.
    pub country: Arc<str>,
    /// Region name.
    pub region: Option<Arc<str>>,
    /// Mean of [`MAP_ATTRIBUTE`]; `None` draws the no-data fill.
    pub value: Option<f64>,
    /// Focus emphasis.
    pub emphasis: Emphasis,
    /// Region is under the pointer in the parallel coordinates view.
    pub hovered: bool,
}

/// Derived map data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapModel {
    /// Countries of the current selection, first-seen order.
    pub countries: Vec<MapCountry>,
    /// Extent of the known values, for the colour scale.
    pub value_domain: Option<(f64, f64)>,
    /// Focused country.
    pub selected_country: Option<Arc<str>>,
    /// Focused region.
    pub selected_region: Option<Arc<str>>,
    /// Hovered region.
    pub hovered_region: Option<Arc<str>>,
}

impl MapModel {
    /// True when the current selection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Position of `country`'s value in the colour domain, 0..=1.
    #[must_use]
    pub fn fill(&self, country: &str) -> Option<f64> {
        let value = self
            .countries
            .iter()
            .find(|c| &*c.country == country)?
            .value?;
        let (lo, hi) = self.value_domain?;
        if hi - lo <= f64::EPSILON {
            return Some(0.5);
        }
        Some(((value - lo) / (hi - lo)).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Default)]
struct MapState {
    cache: AggregateCache,
    aggregates: Option<Arc<[Aggregate]>>,
    model: MapModel,
}

impl MapState {
    fn set_records(&mut self, records: &RecordSet) {
        self.aggregates = Some(self.cache.by_country(records));
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let model = &mut self.model;
        let aggregates = self.aggregates.as_deref().unwrap_or_default();
        model.countries = aggregates
            .iter()
            .map(|agg| {
                let emphasis = match (&model.selected_country, &model.selected_region) {
                    (Some(c), _) if *c == agg.key => Emphasis::Focused,
                    (None, Some(r)) if agg.region.as_ref() == Some(r) => Emphasis::Focused,
                    (None, None) => Emphasis::Normal,
                    _ => Emphasis::Dimmed,
                };
                MapCountry {
                    country: Arc::clone(&agg.key),
                    region: agg.region.clone(),
                    value: agg.known(MAP_ATTRIBUTE),
                    emphasis,
                    hovered: model.hovered_region.is_some() && agg.region == model.hovered_region,
                }
            })
            .collect();
        model.value_domain = model
            .countries
            .iter()
            .filter_map(|c| c.value)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            });
    }
}

/// Choropleth adapter.
#[derive(Debug)]
pub struct MapView {
    state: Rc<RefCell<MapState>>,
    subs: Subscriptions,
    poster: Poster,
}

impl MapView {
    /// Subscribes to the record-set and focus topics.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        let state = Rc::new(RefCell::new(MapState::default()));
        state.borrow_mut().set_records(ctx.dataset.records());

        let mut subs = Subscriptions::default();
        let s = Rc::clone(&state);
        subs.add::<DataUpdate, _>(ctx.bus, move |records| s.borrow_mut().set_records(records));
        let s = Rc::clone(&state);
        subs.add::<ParallelCoordinatesFilter, _>(ctx.bus, move |records| {
            s.borrow_mut().set_records(records);
        });
        let s = Rc::clone(&state);
        subs.add::<CountrySelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            state.model.selected_country = selection.as_ref().map(|c| Arc::clone(&c.country));
            if state.model.selected_country.is_some() {
                state.model.selected_region = None;
            }
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<RegionSelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            state.model.selected_region = selection.as_ref().map(|r| Arc::clone(&r.region));
            if state.model.selected_region.is_some() {
                state.model.selected_country = None;
            }
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<RegionHover, _>(ctx.bus, move |region| {
            let mut state = s.borrow_mut();
            state.model.hovered_region.clone_from(region);
            state.rebuild();
        });

        Self {
            state,
            subs,
            poster: Poster::new(Self::NAME, ctx.queue.clone()),
        }
    }

    /// A country polygon was clicked.
    pub fn click_country(&self, country: &str) {
        self.poster.post(Gesture::SelectCountry(country.to_string()));
    }
}

impl LinkedView for MapView {
    type Model = MapModel;
    const NAME: &'static str = "choropleth";

    fn model(&self) -> MapModel {
        self.state.borrow().model.clone()
    }

    fn detach(&mut self, bus: &EventBus) -> usize {
        self.subs.release(bus)
    }
}
