//! Parallel coordinates: one polyline per country over reorderable axes.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{LinkedView, Poster, Subscriptions, ViewContext};
use crate::aggregate::{Aggregate, AggregateCache};
use crate::bus::{CountrySelection, DataUpdate, EventBus, RegionSelection};
use crate::dashboard::{BrushSource, Gesture};
use crate::dataset::{AttributeDomain, RecordSet};
use crate::record::{Attribute, MISSING};
use crate::selection::Focus;

/// Padding added to both ends of a plain axis, as a share of its extent.
const AXIS_PADDING: f64 = 0.05;

/// How a line is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// The focused country or a member of the focused region.
    Focused,
    /// Another line while something is focused.
    Dimmed,
    /// Nothing is focused.
    Normal,
}

/// One country polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Country name.
    pub country: Arc<str>,
    /// Region name.
    pub region: Option<Arc<str>>,
    /// Values in axis order; [`MISSING`] is drawn at the axis bottom.
    pub values: Vec<f64>,
    /// Latest known population, the colour encoding.
    pub population: f64,
    /// Focus style.
    pub style: LineStyle,
}

/// Derived parallel coordinates data.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelCoordinatesModel {
    /// Axis order.
    pub axes: Vec<Attribute>,
    /// Axis domains in axis order; `None` if every value is missing.
    pub domains: Vec<Option<AttributeDomain>>,
    /// Lines of the current selection.
    pub lines: Vec<Line>,
    /// Population extent of the root dataset (static legend).
    pub population_extent: Option<(f64, f64)>,
    /// Current focus.
    pub focus: Focus,
}

impl ParallelCoordinatesModel {
    /// Lines a focused render draws: the focused country alone, else all.
    #[must_use]
    pub fn rendered(&self) -> Vec<&Line> {
        match &self.focus {
            Focus::Country(c) => self.lines.iter().filter(|l| l.country == *c).collect(),
            _ => self.lines.iter().collect(),
        }
    }
}

/// Axis domain over aggregated values, sentinel excluded.
///
/// Fertility starts at zero, temperature is unpadded, every other axis gets
/// a small margin on both ends.
fn axis_domain(aggregates: &[Aggregate], attribute: Attribute) -> Option<AttributeDomain> {
    let mut known = aggregates.iter().filter_map(|a| a.known(attribute));
    let first = known.next()?;
    let (min, max) = known.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some(match attribute {
        Attribute::FertilityRate => AttributeDomain { min: 0.0, max },
        Attribute::Temperature => AttributeDomain { min, max },
        _ => {
            let pad = (max - min) * AXIS_PADDING;
            AttributeDomain {
                min: min - pad,
                max: max + pad,
            }
        }
    })
}

#[derive(Debug)]
struct ParallelState {
    cache: AggregateCache,
    aggregates: Arc<[Aggregate]>,
    model: ParallelCoordinatesModel,
}

impl ParallelState {
    fn set_records(&mut self, records: &RecordSet) {
        self.aggregates = self.cache.by_country(records);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let axes = &self.model.axes;
        let focus = &self.model.focus;
        self.model.domains = axes
            .iter()
            .map(|&a| axis_domain(&self.aggregates, a))
            .collect();
        self.model.lines = self
            .aggregates
            .iter()
            .map(|agg| {
                let style = match focus {
                    Focus::None => LineStyle::Normal,
                    Focus::Country(c) if *c == agg.key => LineStyle::Focused,
                    Focus::Region(r) if agg.region.as_ref() == Some(r) => LineStyle::Focused,
                    _ => LineStyle::Dimmed,
                };
                Line {
                    country: Arc::clone(&agg.key),
                    region: agg.region.clone(),
                    values: axes.iter().map(|&a| agg.value(a)).collect(),
                    population: agg.value(Attribute::Population),
                    style,
                }
            })
            .collect();
    }
}

/// Parallel coordinates adapter.
#[derive(Debug)]
pub struct ParallelCoordinatesView {
    state: Rc<RefCell<ParallelState>>,
    subs: Subscriptions,
    poster: Poster,
}

impl ParallelCoordinatesView {
    /// Axis order before any drag: every attribute but population.
    pub const DEFAULT_AXES: [Attribute; 9] = Attribute::CORRELATED;

    /// Subscribes to `dataUpdate` and the focus topics.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        let population_extent = ctx
            .dataset
            .domains()
            .get(Attribute::Population)
            .map(|d| (d.min, d.max));
        let mut state = ParallelState {
            cache: AggregateCache::new(),
            aggregates: Arc::from(Vec::new()),
            model: ParallelCoordinatesModel {
                axes: Self::DEFAULT_AXES.to_vec(),
                domains: Vec::new(),
                lines: Vec::new(),
                population_extent,
                focus: Focus::None,
            },
        };
        state.set_records(ctx.dataset.records());
        let state = Rc::new(RefCell::new(state));

        let mut subs = Subscriptions::default();
        let s = Rc::clone(&state);
        subs.add::<DataUpdate, _>(ctx.bus, move |records| s.borrow_mut().set_records(records));
        let s = Rc::clone(&state);
        subs.add::<CountrySelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            state.model.focus = match selection {
                Some(c) => Focus::Country(Arc::clone(&c.country)),
                None if matches!(state.model.focus, Focus::Country(_)) => Focus::None,
                None => state.model.focus.clone(),
            };
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<RegionSelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            state.model.focus = match selection {
                Some(r) => Focus::Region(Arc::clone(&r.region)),
                None if matches!(state.model.focus, Focus::Region(_)) => Focus::None,
                None => state.model.focus.clone(),
            };
            state.rebuild();
        });

        Self {
            state,
            subs,
            poster: Poster::new(Self::NAME, ctx.queue.clone()),
        }
    }

    /// Moves the axis at `from` to position `to`. Returns false if either
    /// index is out of range.
    pub fn move_axis(&self, from: usize, to: usize) -> bool {
        let mut state = self.state.borrow_mut();
        let axes = &mut state.model.axes;
        if from >= axes.len() || to >= axes.len() {
            return false;
        }
        let axis = axes.remove(from);
        axes.insert(to, axis);
        state.rebuild();
        true
    }

    /// An axis brush was drawn (`Some`) or dismissed (`None`).
    pub fn brush_axis(&self, attribute: Attribute, range: Option<(f64, f64)>) {
        self.poster.post(Gesture::SetBrush {
            key: attribute.into(),
            range,
            source: BrushSource::Axis,
        });
    }

    /// A line was clicked.
    pub fn click_line(&self, country: &str) {
        self.poster.post(Gesture::SelectCountry(country.to_string()));
    }

    /// The pointer entered (`Some`) or left (`None`) a region's line.
    pub fn hover_line(&self, region: Option<&str>) {
        self.poster.post(Gesture::HoverRegion(region.map(str::to_string)));
    }
}

impl LinkedView for ParallelCoordinatesView {
    type Model = ParallelCoordinatesModel;
    const NAME: &'static str = "parallel_coordinates";

    fn model(&self) -> ParallelCoordinatesModel {
        self.state.borrow().model.clone()
    }

    fn detach(&mut self, bus: &EventBus) -> usize {
        self.subs.release(bus)
    }
}

/// Position of `value` on an axis as a share of its height, 0 at the bottom.
/// Missing values sit at the bottom; others are clamped to the axis.
#[must_use]
pub fn axis_position(value: f64, domain: Option<AttributeDomain>) -> f64 {
    let Some(d) = domain else {
        return 0.0;
    };
    if value == MISSING || d.max - d.min <= f64::EPSILON {
        return 0.0;
    }
    ((value - d.min) / (d.max - d.min)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::dashboard::Dashboard;
    use crate::record::Record;
    use approx::assert_relative_eq;

    fn dashboard() -> Dashboard {
        let mut records = Vec::new();
        for year in [2018, 2019] {
            records.push(
                Record::new("Finland", "Western Europe", year)
                    .with(Attribute::HappinessScore, 7.0 + f64::from(year - 2018))
                    .with(Attribute::FertilityRate, 1.4)
                    .with(Attribute::Population, 5.5e6),
            );
            records.push(
                Record::new("Niger", "Sub-Saharan Africa", year)
                    .with(Attribute::HappinessScore, 4.0)
                    .with(Attribute::FertilityRate, 6.8)
                    .with(Attribute::Temperature, 29.0),
            );
        }
        Dashboard::from_records(records, DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_lines_are_country_means() {
        let dash = dashboard();
        let view = ParallelCoordinatesView::attach(&ViewContext::new(&dash));
        let model = view.model();
        assert_eq!(model.lines.len(), 2);
        assert_eq!(model.axes.len(), 9);
        let finland = &model.lines[0];
        assert_relative_eq!(finland.values[0], 7.5);
        assert_eq!(finland.population, 5.5e6);
        // Finland has no temperature; the mean stays missing.
        let t = model.axes.iter().position(|&a| a == Attribute::Temperature).unwrap();
        assert_eq!(finland.values[t], MISSING);
    }

    #[test]
    fn test_axis_domains() {
        let dash = dashboard();
        let view = ParallelCoordinatesView::attach(&ViewContext::new(&dash));
        let model = view.model();
        let fert = model.axes.iter().position(|&a| a == Attribute::FertilityRate).unwrap();
        assert_eq!(model.domains[fert].unwrap().min, 0.0);
        let happy = model.domains[0].unwrap();
        assert!(happy.min < 4.0 && happy.max > 7.5);
    }

    #[test]
    fn test_move_axis() {
        let dash = dashboard();
        let view = ParallelCoordinatesView::attach(&ViewContext::new(&dash));
        assert!(view.move_axis(0, 8));
        let model = view.model();
        assert_eq!(model.axes[8], Attribute::HappinessScore);
        assert_relative_eq!(model.lines[0].values[8], 7.5);
        assert!(!view.move_axis(9, 0));
    }

    #[test]
    fn test_brush_and_click() {
        let mut dash = dashboard();
        let view = ParallelCoordinatesView::attach(&ViewContext::new(&dash));

        view.brush_axis(Attribute::FertilityRate, Some((0.0, 2.0)));
        dash.process().unwrap();
        assert_eq!(view.model().lines.len(), 1);

        view.brush_axis(Attribute::FertilityRate, None);
        view.click_line("Niger");
        dash.process().unwrap();
        let model = view.model();
        assert_eq!(model.lines.len(), 2);
        assert_eq!(model.focus, Focus::Country(Arc::from("Niger")));
        assert_eq!(model.rendered().len(), 1);
        assert_eq!(model.lines[0].style, LineStyle::Dimmed);
        assert_eq!(model.lines[1].style, LineStyle::Focused);
    }

    #[test]
    fn test_axis_position() {
        let d = Some(AttributeDomain { min: 0.0, max: 10.0 });
        assert_relative_eq!(axis_position(5.0, d), 0.5);
        assert_eq!(axis_position(MISSING, d), 0.0);
        assert_eq!(axis_position(20.0, d), 1.0);
        assert_eq!(axis_position(5.0, None), 0.0);
    }
}
