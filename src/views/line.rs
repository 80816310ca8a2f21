//! Line chart of the yearly average happiness score with a year slider.

use std::cell::RefCell;
use std::rc::Rc;

use super::{LinkedView, Poster, Subscriptions, ViewContext};
use crate::aggregate::average_by_year;
use crate::bus::{EventBus, YearRangeTopic, YearRangeUpdate};
use crate::dashboard::Gesture;
use crate::record::Attribute;
use crate::selection::YearRange;

/// How a year point is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointState {
    /// The single selected year.
    Selected,
    /// Inside the active range (or any point while a single year is selected).
    InRange,
    /// Outside the active range.
    OutOfRange,
}

/// One point of the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearPoint {
    /// Year.
    pub year: i32,
    /// Mean happiness score over the full dataset.
    pub happiness: f64,
    /// Drawing state.
    pub state: PointState,
}

/// Derived line chart data.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChartModel {
    /// Points in year order.
    pub points: Vec<YearPoint>,
    /// Slider range.
    pub range: YearRange,
    /// Selected year, if any.
    pub selected_year: Option<i32>,
    /// Range caption, `"2015 - 2019"` or `"2019"`.
    pub label: String,
}

impl LineChartModel {
    fn apply(&mut self, update: &YearRangeUpdate) {
        self.range = YearRange::new(update.start_year, update.end_year);
        self.selected_year = update.selected_year;
        self.label = match update.selected_year {
            Some(year) => year.to_string(),
            None => self.range.to_string(),
        };
        for point in &mut self.points {
            point.state = match self.selected_year {
                Some(y) if y == point.year => PointState::Selected,
                Some(_) => PointState::InRange,
                None if self.range.contains(point.year) => PointState::InRange,
                None => PointState::OutOfRange,
            };
        }
    }

    /// Points joined by the line: the selected year alone, or the range.
    #[must_use]
    pub fn line(&self) -> Vec<YearPoint> {
        self.points
            .iter()
            .filter(|p| match self.selected_year {
                Some(y) => p.year == y,
                None => self.range.contains(p.year),
            })
            .copied()
            .collect()
    }
}

/// Line chart adapter.
#[derive(Debug)]
pub struct LineChartView {
    model: Rc<RefCell<LineChartModel>>,
    subs: Subscriptions,
    poster: Poster,
}

impl LineChartView {
    /// Computes the yearly averages and subscribes to `yearRange`.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        let points = average_by_year(ctx.dataset.records())
            .into_iter()
            .filter_map(|agg| {
                Some(YearPoint {
                    year: agg.key,
                    happiness: agg.known(Attribute::HappinessScore)?,
                    state: PointState::InRange,
                })
            })
            .collect();
        let (start, end) = ctx.dataset.year_extent();
        let mut model = LineChartModel {
            points,
            range: YearRange::new(start, end),
            selected_year: None,
            label: String::new(),
        };
        model.apply(&YearRangeUpdate {
            start_year: start,
            end_year: end,
            selected_year: None,
        });

        let model = Rc::new(RefCell::new(model));
        let mut subs = Subscriptions::default();
        let m = Rc::clone(&model);
        subs.add::<YearRangeTopic, _>(ctx.bus, move |update| m.borrow_mut().apply(update));

        Self {
            model,
            subs,
            poster: Poster::new(Self::NAME, ctx.queue.clone()),
        }
    }

    /// A point was clicked.
    pub fn click_point(&self, year: i32) {
        self.poster.post(Gesture::ToggleYear(year));
    }

    /// The slider was dragged.
    pub fn drag_range(&self, start: i32, end: i32) {
        self.poster.post(Gesture::SetYearRange { start, end });
    }
}

impl LinkedView for LineChartView {
    type Model = LineChartModel;
    const NAME: &'static str = "line_chart";

    fn model(&self) -> LineChartModel {
        self.model.borrow().clone()
    }

    fn detach(&mut self, bus: &EventBus) -> usize {
        self.subs.release(bus)
    }
}
