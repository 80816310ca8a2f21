//! View adapters bound to the bus.
//!
//! Each adapter derives the data its chart renders and nothing else:
//!
//! - **LineChartView**: average happiness per year, year-range brushing
//! - **MapView**: per-country averages with country/region emphasis
//! - **ParallelCoordinatesView**: per-country lines, axis brushes, line clicks
//! - **RooftopMatrixView**: attribute correlations of the current selection
//! - **FilterPanel**: region cycler and percentile/temperature/fertility sliders
//!
//! Adapters subscribe on attach and keep their model behind `Rc<RefCell<_>>`
//! so handlers can update it; [`LinkedView::model`] returns a snapshot.
//! User input is turned into [`Gesture`]s posted to the coordinator's queue.
//!
//! # Example
//!
//! ```rust,ignore
//! use wellbeing_viz::prelude::*;
//!
//! let mut dash = Dashboard::from_records(records, DashboardConfig::default())?;
//! let views = DashboardViews::attach(&ViewContext::new(&dash));
//! dash.refresh()?;
//!
//! views.line.click_point(2019);
//! dash.process()?;
//! assert_eq!(views.line.model().label, "2019");
//! ```

/// Filter panel (region cycler, sliders).
pub mod filters;
/// Line chart of yearly averages.
pub mod line;
/// Choropleth map.
pub mod map;
/// Rooftop correlation matrix.
pub mod matrix;
/// Parallel coordinates.
pub mod parallel;

pub use filters::{FilterPanel, FilterPanelModel, SliderModel};
pub use line::{LineChartModel, LineChartView, PointState, YearPoint};
pub use map::{Emphasis, MapModel, MapView};
pub use matrix::{RooftopMatrixModel, RooftopMatrixView};
pub use parallel::{Line, LineStyle, ParallelCoordinatesModel, ParallelCoordinatesView};

use crate::bus::{EventBus, Topic};
use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, Gesture, GestureQueue};
use crate::dataset::Dataset;

/// What an adapter needs to attach.
#[derive(Debug, Clone)]
pub struct ViewContext<'a> {
    /// Bus to subscribe on.
    pub bus: &'a EventBus,
    /// Queue to post gestures to.
    pub queue: GestureQueue,
    /// Root dataset (static extents, full-range aggregates).
    pub dataset: &'a Dataset,
    /// Thresholds.
    pub config: &'a DashboardConfig,
}

impl<'a> ViewContext<'a> {
    /// Context wired to `dashboard`.
    #[must_use]
    pub fn new(dashboard: &'a Dashboard) -> Self {
        Self {
            bus: dashboard.bus(),
            queue: dashboard.queue(),
            dataset: dashboard.dataset(),
            config: dashboard.config(),
        }
    }
}

/// Common surface of the adapters.
pub trait LinkedView {
    /// Derived presentation data.
    type Model: Clone;

    /// Name used in logs.
    const NAME: &'static str;

    /// Snapshot of the current model.
    fn model(&self) -> Self::Model;

    /// Drops every subscription. Returns how many were removed.
    fn detach(&mut self, bus: &EventBus) -> usize;
}

type Release = Box<dyn FnOnce(&EventBus) -> bool>;

/// Subscriptions owned by one adapter.
#[derive(Default)]
pub struct Subscriptions {
    releases: Vec<Release>,
}

impl std::fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriptions")
            .field("count", &self.releases.len())
            .finish()
    }
}

impl Subscriptions {
    /// Subscribes `handler` to `T` and remembers how to undo it.
    pub fn add<T, F>(&mut self, bus: &EventBus, handler: F)
    where
        T: Topic,
        F: FnMut(&T::Payload) + 'static,
    {
        let id = bus.subscribe::<T, F>(handler);
        self.releases
            .push(Box::new(move |bus: &EventBus| bus.unsubscribe::<T>(id)));
    }

    /// Unsubscribes everything. Returns how many were removed.
    pub fn release(&mut self, bus: &EventBus) -> usize {
        self.releases
            .drain(..)
            .map(|release| release(bus))
            .filter(|removed| *removed)
            .count()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// True if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Posts gestures on behalf of an adapter.
#[derive(Debug, Clone)]
pub(crate) struct Poster {
    view: &'static str,
    queue: GestureQueue,
}

impl Poster {
    pub(crate) fn new(view: &'static str, queue: GestureQueue) -> Self {
        Self { view, queue }
    }

    pub(crate) fn post(&self, gesture: Gesture) {
        crate::trace!(self.view, "post {gesture:?}");
        self.queue.post(gesture);
    }
}

/// All five adapters attached to one dashboard.
#[derive(Debug)]
pub struct DashboardViews {
    /// Line chart.
    pub line: LineChartView,
    /// Choropleth map.
    pub map: MapView,
    /// Parallel coordinates.
    pub parallel: ParallelCoordinatesView,
    /// Rooftop matrix.
    pub matrix: RooftopMatrixView,
    /// Filter panel.
    pub filters: FilterPanel,
}

impl DashboardViews {
    /// Attaches every adapter.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        Self {
            line: LineChartView::attach(ctx),
            map: MapView::attach(ctx),
            parallel: ParallelCoordinatesView::attach(ctx),
            matrix: RooftopMatrixView::attach(ctx),
            filters: FilterPanel::attach(ctx),
        }
    }

    /// Detaches every adapter. Returns how many subscriptions were removed.
    pub fn detach(&mut self, bus: &EventBus) -> usize {
        self.line.detach(bus)
            + self.map.detach(bus)
            + self.parallel.detach(bus)
            + self.matrix.detach(bus)
            + self.filters.detach(bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RegionHover;
    use crate::record::Record;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_subscriptions_release() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let mut subs = Subscriptions::default();
        let h = Rc::clone(&hits);
        subs.add::<RegionHover, _>(&bus, move |_| h.set(h.get() + 1));
        assert_eq!(subs.len(), 1);

        bus.publish::<RegionHover>(&None).unwrap();
        assert_eq!(subs.release(&bus), 1);
        assert!(subs.is_empty());
        bus.publish::<RegionHover>(&None).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_attach_and_detach_all() {
        let dash = Dashboard::from_records(
            vec![Record::new("Finland", "Western Europe", 2019)],
            DashboardConfig::default(),
        )
        .unwrap();
        let mut views = DashboardViews::attach(&ViewContext::new(&dash));
        let attached = views.detach(dash.bus());
        assert!(attached >= 5);
        assert_eq!(views.detach(dash.bus()), 0);
    }
}
