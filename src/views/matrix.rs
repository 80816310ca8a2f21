//! Rooftop (upper-triangle) correlation matrix.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{LinkedView, Subscriptions, ViewContext};
use crate::bus::{CountrySelection, DataUpdate, EventBus, ParallelCoordinatesFilter, RegionSelection};
use crate::correlation::{CorrelationCell, CorrelationMatrix};
use crate::dataset::RecordSet;
use crate::filter::focus_records;
use crate::record::{format_label, Attribute};
use crate::selection::Focus;

/// Derived matrix data.
#[derive(Debug, Clone, PartialEq)]
pub struct RooftopMatrixModel {
    /// Correlations of the focused selection.
    pub matrix: CorrelationMatrix,
    /// Row/column labels.
    pub labels: Vec<String>,
    /// Chart title.
    pub title: String,
    /// Cells marked with the strong-correlation symbol.
    pub strong: Vec<CorrelationCell>,
    /// Records the matrix was computed over.
    pub sample_size: usize,
}

#[derive(Debug)]
struct MatrixState {
    records: RecordSet,
    focus: Focus,
    threshold: f64,
    model: RooftopMatrixModel,
}

impl MatrixState {
    fn rebuild(&mut self) {
        let rows = focus_records(&self.records, &self.focus);
        let matrix = CorrelationMatrix::compute(&rows, &Attribute::CORRELATED);
        self.model.title = match (&self.focus, rows.is_empty()) {
            (_, true) => "No data".to_string(),
            (Focus::Country(name) | Focus::Region(name), false) => format!("Correlations for {name}"),
            (Focus::None, false) => "Global Correlations".to_string(),
        };
        self.model.strong = matrix.strong(self.threshold).copied().collect();
        self.model.sample_size = rows.len();
        self.model.matrix = matrix;
    }
}

/// Rooftop matrix adapter. Read-only: it posts no gestures.
#[derive(Debug)]
pub struct RooftopMatrixView {
    state: Rc<RefCell<MatrixState>>,
    subs: Subscriptions,
}

impl RooftopMatrixView {
    /// Subscribes to both record-set topics and the focus topics.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        let mut state = MatrixState {
            records: Arc::clone(ctx.dataset.records()),
            focus: Focus::None,
            threshold: ctx.config.filters.strong_correlation,
            model: RooftopMatrixModel {
                matrix: CorrelationMatrix::compute(&[], &Attribute::CORRELATED),
                labels: Attribute::CORRELATED.iter().map(|a| format_label(a.key())).collect(),
                title: String::new(),
                strong: Vec::new(),
                sample_size: 0,
            },
        };
        state.rebuild();
        let state = Rc::new(RefCell::new(state));

        let mut subs = Subscriptions::default();
        let s = Rc::clone(&state);
        subs.add::<DataUpdate, _>(ctx.bus, move |records| {
            let mut state = s.borrow_mut();
            state.records = Arc::clone(records);
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<ParallelCoordinatesFilter, _>(ctx.bus, move |records| {
            let mut state = s.borrow_mut();
            state.records = Arc::clone(records);
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<CountrySelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            match selection {
                Some(c) => state.focus = Focus::Country(Arc::clone(&c.country)),
                None if matches!(state.focus, Focus::Country(_)) => state.focus = Focus::None,
                None => {}
            }
            state.rebuild();
        });
        let s = Rc::clone(&state);
        subs.add::<RegionSelection, _>(ctx.bus, move |selection| {
            let mut state = s.borrow_mut();
            match selection {
                Some(r) => state.focus = Focus::Region(Arc::clone(&r.region)),
                None if matches!(state.focus, Focus::Region(_)) => state.focus = Focus::None,
                None => {}
            }
            state.rebuild();
        });

        Self { state, subs }
    }
}

impl LinkedView for RooftopMatrixView {
    type Model = RooftopMatrixModel;
    const NAME: &'static str = "rooftop_matrix";

    fn model(&self) -> RooftopMatrixModel {
        self.state.borrow().model.clone()
    }

    fn detach(&mut self, bus: &EventBus) -> usize {
        self.subs.release(bus)
    }
}
