//! The coordinator: applies gestures to the selection state, re-runs the
//! pipeline and publishes the affected topics.
//!
//! Views never call back into the coordinator. Handlers post [`Gesture`]s to
//! a shared [`GestureQueue`], which [`Dashboard::dispatch`] drains after the
//! current publish returns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use crate::bus::{
    CountrySelected, CountrySelection, DataUpdate, EventBus, ParallelCoordinatesFilter,
    RegionHover, RegionSelected, RegionSelection, YearRangeTopic, YearRangeUpdate,
};
use crate::config::DashboardConfig;
use crate::dataset::{Dataset, RecordSet};
use crate::error::{Error, Result};
use crate::filter::{filter_dataset, focus_records, latest_record};
use crate::record::Record;
use crate::selection::{BrushKey, SelectionState};

/// Widget kind a brush gesture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushSource {
    /// Dual-handle slider in the filter panel.
    Slider,
    /// Axis brush in the parallel coordinates view.
    Axis,
}

/// A user gesture surfaced by a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Year slider moved.
    SetYearRange {
        /// First year (inclusive).
        start: i32,
        /// Last year (inclusive).
        end: i32,
    },
    /// Single year selected.
    SetSingleYear(i32),
    /// Single year deselected.
    ClearSingleYear,
    /// Line chart point clicked.
    ToggleYear(i32),
    /// Region checkbox changed.
    ToggleRegion {
        /// Region name.
        region: String,
        /// New checkbox state.
        checked: bool,
    },
    /// "All regions" checkbox changed.
    SetAllRegions(bool),
    /// Map polygon or line clicked.
    SelectCountry(String),
    /// Region line clicked.
    SelectRegionLine {
        /// Region name.
        region: String,
        /// Line colour forwarded on `regionSelection`.
        color: Option<String>,
    },
    /// Focus dismissed.
    ClearFocus,
    /// Pointer entered or left a region.
    HoverRegion(Option<String>),
    /// Brush set (`Some`) or cleared (`None`).
    SetBrush {
        /// Constrained key.
        key: BrushKey,
        /// Range in data units.
        range: Option<(f64, f64)>,
        /// Originating widget.
        source: BrushSource,
    },
    /// Every brush removed.
    ClearBrushes,
}

/// Shared FIFO of gestures waiting for the coordinator.
#[derive(Debug, Clone, Default)]
pub struct GestureQueue {
    inner: Rc<RefCell<VecDeque<Gesture>>>,
}

impl GestureQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a gesture.
    pub fn post(&self, gesture: Gesture) {
        self.inner.borrow_mut().push_back(gesture);
    }

    /// Number of pending gestures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn pop(&self) -> Option<Gesture> {
        self.inner.borrow_mut().pop_front()
    }

    fn clear(&self) -> usize {
        let mut queue = self.inner.borrow_mut();
        let dropped = queue.len();
        queue.clear();
        dropped
    }
}

/// Owns the dataset, the selection state and the bus.
#[derive(Debug)]
pub struct Dashboard {
    dataset: Dataset,
    state: SelectionState,
    bus: EventBus,
    queue: GestureQueue,
    published: RecordSet,
    config: DashboardConfig,
}

impl Dashboard {
    /// Creates a coordinator with default selection over `dataset`.
    #[must_use]
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        config.apply_logging();
        let state = SelectionState::new(&dataset);
        let published: RecordSet = filter_dataset(dataset.records(), &state).into();
        Self {
            bus: EventBus::with_max_depth(config.bus.max_dispatch_depth),
            queue: GestureQueue::new(),
            dataset,
            state,
            published,
            config,
        }
    }

    /// Loads `records` and creates a coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] for an empty input.
    pub fn from_records(records: impl Into<RecordSet>, config: DashboardConfig) -> Result<Self> {
        Ok(Self::new(Dataset::new(records)?, config))
    }

    /// The root dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The current selection.
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The shared bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// A handle views post gestures to.
    #[must_use]
    pub fn queue(&self) -> GestureQueue {
        self.queue.clone()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The globally filtered set last published on `dataUpdate`.
    #[must_use]
    pub fn filtered(&self) -> &RecordSet {
        &self.published
    }

    /// The rendering set for views that honour the single-entity focus.
    #[must_use]
    pub fn focused(&self) -> Vec<Record> {
        focus_records(&self.published, &self.state.focus())
    }

    /// Publishes the current year range and filtered set.
    pub fn refresh(&mut self) -> Result<()> {
        self.publish_year_range()?;
        self.publish_data()?;
        Ok(())
    }

    /// Applies `gesture` and every gesture handlers post in response.
    ///
    /// Returns the number of gestures applied.
    ///
    /// # Errors
    ///
    /// [`Error::GestureStorm`] if the queue does not settle within
    /// `bus.max_gestures_per_turn`; pending gestures are discarded. Errors of
    /// an individual gesture also discard the rest of the queue.
    pub fn dispatch(&mut self, gesture: Gesture) -> Result<usize> {
        self.queue.post(gesture);
        self.process()
    }

    /// Drains gestures posted outside a dispatch (view clicks, drags).
    pub fn process(&mut self) -> Result<usize> {
        let limit = self.config.bus.max_gestures_per_turn;
        let mut applied = 0;
        while let Some(gesture) = self.queue.pop() {
            if applied >= limit {
                let dropped = self.queue.clear() + 1;
                crate::error!("dashboard", "gesture storm, dropped {dropped} pending");
                return Err(Error::GestureStorm { limit });
            }
            if let Err(e) = self.apply(gesture) {
                self.queue.clear();
                return Err(e);
            }
            applied += 1;
        }
        Ok(applied)
    }

    fn apply(&mut self, gesture: Gesture) -> Result<()> {
        crate::debug!("dashboard", "{gesture:?}");
        match gesture {
            Gesture::SetYearRange { start, end } => {
                let changed = self.state.set_year_range(start, end);
                self.after_year_change(changed)
            }
            Gesture::SetSingleYear(year) => {
                let changed = self.state.set_single_year(year);
                self.after_year_change(changed)
            }
            Gesture::ClearSingleYear => {
                let changed = self.state.clear_single_year();
                self.after_year_change(changed)
            }
            Gesture::ToggleYear(year) => {
                let changed = self.state.toggle_year(year);
                self.after_year_change(changed)
            }
            Gesture::ToggleRegion { region, checked } => {
                if self.state.toggle_region_checked(&region, checked)? {
                    self.publish_data()?;
                }
                Ok(())
            }
            Gesture::SetAllRegions(checked) => {
                if self.state.set_all_regions(checked) {
                    self.publish_data()?;
                }
                Ok(())
            }
            Gesture::SelectCountry(country) => {
                let had_region = self.state.selected_region().is_some();
                self.state.select_country(&country);
                self.publish_country()?;
                if had_region && self.state.selected_region().is_none() {
                    self.bus.publish::<RegionSelection>(&None)?;
                }
                self.publish_data()
            }
            Gesture::SelectRegionLine { region, color } => {
                let had_country = self.state.selected_country().is_some();
                self.state.select_region_line(&region);
                let payload = self.state.selected_region().map(|r| RegionSelected {
                    region: Arc::clone(r),
                    color,
                });
                self.bus.publish::<RegionSelection>(&payload)?;
                if had_country && self.state.selected_country().is_none() {
                    self.bus.publish::<CountrySelection>(&None)?;
                }
                self.publish_data()
            }
            Gesture::ClearFocus => {
                let had_country = self.state.selected_country().is_some();
                let had_region = self.state.selected_region().is_some();
                if !self.state.clear_focus() {
                    return Ok(());
                }
                if had_country {
                    self.bus.publish::<CountrySelection>(&None)?;
                }
                if had_region {
                    self.bus.publish::<RegionSelection>(&None)?;
                }
                self.publish_data()
            }
            Gesture::HoverRegion(region) => {
                self.bus.publish::<RegionHover>(&region.map(Arc::<str>::from))?;
                Ok(())
            }
            Gesture::SetBrush { key, range, source } => {
                if !self.state.set_brush(key, range)? {
                    return Ok(());
                }
                self.recompute();
                if source == BrushSource::Axis {
                    self.bus.publish::<ParallelCoordinatesFilter>(&self.published)?;
                }
                self.bus.publish::<DataUpdate>(&self.published)?;
                Ok(())
            }
            Gesture::ClearBrushes => {
                if self.state.clear_brushes() {
                    self.publish_data()?;
                }
                Ok(())
            }
        }
    }

    fn after_year_change(&mut self, changed: bool) -> Result<()> {
        if !changed {
            return Ok(());
        }
        self.publish_year_range()?;
        self.publish_data()
    }

    fn recompute(&mut self) {
        self.published = filter_dataset(self.dataset.records(), &self.state).into();
    }

    fn publish_data(&mut self) -> Result<()> {
        self.recompute();
        self.bus.publish::<DataUpdate>(&self.published)?;
        Ok(())
    }

    fn publish_year_range(&self) -> Result<()> {
        let range = self.state.year_range();
        let update = YearRangeUpdate {
            start_year: range.start,
            end_year: range.end,
            selected_year: self.state.selected_year(),
        };
        self.bus.publish::<YearRangeTopic>(&update)?;
        Ok(())
    }

    fn publish_country(&self) -> Result<()> {
        let payload = self.state.selected_country().map(|c| CountrySelected {
            country: Arc::clone(c),
            record: latest_record(self.dataset.records(), c).cloned(),
        });
        self.bus.publish::<CountrySelection>(&payload)?;
        Ok(())
    }
}
