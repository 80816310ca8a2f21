//! # Wellbeing-Viz
//!
//! Linked-view filtering engine for a world happiness dashboard.
//!
//! Five views (line chart, choropleth, parallel coordinates, rooftop
//! correlation matrix, filter panel) share one selection. A gesture in any
//! view updates the [`selection::SelectionState`], the filter pipeline
//! recomputes the visible records, and the result is published on a typed
//! [`bus::EventBus`] so every other view re-derives its data.
//!
//! ## Features
//!
//! - **Typed bus**: topics are marker types with a fixed payload; no stringly
//!   typed subscriptions inside the crate
//! - **Deterministic pipeline**: region, year, happiness percentile, then
//!   attribute brushes, with the `-999` missing-value rule
//! - **Bounded dispatch**: re-entrant publishes and gesture storms surface as
//!   errors instead of overflowing the stack
//! - **Headless views**: adapters derive chart models without drawing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wellbeing_viz::prelude::*;
//!
//! let mut dash = Dashboard::from_records(records, DashboardConfig::load_or_default(path))?;
//! let views = DashboardViews::attach(&ViewContext::new(&dash));
//! dash.refresh()?;
//!
//! dash.dispatch(Gesture::ToggleRegion { region: "Western Europe".into(), checked: false })?;
//! println!("{} records visible", dash.filtered().len());
//! ```
//!
//! ## Feature Flags
//!
//! - `wasm`: JavaScript bindings exposing the coordinator and string topics

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Leveled debug logging and scope timing.
#[macro_use]
pub mod debug;

/// Error types.
pub mod error;

/// Record model, attributes and the missing-value sentinel.
pub mod record;

/// Immutable root dataset and attribute domains.
pub mod dataset;

/// Shared selection state and its transitions.
pub mod selection;

// ============================================================================
// Derivation Modules
// ============================================================================

/// Filter pipeline.
pub mod filter;

/// Per-country, per-region and per-year averages.
pub mod aggregate;

/// Pairwise Pearson correlation.
pub mod correlation;

// ============================================================================
// Coordination Modules
// ============================================================================

/// Typed publish/subscribe bus.
pub mod bus;

/// Gesture coordinator.
pub mod dashboard;

/// View adapters.
pub mod views;

/// YAML configuration.
pub mod config;

// ============================================================================
// Optional Integration Modules
// ============================================================================

/// WebAssembly bindings for browser usage.
#[cfg(feature = "wasm")]
#[cfg_attr(docsrs, doc(cfg(feature = "wasm")))]
pub mod wasm;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregate::{average_by_country, average_by_region, average_by_year, Aggregate};
    pub use crate::bus::{
        CountrySelected, CountrySelection, DataUpdate, EventBus, ParallelCoordinatesFilter,
        RegionHover, RegionSelected, RegionSelection, SubscriptionId, Topic, YearRangeTopic,
        YearRangeUpdate,
    };
    pub use crate::config::DashboardConfig;
    pub use crate::correlation::{pearson, CorrelationMatrix, CorrelationResult};
    pub use crate::dashboard::{BrushSource, Dashboard, Gesture, GestureQueue};
    pub use crate::dataset::{Dataset, RecordSet};
    pub use crate::error::{Error, Result};
    pub use crate::filter::filter_dataset;
    pub use crate::record::{Attribute, Record, MISSING};
    pub use crate::selection::{BrushKey, BrushRange, Focus, SelectionState, YearRange};
    pub use crate::views::{
        DashboardViews, FilterPanel, LineChartView, LinkedView, MapView, ParallelCoordinatesView,
        RooftopMatrixView, ViewContext,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }

    #[test]
    fn test_prelude_round_trip() {
        let records = vec![
            Record::new("Finland", "Western Europe", 2019).with(Attribute::HappinessScore, 7.8),
            Record::new("Chad", "Sub-Saharan Africa", 2019).with(Attribute::HappinessScore, 4.3),
        ];
        let mut dash = Dashboard::from_records(records, DashboardConfig::default()).unwrap();
        let views = DashboardViews::attach(&ViewContext::new(&dash));
        dash.refresh().unwrap();

        views.map.click_country("Chad");
        dash.process().unwrap();
        assert_eq!(views.matrix.model().title, "Correlations for Chad");
    }
}
