//! WebAssembly bindings for wellbeing-viz.
//!
//! Exposes the coordinator to the page that hosts the D3 views. Topics are
//! addressed by their string names and payloads cross the boundary as plain
//! JavaScript objects.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmDashboard } from 'wellbeing-viz';
//!
//! await init();
//!
//! const dash = new WasmDashboard(records, null);
//! dash.subscribe('dataUpdate', (rows) => redrawMap(rows));
//! dash.subscribe('yearRange', ({ startYear, endYear }) => redrawSlider(startYear, endYear));
//! dash.refresh();
//!
//! dash.toggle_region('Western Europe', false);
//! dash.set_brush('temperature', 0, 15, false);
//! dash.clear_brushes();
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::bus::{
    CountrySelection, DataUpdate, EventBus, FailureLatch, ParallelCoordinatesFilter, RegionHover,
    RegionSelection, SubscriptionId, Topic, YearRangeTopic,
};
use crate::config::DashboardConfig;
use crate::dashboard::{BrushSource, Dashboard, Gesture};
use crate::error::Error;
use crate::record::Record;
use crate::selection::BrushKey;

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    if crate::debug::env_requested() {
        crate::debug::enable();
    }
}

fn js_error(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Subscribes a JS callback to `T`; the payload is converted per call.
///
/// The first exception thrown by any callback sharing `failed` is held there
/// and every later callback is skipped until the latch is taken.
fn forward<T>(
    bus: &EventBus,
    failed: FailureLatch<JsValue>,
    callback: js_sys::Function,
) -> SubscriptionId
where
    T: Topic,
    T::Payload: Serialize,
{
    bus.subscribe::<T, _>(move |payload| {
        if failed.is_set() {
            return;
        }
        let value = match serde_wasm_bindgen::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                crate::warn!("wasm", "{}: payload conversion failed: {e}", T::NAME);
                return;
            }
        };
        if let Err(e) = callback.call1(&JsValue::NULL, &value) {
            crate::debug!("wasm", "{} handler threw: {e:?}", T::NAME);
            failed.record(e);
        }
    })
}

// ============================================================================
// Dashboard
// ============================================================================

/// Browser handle to one dashboard.
#[wasm_bindgen]
pub struct WasmDashboard {
    inner: Dashboard,
    handles: Vec<Option<(&'static str, SubscriptionId)>>,
    failed: FailureLatch<JsValue>,
}

#[wasm_bindgen]
impl WasmDashboard {
    /// Loads `records` (an array of record objects) with an optional YAML
    /// configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(records: JsValue, config_yaml: Option<String>) -> Result<WasmDashboard, JsValue> {
        let records: Vec<Record> = serde_wasm_bindgen::from_value(records)?;
        let config = match config_yaml {
            Some(yaml) => DashboardConfig::parse(&yaml).map_err(js_error)?,
            None => DashboardConfig::default(),
        };
        let inner = Dashboard::from_records(records, config).map_err(js_error)?;
        crate::info!("wasm", "dashboard loaded with {} records", inner.dataset().len());
        Ok(Self {
            inner,
            handles: Vec::new(),
            failed: FailureLatch::new(),
        })
    }

    /// Registers `callback` on the topic called `topic`. Returns a handle
    /// for [`WasmDashboard::unsubscribe`].
    pub fn subscribe(&mut self, topic: &str, callback: js_sys::Function) -> Result<u32, JsValue> {
        let bus = self.inner.bus();
        let failed = self.failed.clone();
        let entry = match topic {
            DataUpdate::NAME => (DataUpdate::NAME, forward::<DataUpdate>(bus, failed, callback)),
            YearRangeTopic::NAME => (
                YearRangeTopic::NAME,
                forward::<YearRangeTopic>(bus, failed, callback),
            ),
            RegionSelection::NAME => (
                RegionSelection::NAME,
                forward::<RegionSelection>(bus, failed, callback),
            ),
            CountrySelection::NAME => (
                CountrySelection::NAME,
                forward::<CountrySelection>(bus, failed, callback),
            ),
            RegionHover::NAME => (RegionHover::NAME, forward::<RegionHover>(bus, failed, callback)),
            ParallelCoordinatesFilter::NAME => (
                ParallelCoordinatesFilter::NAME,
                forward::<ParallelCoordinatesFilter>(bus, failed, callback),
            ),
            other => return Err(JsValue::from_str(&format!("unknown topic '{other}'"))),
        };
        self.handles.push(Some(entry));
        Ok((self.handles.len() - 1) as u32)
    }

    /// Removes a callback registered by [`WasmDashboard::subscribe`].
    pub fn unsubscribe(&mut self, handle: u32) -> bool {
        let Some((topic, id)) = self
            .handles
            .get_mut(handle as usize)
            .and_then(Option::take)
        else {
            return false;
        };
        let bus = self.inner.bus();
        match topic {
            DataUpdate::NAME => bus.unsubscribe::<DataUpdate>(id),
            YearRangeTopic::NAME => bus.unsubscribe::<YearRangeTopic>(id),
            RegionSelection::NAME => bus.unsubscribe::<RegionSelection>(id),
            CountrySelection::NAME => bus.unsubscribe::<CountrySelection>(id),
            RegionHover::NAME => bus.unsubscribe::<RegionHover>(id),
            _ => bus.unsubscribe::<ParallelCoordinatesFilter>(id),
        }
    }

    /// Publishes the current year range and filtered records.
    ///
    /// Rethrows the first exception raised by a subscribed callback.
    pub fn refresh(&mut self) -> Result<(), JsValue> {
        let result = self.inner.refresh().map_err(js_error);
        self.rethrow()?;
        result
    }

    /// Dispatches `gesture`, returning how many gestures were applied.
    /// Rethrows the first exception raised by a subscribed callback; the
    /// state change itself is kept.
    fn run(&mut self, gesture: Gesture) -> Result<u32, JsValue> {
        let result = self
            .inner
            .dispatch(gesture)
            .map(|applied| applied as u32)
            .map_err(js_error);
        self.rethrow()?;
        result
    }

    fn rethrow(&self) -> Result<(), JsValue> {
        match self.failed.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Moves the year slider.
    pub fn set_year_range(&mut self, start: i32, end: i32) -> Result<u32, JsValue> {
        self.run(Gesture::SetYearRange { start, end })
    }

    /// Clicks a line chart point.
    pub fn toggle_year(&mut self, year: i32) -> Result<u32, JsValue> {
        self.run(Gesture::ToggleYear(year))
    }

    /// Shows only `year`, overriding the range.
    pub fn set_single_year(&mut self, year: i32) -> Result<u32, JsValue> {
        self.run(Gesture::SetSingleYear(year))
    }

    /// Drops the single-year override and restores the range.
    pub fn clear_single_year(&mut self) -> Result<u32, JsValue> {
        self.run(Gesture::ClearSingleYear)
    }

    /// Sets one region checkbox.
    pub fn toggle_region(&mut self, region: String, checked: bool) -> Result<u32, JsValue> {
        self.run(Gesture::ToggleRegion { region, checked })
    }

    /// Sets the "all regions" checkbox.
    pub fn set_all_regions(&mut self, checked: bool) -> Result<u32, JsValue> {
        self.run(Gesture::SetAllRegions(checked))
    }

    /// Clicks a country.
    pub fn select_country(&mut self, country: String) -> Result<u32, JsValue> {
        self.run(Gesture::SelectCountry(country))
    }

    /// Clicks a region line.
    pub fn select_region(&mut self, region: String, color: Option<String>) -> Result<u32, JsValue> {
        self.run(Gesture::SelectRegionLine { region, color })
    }

    /// Clears the country or region focus.
    pub fn clear_focus(&mut self) -> Result<u32, JsValue> {
        self.run(Gesture::ClearFocus)
    }

    /// Pointer entered (`Some`) or left (`None`) a region.
    pub fn hover_region(&mut self, region: Option<String>) -> Result<u32, JsValue> {
        self.run(Gesture::HoverRegion(region))
    }

    /// Brushes `key` (an attribute key or `happiness_percentile`). Axis
    /// brushes also publish `parallelCoordinatesFilter`.
    pub fn set_brush(&mut self, key: &str, min: f64, max: f64, axis: bool) -> Result<u32, JsValue> {
        let key: BrushKey = key.parse().map_err(js_error)?;
        let source = if axis { BrushSource::Axis } else { BrushSource::Slider };
        self.run(Gesture::SetBrush {
            key,
            range: Some((min, max)),
            source,
        })
    }

    /// Removes the brush on `key`.
    pub fn clear_brush(&mut self, key: &str) -> Result<u32, JsValue> {
        let key: BrushKey = key.parse().map_err(js_error)?;
        self.run(Gesture::SetBrush {
            key,
            range: None,
            source: BrushSource::Slider,
        })
    }

    /// Removes every brush, the percentile band included.
    pub fn clear_brushes(&mut self) -> Result<u32, JsValue> {
        self.run(Gesture::ClearBrushes)
    }

    /// Records last published on `dataUpdate`.
    pub fn filtered(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&**self.inner.filtered())?)
    }

    /// Filtered records narrowed to the focused country or region.
    pub fn focused(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.focused())?)
    }
}

/// Library version.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}
