//! Filter panel: a region cycler and three range sliders.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{LinkedView, Poster, Subscriptions, ViewContext};
use crate::bus::{DataUpdate, EventBus};
use crate::dashboard::{BrushSource, Gesture};
use crate::record::Attribute;
use crate::selection::BrushKey;

/// Label of the cycler position that checks every region.
pub const ALL_REGIONS: &str = "All";

/// One slider's domain and handle positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderModel {
    /// Constrained key.
    pub key: BrushKey,
    /// Caption.
    pub title: &'static str,
    /// Left end of the track.
    pub min: f64,
    /// Right end of the track.
    pub max: f64,
    /// Handle positions (lower, upper).
    pub value: (f64, f64),
}

impl SliderModel {
    /// True while the handles span the whole track.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.value.0 <= self.min && self.value.1 >= self.max
    }
}

/// Derived panel data.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPanelModel {
    /// Cycler entries: `All`, then regions in first-seen order.
    pub regions: Vec<Arc<str>>,
    /// Current cycler position.
    pub region_index: usize,
    /// Sliders in display order.
    pub sliders: Vec<SliderModel>,
    /// Records passing the current filters.
    pub matching: usize,
}

impl FilterPanelModel {
    /// Text shown between the cycler arrows.
    #[must_use]
    pub fn region_label(&self) -> &str {
        self.regions.get(self.region_index).map_or(ALL_REGIONS, |r| &**r)
    }

    /// Slider for `key`.
    #[must_use]
    pub fn slider(&self, key: BrushKey) -> Option<&SliderModel> {
        self.sliders.iter().find(|s| s.key == key)
    }
}

/// Filter panel adapter.
#[derive(Debug)]
pub struct FilterPanel {
    model: Rc<RefCell<FilterPanelModel>>,
    subs: Subscriptions,
    poster: Poster,
}

impl FilterPanel {
    /// Builds slider domains from the root dataset and subscribes to
    /// `dataUpdate` for the match count.
    #[must_use]
    pub fn attach(ctx: &ViewContext<'_>) -> Self {
        let domains = ctx.dataset.domains();
        let mut sliders = vec![SliderModel {
            key: BrushKey::HappinessPercentile,
            title: "Top happiest countries (%)",
            min: 0.0,
            max: 100.0,
            value: (0.0, 100.0),
        }];
        for (attribute, title) in [
            (Attribute::Temperature, "Temperature (°C)"),
            (Attribute::FertilityRate, "Fertility rate"),
        ] {
            if let Some(d) = domains.get(attribute) {
                sliders.push(SliderModel {
                    key: attribute.into(),
                    title,
                    min: d.min,
                    max: d.max,
                    value: (d.min, d.max),
                });
            }
        }

        let mut regions = vec![Arc::from(ALL_REGIONS)];
        regions.extend(ctx.dataset.regions().iter().cloned());

        let model = Rc::new(RefCell::new(FilterPanelModel {
            regions,
            region_index: 0,
            sliders,
            matching: ctx.dataset.len(),
        }));

        let mut subs = Subscriptions::default();
        let m = Rc::clone(&model);
        subs.add::<DataUpdate, _>(ctx.bus, move |records| m.borrow_mut().matching = records.len());

        Self {
            model,
            subs,
            poster: Poster::new(Self::NAME, ctx.queue.clone()),
        }
    }

    /// Steps the region cycler by `direction` (wrapping) and posts the
    /// matching checkbox gestures.
    pub fn cycle_region(&self, direction: i32) {
        let region = {
            let mut model = self.model.borrow_mut();
            let len = model.regions.len() as i64;
            let next = (model.region_index as i64 + i64::from(direction)).rem_euclid(len);
            model.region_index = next as usize;
            (next != 0).then(|| model.regions[model.region_index].to_string())
        };
        match region {
            None => self.poster.post(Gesture::SetAllRegions(true)),
            Some(region) => {
                self.poster.post(Gesture::SetAllRegions(false));
                self.poster.post(Gesture::ToggleRegion {
                    region,
                    checked: true,
                });
            }
        }
    }

    /// Single-handle drag: keeps values up to `value`. Reaching the track's
    /// right end clears the constraint.
    pub fn drag_slider(&self, key: BrushKey, value: f64) {
        let Some(min) = self.model.borrow().slider(key).map(|s| s.min) else {
            return;
        };
        self.drag_range(key, min, value);
    }

    /// Dual-handle drag. Spanning the whole track clears the constraint.
    pub fn drag_range(&self, key: BrushKey, lower: f64, upper: f64) {
        let range = {
            let mut model = self.model.borrow_mut();
            let Some(slider) = model.sliders.iter_mut().find(|s| s.key == key) else {
                return;
            };
            let (lo, hi) = if lower <= upper { (lower, upper) } else { (upper, lower) };
            slider.value = (lo.clamp(slider.min, slider.max), hi.clamp(slider.min, slider.max));
            (!slider.is_unconstrained()).then_some(slider.value)
        };
        self.poster.post(Gesture::SetBrush {
            key,
            range,
            source: BrushSource::Slider,
        });
    }
}

impl LinkedView for FilterPanel {
    type Model = FilterPanelModel;
    const NAME: &'static str = "filters";

    fn model(&self) -> FilterPanelModel {
        self.model.borrow().clone()
    }

    fn detach(&mut self, bus: &EventBus) -> usize {
        self.subs.release(bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::dashboard::Dashboard;
    use crate::record::{Record, MISSING};

    fn dashboard() -> Dashboard {
        let rows = [
            ("Finland", "Western Europe", 7.8, 2.0, 1.4),
            ("Norway", "Western Europe", 7.5, 1.0, 1.5),
            ("Chad", "Sub-Saharan Africa", 4.3, 28.0, 5.8),
            ("Japan", "East Asia", 6.0, MISSING, 1.3),
        ];
        let records = rows
            .iter()
            .map(|&(c, r, h, t, f)| {
                Record::new(c, r, 2019)
                    .with(Attribute::HappinessScore, h)
                    .with(Attribute::Temperature, t)
                    .with(Attribute::FertilityRate, f)
            })
            .collect::<Vec<_>>();
        Dashboard::from_records(records, DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_slider_domains() {
        let dash = dashboard();
        let panel = FilterPanel::attach(&ViewContext::new(&dash));
        let model = panel.model();
        assert_eq!(model.sliders.len(), 3);
        let temp = model.slider(Attribute::Temperature.into()).unwrap();
        assert_eq!((temp.min, temp.max), (1.0, 28.0));
        let fert = model.slider(Attribute::FertilityRate.into()).unwrap();
        assert_eq!((fert.min, fert.max), (0.0, 5.8));
        assert!(fert.is_unconstrained());
    }

    #[test]
    fn test_region_cycler_wraps() {
        let mut dash = dashboard();
        let panel = FilterPanel::attach(&ViewContext::new(&dash));
        assert_eq!(panel.model().region_label(), "All");

        panel.cycle_region(1);
        dash.process().unwrap();
        assert_eq!(panel.model().region_label(), "Western Europe");
        assert_eq!(dash.filtered().len(), 2);
        assert_eq!(panel.model().matching, 2);

        panel.cycle_region(-1);
        panel.cycle_region(-1);
        dash.process().unwrap();
        assert_eq!(panel.model().region_label(), "East Asia");
        assert_eq!(dash.filtered().len(), 1);

        panel.cycle_region(1);
        dash.process().unwrap();
        assert_eq!(panel.model().region_label(), "All");
        assert_eq!(dash.filtered().len(), 4);
    }

    #[test]
    fn test_temperature_slider_and_sentinel() {
        let mut dash = dashboard();
        let panel = FilterPanel::attach(&ViewContext::new(&dash));
        let key = Attribute::Temperature.into();

        panel.drag_slider(key, 10.0);
        dash.process().unwrap();
        let names: Vec<&str> = dash.filtered().iter().map(|r| &*r.country).collect();
        assert_eq!(names, vec!["Finland", "Norway"]);

        panel.drag_slider(key, 40.0);
        dash.process().unwrap();
        assert_eq!(dash.filtered().len(), 4);
        assert!(dash.state().brush(key).is_none());
    }

    #[test]
    fn test_percentile_slider() {
        let mut dash = dashboard();
        let panel = FilterPanel::attach(&ViewContext::new(&dash));
        panel.drag_slider(BrushKey::HappinessPercentile, 50.0);
        dash.process().unwrap();
        let names: Vec<&str> = dash.filtered().iter().map(|r| &*r.country).collect();
        assert_eq!(names, vec!["Finland", "Norway"]);
    }

    #[test]
    fn test_unknown_slider_is_ignored() {
        let dash = dashboard();
        let panel = FilterPanel::attach(&ViewContext::new(&dash));
        panel.drag_slider(Attribute::Generosity.into(), 1.0);
        assert!(dash.queue().is_empty());
    }
}
