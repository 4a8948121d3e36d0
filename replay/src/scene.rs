use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use model::{trail, Rgb, Snapshot, Theme, Trajectory, VisibleTrail};

/// Camera over the map. Nothing here interprets it; it's passed back to the map surface as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
            zoom: 2.0,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// Shared handle to the current camera. The map surface gets a clone and reports user interaction
/// through `on_change`; the composer reads it every frame.
#[derive(Clone, Default)]
pub struct ViewStateCell {
    inner: Arc<Mutex<ViewState>>,
}

impl ViewStateCell {
    pub fn new(initial: ViewState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn get(&self) -> ViewState {
        *self.inner.lock()
    }

    pub fn on_change(&self, view_state: ViewState) {
        *self.inner.lock() = view_state;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailStyle {
    pub opacity: f32,
    pub width_min_pixels: f32,
    pub rounded: bool,
}

impl Default for TrailStyle {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            width_min_pixels: 2.0,
            rounded: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneStyle {
    /// How much history stays visible, in the same units as trajectory timestamps
    pub trail_length: f64,
    pub theme: Theme,
    pub trail: TrailStyle,
}

/// Everything the rendering primitive needs to draw one trajectory this frame
#[derive(Clone, Debug)]
pub struct TrailDraw {
    pub trajectory: Arc<Trajectory>,
    pub color: Rgb,
    pub current_time: f64,
    pub trail_length: f64,
    pub style: TrailStyle,
    /// None if nothing of this trajectory shows right now
    pub visible: Option<VisibleTrail>,
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub current_time: f64,
    pub view_state: ViewState,
    pub trails: Vec<TrailDraw>,
}

impl Frame {
    pub fn visible_count(&self) -> usize {
        self.trails.iter().filter(|t| t.visible.is_some()).count()
    }
}

pub struct SceneComposer {
    style: SceneStyle,
    view: ViewStateCell,
}

impl SceneComposer {
    pub fn new(style: SceneStyle, initial_view: ViewState) -> Self {
        Self {
            style,
            view: ViewStateCell::new(initial_view),
        }
    }

    /// Hand this to the map surface, so it can report camera changes
    pub fn view_handle(&self) -> ViewStateCell {
        self.view.clone()
    }

    pub fn view_state(&self) -> ViewState {
        self.view.get()
    }

    pub fn on_view_state_change(&self, view_state: ViewState) {
        self.view.on_change(view_state);
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    pub fn compose(&self, current_time: f64, snapshot: &Snapshot) -> Frame {
        let trail_length = self.style.trail_length;
        let trails = snapshot
            .iter()
            .map(|trajectory| TrailDraw {
                color: self.style.theme.color_for_class(trajectory.vendor),
                current_time,
                trail_length,
                style: self.style.trail.clone(),
                visible: trail::select(trajectory, current_time, trail_length),
                trajectory: trajectory.clone(),
            })
            .collect();
        Frame {
            current_time,
            view_state: self.view.get(),
            trails,
        }
    }
}
