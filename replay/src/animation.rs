use std::sync::Arc;

use parking_lot::Mutex;

use model::TrajectoryStore;

use crate::{Clock, FrameHandle, FrameScheduler, Frame, SceneComposer, ViewState, ViewStateCell};

/// Wherever frames end up being drawn
pub trait RenderSurface: Send {
    fn render(&mut self, frame: &Frame);
}

/// Ties the clock, the store, and the composer together and pushes one frame per tick to a
/// surface. Clones share the same animation.
#[derive(Clone)]
pub struct Animation {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    clock: Clock,
    composer: SceneComposer,
    store: TrajectoryStore,
    surface: Box<dyn RenderSurface>,
    last_frame: Option<Frame>,
    frames_rendered: usize,
}

impl Inner {
    fn frame(&mut self, now_ms: f64) {
        let time = self.clock.on_frame(now_ms);
        if !time.is_finite() {
            // Keep the loop alive and show whatever was there before
            warn!("Virtual time became {}; redrawing the previous frame", time);
            if let Some(ref prev) = self.last_frame {
                self.surface.render(prev);
            }
            return;
        }

        let frame = self.composer.compose(time, &self.store.snapshot());
        self.surface.render(&frame);
        self.last_frame = Some(frame);
        self.frames_rendered += 1;
    }
}

impl Animation {
    pub fn new(
        clock: Clock,
        composer: SceneComposer,
        store: TrajectoryStore,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                clock,
                composer,
                store,
                surface,
                last_frame: None,
                frames_rendered: 0,
            })),
        }
    }

    /// Starts rendering on every frame of `scheduler`. Cancel the handle to tear down.
    pub fn start(&self, scheduler: &dyn FrameScheduler) -> FrameHandle {
        // The first frame of a new run has no previous timestamp to diff against
        self.inner.lock().clock.restart();
        let inner = self.inner.clone();
        scheduler.on_frame(Box::new(move |now_ms| inner.lock().frame(now_ms)))
    }

    /// Renders a single frame by hand
    pub fn frame(&self, now_ms: f64) {
        self.inner.lock().frame(now_ms);
    }

    /// Play/pause/seek/speed controls
    pub fn with_clock<T>(&self, f: impl FnOnce(&mut Clock) -> T) -> T {
        f(&mut self.inner.lock().clock)
    }

    pub fn now(&self) -> f64 {
        self.inner.lock().clock.now()
    }

    pub fn view_handle(&self) -> ViewStateCell {
        self.inner.lock().composer.view_handle()
    }

    pub fn view_state(&self) -> ViewState {
        self.inner.lock().composer.view_state()
    }

    pub fn frames_rendered(&self) -> usize {
        self.inner.lock().frames_rendered
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.inner.lock().last_frame.clone()
    }
}
