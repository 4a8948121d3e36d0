use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

/// Receives the frame's timestamp, in milliseconds since the callback was registered.
pub type FrameCallback = Box<dyn FnMut(f64) + Send>;

/// Something that calls back once per display frame.
pub trait FrameScheduler {
    fn on_frame(&self, callback: FrameCallback) -> FrameHandle;
}

/// Stops a registered frame callback. Cancelling more than once is fine. Dropping the handle does
/// NOT cancel; teardown has to be explicit.
pub struct FrameHandle {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FrameHandle {
    fn new<F: FnOnce() + Send + 'static>(cancel: F) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    pub fn cancel(&self) {
        // Take it out first, so the canceller doesn't run while holding the lock
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.lock().is_none()
    }
}

/// Fires callbacks from a tokio interval. Must be used from inside a tokio runtime.
pub struct IntervalScheduler {
    period: Duration,
}

impl IntervalScheduler {
    pub fn new(frames_per_second: u32) -> Result<Self> {
        if frames_per_second == 0 {
            bail!("frames_per_second must be at least 1");
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / frames_per_second as f64),
        })
    }
}

impl FrameScheduler for IntervalScheduler {
    fn on_frame(&self, mut callback: FrameCallback) -> FrameHandle {
        let period = self.period;
        let task = tokio::spawn(async move {
            let start = Instant::now();
            let mut ticker = tokio::time::interval(period);
            // A slow frame shouldn't cause a burst of catch-up frames afterwards
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let now = ticker.tick().await;
                callback(now.duration_since(start).as_secs_f64() * 1000.0);
            }
        });
        FrameHandle::new(move || task.abort())
    }
}

/// Frames only happen when `advance_to` is called. For headless stepping and tests.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<Registry>>,
}

#[derive(Default)]
struct Registry {
    next_id: usize,
    callbacks: BTreeMap<usize, Arc<Mutex<FrameCallback>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every registered callback with this timestamp
    pub fn advance_to(&self, now_ms: f64) {
        let callbacks: Vec<(usize, Arc<Mutex<FrameCallback>>)> = self
            .inner
            .lock()
            .callbacks
            .iter()
            .map(|(id, cb)| (*id, cb.clone()))
            .collect();
        for (id, cb) in callbacks {
            // An earlier callback in this frame might have cancelled this one
            if !self.inner.lock().callbacks.contains_key(&id) {
                continue;
            }
            let mut cb = cb.lock();
            (*cb)(now_ms);
        }
    }

    pub fn num_registered(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn on_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.callbacks.insert(id, Arc::new(Mutex::new(callback)));
            id
        };
        let registry = self.inner.clone();
        FrameHandle::new(move || {
            registry.lock().callbacks.remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, FrameCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Box::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn manual_cancel_is_idempotent() {
        let scheduler = ManualScheduler::new();
        let (count, cb) = counter();
        let handle = scheduler.on_frame(cb);

        scheduler.advance_to(0.0);
        scheduler.advance_to(16.0);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.num_registered(), 0);

        scheduler.advance_to(32.0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_the_handle_keeps_running() {
        let scheduler = ManualScheduler::new();
        let (count, cb) = counter();
        drop(scheduler.on_frame(cb));
        scheduler.advance_to(0.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_fps() {
        assert!(IntervalScheduler::new(0).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_stops_after_cancel() {
        let scheduler = IntervalScheduler::new(10).unwrap();
        let (count, cb) = counter();
        let handle = scheduler.on_frame(cb);

        tokio::time::sleep(Duration::from_millis(450)).await;
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 4, "only {seen} frames");

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        // Let the aborted task wind down
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }
}
