use serde::Serialize;

use crate::{LonLat, Trajectory};

/// The part of a trajectory to draw at one moment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisibleTrail {
    /// Inclusive range of path vertices whose timestamps fall inside the window. When the whole
    /// window sits between two vertices, this is empty (first > last).
    pub first: usize,
    pub last: usize,
    /// Interpolated position where the window starts, if that's strictly between two vertices
    pub tail: Option<LonLat>,
    /// Interpolated position at the current time, if that's strictly between two vertices
    pub head: Option<LonLat>,
}

impl VisibleTrail {
    pub fn vertex_count(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// The polyline to draw, from oldest to newest
    pub fn points(&self, trajectory: &Trajectory) -> Vec<LonLat> {
        let mut pts = Vec::with_capacity(self.vertex_count() + 2);
        pts.extend(self.tail);
        if self.first <= self.last {
            pts.extend_from_slice(&trajectory.path()[self.first..=self.last]);
        }
        pts.extend(self.head);
        pts
    }
}

/// Selects what's visible of `trajectory` at `current_time`, keeping `trail_length` time units of
/// history.
///
/// The window is `[current_time - trail_length, current_time]`, but it never reaches back before
/// 0. Virtual time restarts at 0 every loop, so the window always stays inside the current cycle and
/// no trail connects the end of one loop to the start of the next.
///
/// None if nothing is visible: the trajectory hasn't started yet, the whole trail has already
/// passed, or the parameters are nonsense.
pub fn select(trajectory: &Trajectory, current_time: f64, trail_length: f64) -> Option<VisibleTrail> {
    if !current_time.is_finite() || !trail_length.is_finite() || trail_length <= 0.0 {
        return None;
    }
    let window_start = (current_time - trail_length).max(0.0);
    if current_time < trajectory.start_time() || window_start > trajectory.end_time() {
        return None;
    }

    let times = trajectory.timestamps();
    // Both bounds come from binary search; first may equal times.len() only if window_start is
    // past the end, which was ruled out above.
    let first = times.partition_point(|t| *t < window_start);
    let after_last = times.partition_point(|t| *t <= current_time);
    // current_time >= start_time, so after_last >= 1
    let last = after_last - 1;

    let tail = if first > 0 && times[first] > window_start {
        Some(trajectory.point_between(first - 1, first, window_start))
    } else {
        None
    };
    let head = if after_last < times.len() && times[last] < current_time {
        Some(trajectory.point_between(last, after_last, current_time))
    } else {
        None
    };

    Some(VisibleTrail {
        first,
        last,
        tail,
        head,
    })
}
