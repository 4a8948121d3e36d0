use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{LonLat, VendorClass};

/// One moving object's path. Timestamps are seconds since the origin shared by every trajectory in
/// a store, never the source's own clock.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTrajectory")]
pub struct Trajectory {
    pub vendor: VendorClass,
    pub label: String,
    // Same length as timestamps, at least 2 points
    path: Vec<LonLat>,
    // Finite, non-decreasing
    timestamps: Vec<f64>,
}

// Deserialized trajectories go through the same checks as `Trajectory::new`
#[derive(Deserialize)]
struct UncheckedTrajectory {
    vendor: VendorClass,
    label: String,
    path: Vec<LonLat>,
    timestamps: Vec<f64>,
}

impl TryFrom<UncheckedTrajectory> for Trajectory {
    type Error = anyhow::Error;

    fn try_from(raw: UncheckedTrajectory) -> Result<Self> {
        Trajectory::new(raw.vendor, raw.label, raw.path, raw.timestamps)
    }
}

impl Trajectory {
    pub fn new(
        vendor: VendorClass,
        label: impl Into<String>,
        path: Vec<LonLat>,
        timestamps: Vec<f64>,
    ) -> Result<Self> {
        let label = label.into();
        if path.len() != timestamps.len() {
            bail!(
                "Trajectory {} has {} points, but {} timestamps",
                label,
                path.len(),
                timestamps.len()
            );
        }
        if path.len() < 2 {
            bail!("Trajectory {} doesn't have at least 2 points", label);
        }
        if let Some(idx) = timestamps.iter().position(|t| !t.is_finite()) {
            bail!("Trajectory {} has a non-finite timestamp at {}", label, idx);
        }
        if let Some(idx) = path.iter().position(|pt| !pt.is_finite()) {
            bail!("Trajectory {} has a non-finite position at {}", label, idx);
        }
        // Equal adjacent times are fine; a vessel might report twice in the same second
        for (idx, pair) in timestamps.windows(2).enumerate() {
            if pair[0] > pair[1] {
                bail!(
                    "Trajectory {} input out-of-order at {}: {} then {}",
                    label,
                    idx,
                    pair[0],
                    pair[1]
                );
            }
        }
        Ok(Self {
            vendor,
            label,
            path,
            timestamps,
        })
    }

    pub fn path(&self) -> &[LonLat] {
        &self.path
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn start_time(&self) -> f64 {
        self.timestamps[0]
    }

    pub fn end_time(&self) -> f64 {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// None if the trajectory isn't active at this time
    pub fn interpolate(&self, time: f64) -> Option<LonLat> {
        if !time.is_finite() || time < self.start_time() || time > self.end_time() {
            return None;
        }
        // First index with a timestamp strictly after time
        let idx = self.timestamps.partition_point(|t| *t <= time);
        if idx == self.timestamps.len() {
            return Some(self.path[idx - 1]);
        }
        Some(self.point_between(idx - 1, idx, time))
    }

    /// Position at `time` on the segment from vertex i1 to i2
    pub(crate) fn point_between(&self, i1: usize, i2: usize, time: f64) -> LonLat {
        let (t1, t2) = (self.timestamps[i1], self.timestamps[i2]);
        if t2 <= t1 {
            return self.path[i2];
        }
        self.path[i1].lerp(self.path[i2], (time - t1) / (t2 - t1))
    }
}
