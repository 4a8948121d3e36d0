#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod pos;
mod store;
mod theme;
pub mod trail;
mod trajectory;

use serde::{Deserialize, Serialize};

pub use self::pos::LonLat;
pub use self::store::{Snapshot, StoreWriter, TrajectoryStore};
pub use self::theme::{Rgb, Theme};
pub use self::trail::VisibleTrail;
pub use self::trajectory::Trajectory;

/// Only used to pick a trail color, not to identify anything
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VendorClass(pub u8);
