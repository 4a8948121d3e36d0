#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animation;
mod clock;
mod config;
mod frames;
mod scene;

pub use self::animation::{Animation, RenderSurface};
pub use self::clock::{Clock, PausePolicy};
pub use self::config::{Config, MapSettings};
pub use self::frames::{FrameCallback, FrameHandle, FrameScheduler, IntervalScheduler, ManualScheduler};
pub use self::scene::{
    Frame, SceneComposer, SceneStyle, TrailDraw, TrailStyle, ViewState, ViewStateCell,
};
