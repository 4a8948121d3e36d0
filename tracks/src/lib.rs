//! Fetching raw tracks from wherever they live and turning them into trajectories that share one
//! time origin.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod http;
mod memory;
mod pipeline;
mod samples;
mod source;
pub mod time;

pub use self::http::HttpSource;
pub use self::memory::MemorySource;
pub use self::pipeline::{to_trajectory, IngestOptions, IngestReport, Ingestor};
pub use self::samples::CsvSource;
pub use self::source::{EventID, EventInfo, ParticipantID, RawTrack, TrackSource};
