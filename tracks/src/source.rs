use std::fmt;
use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use model::LonLat;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventID(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantID(pub String);

impl fmt::Display for EventID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ParticipantID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventID {
    fn from(x: &str) -> Self {
        Self(x.to_string())
    }
}

impl From<&str> for ParticipantID {
    fn from(x: &str) -> Self {
        Self(x.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct EventInfo {
    /// Every trajectory of this event is expressed relative to this instant
    pub start: DateTime<Utc>,
    pub participants: Vec<ParticipantID>,
}

/// A track as a source delivers it, before normalization. Nothing is validated yet.
#[derive(Clone, Debug)]
pub struct RawTrack {
    pub path: Vec<LonLat>,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// Somewhere events and their tracks come from. Both calls may fail or be slow; callers can't
/// assume anything about ordering or latency.
pub trait TrackSource: Send + Sync + 'static {
    fn resolve_event(&self, event: &EventID) -> impl Future<Output = Result<EventInfo>> + Send;

    fn fetch_track(
        &self,
        event: &EventID,
        participant: &ParticipantID,
    ) -> impl Future<Output = Result<RawTrack>> + Send;
}
