use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;

use crate::{EventID, EventInfo, ParticipantID, RawTrack, TrackSource};

/// A source with fixed contents, for demos and tests. Individual tracks can be made slow or broken.
#[derive(Default)]
pub struct MemorySource {
    events: BTreeMap<EventID, EventInfo>,
    tracks: BTreeMap<(EventID, ParticipantID), Entry>,
}

enum Canned {
    Track(RawTrack),
    Failure(String),
}

struct Entry {
    canned: Canned,
    delay: Duration,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, event: EventID, info: EventInfo) -> &mut Self {
        self.events.insert(event, info);
        self
    }

    pub fn add_track(
        &mut self,
        event: EventID,
        participant: ParticipantID,
        track: RawTrack,
    ) -> &mut Self {
        self.insert(event, participant, Canned::Track(track), Duration::ZERO)
    }

    /// The track only arrives after `delay`
    pub fn add_slow_track(
        &mut self,
        event: EventID,
        participant: ParticipantID,
        track: RawTrack,
        delay: Duration,
    ) -> &mut Self {
        self.insert(event, participant, Canned::Track(track), delay)
    }

    /// Fetching this track fails with `msg`, after `delay`
    pub fn add_failure(
        &mut self,
        event: EventID,
        participant: ParticipantID,
        msg: &str,
        delay: Duration,
    ) -> &mut Self {
        self.insert(event, participant, Canned::Failure(msg.to_string()), delay)
    }

    fn insert(
        &mut self,
        event: EventID,
        participant: ParticipantID,
        canned: Canned,
        delay: Duration,
    ) -> &mut Self {
        self.tracks
            .insert((event, participant), Entry { canned, delay });
        self
    }
}

impl TrackSource for MemorySource {
    async fn resolve_event(&self, event: &EventID) -> Result<EventInfo> {
        match self.events.get(event) {
            Some(info) => Ok(info.clone()),
            None => bail!("Unknown event {}", event),
        }
    }

    async fn fetch_track(&self, event: &EventID, participant: &ParticipantID) -> Result<RawTrack> {
        let entry = match self.tracks.get(&(event.clone(), participant.clone())) {
            Some(entry) => entry,
            None => bail!("No track for {} in event {}", participant, event),
        };
        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }
        match &entry.canned {
            Canned::Track(track) => Ok(track.clone()),
            Canned::Failure(msg) => bail!("{}", msg),
        }
    }
}
