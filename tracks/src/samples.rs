use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use model::LonLat;

use crate::time::parse_instant;
use crate::{EventID, EventInfo, ParticipantID, RawTrack, TrackSource};

/// All the samples of one event, from a local CSV file. The file has one row per sample:
/// `participant,timestamp,longitude,latitude`, in any order.
pub struct CsvSource {
    event: EventID,
    start: DateTime<Utc>,
    tracks: BTreeMap<ParticipantID, RawTrack>,
}

impl CsvSource {
    /// Unless `start` is given, the event starts at the earliest sample.
    pub fn load<R: std::io::Read>(
        reader: R,
        event: EventID,
        start: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        // Read raw data
        let mut data_per_participant: BTreeMap<ParticipantID, Vec<(DateTime<Utc>, LonLat)>> =
            BTreeMap::new();
        for rec in csv::Reader::from_reader(reader).deserialize() {
            let rec: Sample = rec?;
            let time = parse_instant(&rec.timestamp)?;
            let pos = rec.pos();
            data_per_participant
                .entry(rec.participant)
                .or_insert_with(Vec::new)
                .push((time, pos));
        }

        let earliest = data_per_participant
            .values()
            .flat_map(|samples| samples.iter().map(|(t, _)| *t))
            .min();
        let start = match start.or(earliest) {
            Some(t) => t,
            None => bail!("No samples for event {}, and no start time given", event),
        };

        let mut tracks = BTreeMap::new();
        for (participant, mut samples) in data_per_participant {
            // Rows may be interleaved between participants and out of order
            samples.sort_by_key(|(t, _)| *t);
            let (timestamps, path) = samples.into_iter().unzip();
            tracks.insert(participant, RawTrack { path, timestamps });
        }
        info!(
            "Loaded {} tracks for event {}, starting at {}",
            tracks.len(),
            event,
            start
        );

        Ok(Self {
            event,
            start,
            tracks,
        })
    }

    pub fn load_path(path: &str, event: EventID, start: Option<DateTime<Utc>>) -> Result<Self> {
        Self::load(fs_err::File::open(path)?, event, start)
    }

    fn check_event(&self, event: &EventID) -> Result<()> {
        if event != &self.event {
            bail!("This file only has event {}, not {}", self.event, event);
        }
        Ok(())
    }
}

impl TrackSource for CsvSource {
    async fn resolve_event(&self, event: &EventID) -> Result<EventInfo> {
        self.check_event(event)?;
        Ok(EventInfo {
            start: self.start,
            participants: self.tracks.keys().cloned().collect(),
        })
    }

    async fn fetch_track(&self, event: &EventID, participant: &ParticipantID) -> Result<RawTrack> {
        self.check_event(event)?;
        match self.tracks.get(participant) {
            Some(track) => Ok(track.clone()),
            None => bail!("No samples for {} in event {}", participant, event),
        }
    }
}

#[derive(Deserialize)]
struct Sample {
    participant: ParticipantID,
    timestamp: String,
    longitude: f64,
    latitude: f64,
    // The column is optional, and so is each value
    altitude: Option<f64>,
}

impl Sample {
    fn pos(&self) -> LonLat {
        match self.altitude {
            Some(altitude) => LonLat::with_altitude(self.longitude, self.latitude, altitude),
            None => LonLat::new(self.longitude, self.latitude),
        }
    }
}
