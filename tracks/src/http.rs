use anyhow::{Context, Result};
use geojson::{Geometry, Value};
use reqwest::Client;
use serde::Deserialize;

use model::LonLat;

use crate::time::parse_instant;
use crate::{EventID, EventInfo, ParticipantID, RawTrack, TrackSource};

/// Reads events and high-resolution traces from the race-tracking HTTP API.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// `base_url` is the event collection, like `http://localhost:5000/Event`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn event_url(&self, event: &EventID) -> String {
        format!("{}/{}", self.base_url, event)
    }

    fn track_url(&self, event: &EventID, participant: &ParticipantID) -> String {
        format!(
            "{}/{}/boat/{}/trace-hd?api-version=2.0",
            self.base_url, event, participant
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        let body = resp.text().await.with_context(|| format!("GET {url}"))?;
        serde_json::from_str(&body).with_context(|| format!("parsing response from {url}"))
    }
}

impl TrackSource for HttpSource {
    async fn resolve_event(&self, event: &EventID) -> Result<EventInfo> {
        let details: EventDetails = self.get_json(&self.event_url(event)).await?;
        details.into_info()
    }

    async fn fetch_track(&self, event: &EventID, participant: &ParticipantID) -> Result<RawTrack> {
        let trace: TraceHd = self.get_json(&self.track_url(event, participant)).await?;
        trace.into_raw()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDetails {
    start_date: String,
    #[serde(default)]
    event_boats: Vec<EventBoat>,
}

#[derive(Deserialize)]
struct EventBoat {
    id: serde_json::Value,
}

impl EventDetails {
    fn into_info(self) -> Result<EventInfo> {
        let start = parse_instant(&self.start_date).context("event startDate")?;
        let mut participants = Vec::new();
        for boat in self.event_boats {
            // The API has used both numeric and string IDs
            let id = match boat.id {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                x => bail!("Unexpected participant id {}", x),
            };
            participants.push(ParticipantID(id));
        }
        Ok(EventInfo {
            start,
            participants,
        })
    }
}

#[derive(Deserialize)]
struct TraceHd {
    tracks: Tracks,
    #[serde(default)]
    telemetry: Vec<Vec<Telemetry>>,
}

#[derive(Deserialize)]
struct Tracks {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Telemetry {
    timestamp: String,
}

impl TraceHd {
    // Only the first line and the first telemetry series are used; that's all the trace-hd
    // endpoint has ever returned.
    fn into_raw(self) -> Result<RawTrack> {
        let coords = match self.tracks.geometry.value {
            Value::LineString(line) => line,
            Value::MultiLineString(mut lines) => {
                if lines.is_empty() {
                    bail!("Track geometry has no lines");
                }
                lines.swap_remove(0)
            }
            _ => bail!("Track geometry isn't a LineString or MultiLineString"),
        };
        let mut path = Vec::new();
        for pos in coords {
            match LonLat::from_slice(&pos) {
                Some(pt) => path.push(pt),
                None => bail!("Bad position {:?} in track", pos),
            }
        }

        let mut timestamps = Vec::new();
        if let Some(series) = self.telemetry.into_iter().next() {
            for rec in series {
                timestamps.push(parse_instant(&rec.timestamp)?);
            }
        }
        Ok(RawTrack { path, timestamps })
    }
}
