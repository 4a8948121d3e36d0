use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use model::{StoreWriter, Trajectory, VendorClass};

use crate::time::normalize;
use crate::{EventID, ParticipantID, RawTrack, TrackSource};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    pub max_concurrent_fetches: usize,
    pub fetch_timeout_secs: f64,
    /// Every trajectory from this pipeline gets styled with this class
    pub vendor: VendorClass,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            fetch_timeout_secs: 30.0,
            vendor: VendorClass(1),
        }
    }
}

impl IngestOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            bail!("max_concurrent_fetches must be at least 1");
        }
        self.fetch_timeout()?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Result<Duration> {
        match Duration::try_from_secs_f64(self.fetch_timeout_secs) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => bail!(
                "fetch_timeout_secs must be a positive number of seconds, not {}",
                self.fetch_timeout_secs
            ),
        }
    }
}

/// What happened to each participant of one event
#[derive(Debug)]
pub struct IngestReport {
    pub event: EventID,
    /// In the order they were stored
    pub appended: Vec<ParticipantID>,
    /// The source couldn't deliver the track, or took too long
    pub failed: Vec<(ParticipantID, String)>,
    /// The track arrived, but isn't a valid trajectory
    pub rejected: Vec<(ParticipantID, String)>,
    /// The track was fine, but the store was already gone
    pub discarded: Vec<ParticipantID>,
}

impl IngestReport {
    fn new(event: EventID) -> Self {
        Self {
            event,
            appended: Vec::new(),
            failed: Vec::new(),
            rejected: Vec::new(),
            discarded: Vec::new(),
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "event {}: {} stored, {} failed, {} rejected, {} discarded",
            self.event,
            self.appended.len(),
            self.failed.len(),
            self.rejected.len(),
            self.discarded.len()
        )
    }
}

/// Fetches every track of an event and appends each one to a store as soon as it arrives.
pub struct Ingestor<S> {
    source: S,
    opts: IngestOptions,
    fetch_timeout: Duration,
}

impl<S: TrackSource> Ingestor<S> {
    pub fn new(source: S, opts: IngestOptions) -> Result<Self> {
        opts.validate()?;
        let fetch_timeout = opts.fetch_timeout()?;
        Ok(Self {
            source,
            opts,
            fetch_timeout,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Only fails if the event itself can't be resolved. Problems with individual participants are
    /// logged and recorded in the report; they never stop the others.
    pub async fn ingest(&self, event: &EventID, writer: &StoreWriter) -> Result<IngestReport> {
        let info = self
            .source
            .resolve_event(event)
            .await
            .with_context(|| format!("resolving event {event}"))?;
        info!(
            "Event {} starts at {} and has {} participants",
            event,
            info.start,
            info.participants.len()
        );

        let start = info.start;
        let mut report = IngestReport::new(event.clone());
        // Fetches complete in any order; each result is handled as soon as it's ready
        let mut fetches = stream::iter(info.participants)
            .map(move |participant| async move {
                let result = self.fetch(event, &participant).await;
                (participant, result)
            })
            .buffer_unordered(self.opts.max_concurrent_fetches);

        while let Some((participant, result)) = fetches.next().await {
            let raw = match result {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("Couldn't fetch track of {} for event {}: {:#}", participant, event, err);
                    report.failed.push((participant, format!("{err:#}")));
                    continue;
                }
            };
            let trajectory = match to_trajectory(&participant, raw, start, self.opts.vendor) {
                Ok(t) => t,
                Err(err) => {
                    warn!("Ignoring bad track of {} for event {}: {:#}", participant, event, err);
                    report.rejected.push((participant, format!("{err:#}")));
                    continue;
                }
            };
            match writer.append(trajectory) {
                Some(_) => report.appended.push(participant),
                None => {
                    debug!("Store is gone, dropping track of {}", participant);
                    report.discarded.push(participant);
                }
            }
        }

        info!("Finished ingesting {}", report);
        Ok(report)
    }

    async fn fetch(&self, event: &EventID, participant: &ParticipantID) -> Result<RawTrack> {
        let timeout = self.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.fetch_track(event, participant)).await {
            Ok(result) => result,
            Err(_) => bail!("timed out after {:?}", timeout),
        }
    }
}

/// Re-expresses a raw track relative to the event start. Degenerate tracks (fewer than 2 samples)
/// are rejected here, along with anything else that isn't a valid trajectory; they never reach
/// the store.
pub fn to_trajectory(
    participant: &ParticipantID,
    raw: RawTrack,
    event_start: DateTime<Utc>,
    vendor: VendorClass,
) -> Result<Trajectory> {
    let timestamps = normalize(event_start, &raw.timestamps);
    Trajectory::new(vendor, participant.0.clone(), raw.path, timestamps)
}
