#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::time::Duration;

use anyhow::Result;
use structopt::StructOpt;

use model::{StoreWriter, TrajectoryStore};
use replay::{Animation, Config, Frame, IntervalScheduler, RenderSurface, SceneComposer};
use tracks::{CsvSource, EventID, HttpSource, IngestOptions, IngestReport, Ingestor, TrackSource};

#[derive(StructOpt)]
struct Args {
    /// A JSON config file. Anything missing uses the defaults.
    #[structopt(long)]
    config: Option<String>,
    /// The event to replay
    #[structopt(long)]
    event: String,
    /// Base URL of the event API, like http://localhost:5000/Event
    #[structopt(long)]
    url: Option<String>,
    /// A CSV file with participant,timestamp,longitude,latitude rows
    #[structopt(long)]
    csv: Option<String>,
    /// How long to run the animation, in real seconds
    #[structopt(long, default_value = "10")]
    seconds: f64,
}

enum Source {
    Http(String),
    Csv(String),
}

impl Args {
    fn source(&mut self) -> Result<Source> {
        match (self.url.take(), self.csv.take()) {
            (Some(url), None) => Ok(Source::Http(url)),
            (None, Some(path)) => Ok(Source::Csv(path)),
            (Some(_), Some(_)) => bail!("You can't specify both --url and --csv"),
            (None, None) => bail!("Specify --url or --csv"),
        }
    }

    fn run_for(&self) -> Result<Duration> {
        match Duration::try_from_secs_f64(self.seconds) {
            Ok(duration) => Ok(duration),
            Err(_) => bail!(
                "--seconds must be a non-negative number of seconds, not {}",
                self.seconds
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = Args::from_args();
    let config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    let run_for = args.run_for()?;
    let source = args.source()?;
    let event = EventID(args.event.clone());

    info!(
        "Replaying event {} over {} ({})",
        event,
        config.map.style,
        if config.map.access_token.is_some() {
            "with a map token"
        } else {
            "no map token"
        }
    );

    let store = TrajectoryStore::new();
    let composer = SceneComposer::new(config.scene_style(), config.view_state);
    let every = config.frames_per_second as usize;
    let animation = Animation::new(
        config.clock()?,
        composer,
        store.clone(),
        Box::new(LogSurface::new(every)),
    );
    let scheduler = IntervalScheduler::new(config.frames_per_second)?;
    let frames = animation.start(&scheduler);

    let writer = store.writer();
    let opts = config.ingest.clone();
    let ingest = async move {
        match source {
            Source::Http(url) => ingest(HttpSource::new(url), opts, &event, &writer).await,
            Source::Csv(path) => match CsvSource::load_path(&path, event.clone(), None) {
                Ok(source) => ingest(source, opts, &event, &writer).await,
                Err(err) => Err(err),
            },
        }
    };
    let (report, ()) = tokio::join!(
        ingest,
        tokio::time::sleep(run_for)
    );

    frames.cancel();
    match report {
        Ok(report) => info!("Done: {}", report),
        Err(err) => error!("Ingestion failed: {:#}", err),
    }
    info!(
        "Rendered {} frames, {} trajectories stored",
        animation.frames_rendered(),
        store.len()
    );
    Ok(())
}

async fn ingest<S: TrackSource>(
    source: S,
    opts: IngestOptions,
    event: &EventID,
    writer: &StoreWriter,
) -> Result<IngestReport> {
    Ingestor::new(source, opts)?.ingest(event, writer).await
}

/// Stands in for a map; summarizes what would be drawn, about once per second.
struct LogSurface {
    every: usize,
    count: usize,
}

impl LogSurface {
    fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }
}

impl RenderSurface for LogSurface {
    fn render(&mut self, frame: &Frame) {
        self.count += 1;
        debug!(
            "Frame {} at {:.1}: {} of {} trails visible",
            self.count,
            frame.current_time,
            frame.visible_count(),
            frame.trails.len()
        );
        if self.count % self.every != 0 {
            return;
        }
        info!(
            "t = {:.0}s, {} of {} trails visible",
            frame.current_time,
            frame.visible_count(),
            frame.trails.len()
        );
        for draw in &frame.trails {
            if let Some(ref visible) = draw.visible {
                let pts = visible.points(&draw.trajectory);
                if let Some(head) = pts.last() {
                    debug!(
                        "  {} at {} with {} points, color {:?}",
                        draw.trajectory.label,
                        head,
                        pts.len(),
                        draw.color
                    );
                }
            }
        }
    }
}
