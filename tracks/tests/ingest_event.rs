use std::time::Duration;

use model::{LonLat, TrajectoryStore};
use tracks::time::parse_instant;
use tracks::{
    EventID, EventInfo, IngestOptions, Ingestor, MemorySource, ParticipantID, RawTrack,
};

fn track(samples: &[(&str, f64, f64)]) -> RawTrack {
    RawTrack {
        path: samples
            .iter()
            .map(|(_, lon, lat)| LonLat::new(*lon, *lat))
            .collect(),
        timestamps: samples
            .iter()
            .map(|(t, _, _)| parse_instant(t).unwrap())
            .collect(),
    }
}

#[tokio::test]
async fn one_participant_fails() {
    let event = EventID::from("19");
    let a = ParticipantID::from("A");
    let b = ParticipantID::from("B");

    let mut source = MemorySource::new();
    source
        .add_event(
            event.clone(),
            EventInfo {
                start: parse_instant("2024-01-01T00:00:00Z").unwrap(),
                participants: vec![a.clone(), b.clone()],
            },
        )
        .add_track(
            event.clone(),
            a.clone(),
            track(&[
                ("2024-01-01T00:00:05Z", -4.88, 48.34),
                ("2024-01-01T00:00:09Z", -4.87, 48.35),
                ("2024-01-01T00:01:00Z", -4.85, 48.36),
            ]),
        )
        .add_failure(
            event.clone(),
            b.clone(),
            "connection reset",
            Duration::from_millis(5),
        );

    let store = TrajectoryStore::new();
    let ingestor = Ingestor::new(source, IngestOptions::default()).unwrap();
    let report = ingestor.ingest(&event, &store.writer()).await.unwrap();

    assert_eq!(report.appended, vec![a]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, b);
    assert!(report.failed[0].1.contains("connection reset"));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].label, "A");
    assert_eq!(snapshot[0].timestamps(), &[5.0, 9.0, 60.0]);
}

#[tokio::test]
async fn csv_file_end_to_end() {
    let input = "participant,timestamp,longitude,latitude
x,2024-06-01 12:00:00,0.0,0.0
x,2024-06-01 12:00:30,0.1,0.0
y,2024-06-01 12:00:10,1.0,1.0
y,2024-06-01 12:00:20,1.1,1.0
lonely,2024-06-01 12:00:15,2.0,2.0
";
    let event = EventID::from("local");
    let source = tracks::CsvSource::load(input.as_bytes(), event.clone(), None).unwrap();
    let store = TrajectoryStore::new();
    let ingestor = Ingestor::new(source, IngestOptions::default()).unwrap();
    let report = ingestor.ingest(&event, &store.writer()).await.unwrap();

    // A single sample isn't a trajectory
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, ParticipantID::from("lonely"));
    assert_eq!(store.len(), 2);

    let snapshot = store.snapshot();
    let y = snapshot.iter().find(|t| t.label == "y").unwrap();
    assert_eq!(y.timestamps(), &[10.0, 20.0]);
}
