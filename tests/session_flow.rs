// tests/session_flow.rs
//
// End-to-end session behavior against the recording surface.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use geotrace::config::MapConfig;
use geotrace::filter::DateRange;
use geotrace::geocode::{DisabledGeocoder, FixedGeocoder, PlaceInfo};
use geotrace::loader::sources::{FileSource, StaticSource};
use geotrace::loader::ImportFile;
use geotrace::map::{Overlay, OverlayKind, RecordingSurface, SurfaceEvent};
use geotrace::record::{parse_timestamp, Coordinates};
use geotrace::selection::Place;
use geotrace::session::{DataStatus, Session};
use tokio::sync::oneshot;

fn doc(points: &[(f64, f64, &str)]) -> String {
    let features: Vec<String> = points
        .iter()
        .map(|(lat, lon, ts)| {
            format!(
                r#"{{"geometry":{{"coordinates":[{lat},{lon}]}},"properties":{{"datetime":"{ts}"}}}}"#
            )
        })
        .collect();
    format!("[{}]", features.join(","))
}

fn place(name: &str) -> PlaceInfo {
    PlaceInfo {
        name: Some(name.to_string()),
        ..PlaceInfo::default()
    }
}

fn heat_points(overlay: &Overlay) -> Vec<Coordinates> {
    match overlay {
        Overlay::Heatmap { points, .. } => points.clone(),
        other => panic!("expected heatmap, got {other:?}"),
    }
}

#[tokio::test]
async fn bootstrap_waits_for_surface_then_loads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        doc(&[
            (51.5, -0.1, "2023-01-10 10:00:00"),
            (48.8, 2.3, "2023-06-01 09:00:00"),
        ])
    )
    .unwrap();
    let source = FileSource::new(file.path());

    let (tx, rx) = oneshot::channel::<RecordingSurface>();
    let ready = async move { rx.await.expect("surface sender dropped") };
    let boot = tokio::spawn(async move {
        Session::bootstrap(
            ready,
            &MapConfig::default(),
            Arc::new(DisabledGeocoder),
            &source,
        )
        .await
    });

    tokio::task::yield_now().await;
    assert!(!boot.is_finished());

    tx.send(RecordingSurface::new()).unwrap();
    let session = boot.await.unwrap();

    assert!(matches!(
        session.status(),
        DataStatus::Loaded { records: 2, .. }
    ));
    assert_eq!(session.range(), None);
    let heat = session.surface().attached(OverlayKind::Heatmap);
    assert_eq!(heat.len(), 1);
    assert_eq!(
        heat_points(heat[0]),
        vec![Coordinates::new(51.5, -0.1), Coordinates::new(48.8, 2.3)]
    );
}

#[tokio::test]
async fn failed_default_load_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let missing = FileSource::new(dir.path().join("Geo.json"));

    let mut session = Session::bootstrap(
        std::future::ready(RecordingSurface::new()),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
        &missing,
    )
    .await;

    assert!(matches!(session.status(), DataStatus::NeedsImport { .. }));
    assert!(session.collection().is_empty());
    assert!(session.surface().events.is_empty());

    let n = session
        .import(&ImportFile::new(
            "trip.json",
            doc(&[(40.4, -3.7, "2022-05-05 12:00:00")]),
        ))
        .unwrap();
    assert_eq!(n, 1);
    assert!(matches!(session.status(), DataStatus::Loaded { .. }));
    assert_eq!(session.view().coordinates, vec![Coordinates::new(40.4, -3.7)]);
}

#[tokio::test]
async fn malformed_import_leaves_collection_unchanged() {
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[(51.5, -0.1, "2023-01-10 10:00:00")]),
        ))
        .await;
    let before = session.collection();
    let events_before = session.surface().events.len();

    assert!(session
        .import(&ImportFile::new("broken.json", "{not json"))
        .is_err());
    assert!(session
        .import(&ImportFile::new("photo.jpg", "[]"))
        .is_err());

    assert!(session.collection().same_snapshot(&before));
    assert_eq!(session.surface().events.len(), events_before);
}

#[tokio::test]
async fn replacing_data_never_stacks_heatmaps() {
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
    );
    session
        .import(&ImportFile::new("a.json", doc(&[(1.0, 1.0, "2023-01-01 00:00:00")])))
        .unwrap();
    session
        .import(&ImportFile::new("b.json", doc(&[(2.0, 2.0, "2023-01-01 00:00:00")])))
        .unwrap();

    let surface = session.surface();
    let heat = surface.attached(OverlayKind::Heatmap);
    assert_eq!(heat.len(), 1);
    assert_eq!(heat_points(heat[0]), vec![Coordinates::new(2.0, 2.0)]);
    assert_eq!(surface.peak(OverlayKind::Heatmap), 1);
    assert_eq!(surface.peak(OverlayKind::Markers), 1);

    // the old heatmap is detached before the new one goes in
    let heat_events: Vec<&SurfaceEvent> = surface
        .events
        .iter()
        .filter(|e| match e {
            SurfaceEvent::Attached(_, o) => o.kind() == OverlayKind::Heatmap,
            SurfaceEvent::Detached(_) => true,
            SurfaceEvent::Fitted(_) => false,
        })
        .collect();
    let first_id = match heat_events[0] {
        SurfaceEvent::Attached(id, _) => *id,
        other => panic!("unexpected first event {other:?}"),
    };
    let detach_pos = heat_events
        .iter()
        .position(|e| **e == SurfaceEvent::Detached(first_id))
        .expect("first heatmap detached");
    let second_attach = heat_events
        .iter()
        .skip(1)
        .position(|e| matches!(e, SurfaceEvent::Attached(..)))
        .map(|p| p + 1)
        .expect("second heatmap attached");
    assert!(detach_pos < second_attach);
}

#[tokio::test]
async fn range_narrowing_and_clearing() {
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[
                (51.5, -0.1, "2023-01-10 10:00:00"),
                (48.8, 2.3, "2023-06-01 09:00:00"),
                (41.9, 12.5, "not a date"),
            ]),
        ))
        .await;
    assert_eq!(session.view().len(), 3);

    let range = DateRange::new(
        parse_timestamp("2023-01-01 00:00:00").unwrap(),
        parse_timestamp("2023-02-01 00:00:00").unwrap(),
    );
    let view = session.set_range(Some(range));
    assert_eq!(view.coordinates, vec![Coordinates::new(51.5, -0.1)]);
    assert_eq!(view.skipped, 1);

    let view = session.set_range(None);
    assert_eq!(view.len(), 3);
    assert_eq!(session.surface().peak(OverlayKind::Heatmap), 1);
}

#[tokio::test(start_paused = true)]
async fn late_enrichment_for_previous_marker_is_discarded() {
    let geocoder = FixedGeocoder::new(place("Somewhere")).with_delay(Duration::from_secs(2));
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(geocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[
                (51.5, -0.1, "2023-01-10 10:00:00"),
                (48.8, 2.3, "2023-06-01 09:00:00"),
            ]),
        ))
        .await;
    let view = session.view();
    let a = view.records[0].key.clone();
    let b = view.records[1].key.clone();

    let sel_a = session.select_marker(&a).unwrap();
    assert_eq!(sel_a.place, Place::Pending);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let sel_b = session.select_marker(&b).unwrap();
    assert_eq!(sel_b.place, Place::Pending);

    // A's lookup would have finished here; it was superseded
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let current = session.selection().unwrap();
    assert_eq!(current.record.key, b);
    assert_eq!(current.place, Place::Pending);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let current = session.selection().unwrap();
    assert_eq!(current.record.key, b);
    assert_eq!(current.place, Place::Known(place("Somewhere")));
}

#[tokio::test(start_paused = true)]
async fn dismissed_selection_stays_dismissed() {
    let geocoder = FixedGeocoder::new(place("Paris")).with_delay(Duration::from_secs(1));
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(geocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[(48.8, 2.3, "2023-06-01 09:00:00")]),
        ))
        .await;
    let key = session.view().records[0].key.clone();

    session.select_marker(&key).unwrap();
    session.dismiss_selection();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.selection().is_none());
}

#[tokio::test]
async fn import_clears_selection() {
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[(48.8, 2.3, "2023-06-01 09:00:00")]),
        ))
        .await;
    let key = session.view().records[0].key.clone();
    session.select_marker(&key).unwrap();
    assert!(session.selection().is_some());

    session
        .import(&ImportFile::new("new.json", doc(&[(1.0, 1.0, "2023-01-01 00:00:00")])))
        .unwrap();
    assert!(session.selection().is_none());
    // the old marker is gone with its data
    assert!(session.select_marker(&key).is_none());
}

#[tokio::test]
async fn recenter_fits_filtered_points_only() {
    let mut session = Session::new(
        RecordingSurface::new(),
        &MapConfig::default(),
        Arc::new(DisabledGeocoder),
    );
    session
        .load_default(&StaticSource::new(
            "inline",
            doc(&[
                (51.5, -0.1, "2023-01-10 10:00:00"),
                (48.8, 2.3, "2023-06-01 09:00:00"),
            ]),
        ))
        .await;
    let bounds = session.recenter().unwrap();
    assert_eq!((bounds.south, bounds.north), (48.8, 51.5));

    session.set_range(Some(DateRange::new(
        parse_timestamp("2023-05-01 00:00:00").unwrap(),
        parse_timestamp("2023-07-01 00:00:00").unwrap(),
    )));
    let bounds = session.recenter().unwrap();
    assert_eq!((bounds.south, bounds.north), (48.8, 48.8));
    assert_eq!(session.surface().last_fit(), Some(bounds));

    session.set_range(Some(DateRange::new(
        parse_timestamp("2030-01-01 00:00:00").unwrap(),
        parse_timestamp("2031-01-01 00:00:00").unwrap(),
    )));
    assert!(session.recenter().is_none());
}
