use super::*;
use crate::projection::config::{CheckSpec, PhaseFilter, TrackedTarget};
use crate::snapshot::model::{InputAttributes, Overlay, Snapshot, TextField};

fn titler(n: u64, title: &str, text: &str) -> Input {
    Input::new(n, format!("k{n}"), title, InputKind::Titler).with_attributes(InputAttributes {
        text: vec![TextField {
            name: "Text.Text".to_owned(),
            value: text.to_owned(),
        }],
        ..InputAttributes::default()
    })
}

fn audio(volume: f64, muted: bool, buses: &str) -> InputAttributes {
    InputAttributes {
        volume,
        muted,
        audio_buses: buses.to_owned(),
        ..InputAttributes::default()
    }
}

fn studio() -> Snapshot {
    Snapshot::new(vec![
        Input::new(1u64, "k1", "CAM1", InputKind::Video).with_attributes(audio(80.0, false, "M")),
        Input::new(2u64, "k2", "CAM2", InputKind::Video).with_attributes(audio(80.0, true, "M")),
        Input::new(3u64, "k3", "PLAYOUT", InputKind::VideoList)
            .with_overlay(Overlay::full_frame("k4"))
            .with_attributes(InputAttributes {
                state: Some(PlaybackState::Running),
                position_ms: 65_400,
                duration_ms: 3_725_000,
                ..audio(0.0, false, "MA")
            }),
        titler(4, "LOWER THIRD", "Dr. Example"),
        titler(5, "CAPTIONS", ""),
        Input::new(6u64, "k6", "SLIDES STREAM", InputKind::Mix).with_active(7u64),
        Input::new(7u64, "k7", "SLIDES", InputKind::Video).with_attributes(audio(10.0, false, "A")),
    ])
    .with_program(3u64)
    .with_recording(true)
}

fn config() -> ProjectionConfig {
    ProjectionConfig {
        tracked: vec![
            TrackedTarget {
                name: "stream".to_owned(),
                source: TrackedSource::Program,
            },
            TrackedTarget {
                name: "slides".to_owned(),
                source: TrackedSource::Title("SLIDES STREAM".to_owned()),
            },
            TrackedTarget {
                name: "missing".to_owned(),
                source: TrackedSource::Number(InputNumber::from("99")),
            },
        ],
        captions_title: Some("CAPTIONS".to_owned()),
        master_bus: 'M',
        checks: vec![
            CheckSpec {
                name: "wrong camera on air".to_owned(),
                target: "stream".to_owned(),
                phase: PhaseFilter::Session,
                required: ["CAM1".to_owned(), "CAM2".to_owned()].into(),
            },
            CheckSpec {
                name: "slides missing".to_owned(),
                target: "slides".to_owned(),
                phase: PhaseFilter::Any,
                required: ["SLIDES".to_owned()].into(),
            },
        ],
        ..ProjectionConfig::default()
    }
}

#[test]
fn program_view_shows_playback_and_topmost_titler_text() {
    let snap = studio();
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Session);

    let program = dash.program.unwrap();
    assert_eq!(program.title, "PLAYOUT");
    assert_eq!(program.overlay_text.as_deref(), Some("Dr. Example"));
    assert_eq!(
        program.playback,
        Some(PlaybackView {
            state: PlaybackState::Running,
            position: "0:01:05".to_owned(),
            duration: "1:02:05".to_owned(),
        })
    );
}

#[test]
fn tracked_targets_resolve_to_title_sets() {
    let snap = studio();
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Break);

    let stream: Vec<&str> = dash.tracked["stream"].iter().map(String::as_str).collect();
    assert_eq!(stream, vec!["LOWER THIRD", "PLAYOUT"]);
    assert!(dash.tracked["slides"].contains("SLIDES"));
    assert!(dash.tracked["missing"].is_empty());
}

#[test]
fn checks_warn_only_in_matching_phase() {
    let snap = studio();
    let index = SnapshotIndex::build(&snap);

    let session = project(&index, &config(), SchedulePhase::Session);
    assert_eq!(session.warnings.len(), 1);
    assert_eq!(session.warnings[0].check, "wrong camera on air");
    assert!(session.warnings[0].visible.contains("PLAYOUT"));

    let brk = project(&index, &config(), SchedulePhase::Break);
    assert!(brk.warnings.is_empty());
}

#[test]
fn audio_master_lists_unmuted_audible_master_inputs() {
    let snap = studio();
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Session);
    assert_eq!(dash.audio_master, vec!["CAM1".to_owned()]);
}

#[test]
fn flags_and_captions() {
    let snap = studio();
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Session);
    assert!(dash.recording);
    assert!(!dash.streaming);
    assert!(!dash.captions);
    assert!(!dash.degraded);

    let mut inputs = snap.inputs().to_vec();
    inputs[4] = titler(5, "CAPTIONS", "live words");
    let snap = Snapshot::new(inputs);
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Session);
    assert!(dash.captions);
    assert!(dash.program.is_none());
}

#[test]
fn hms_rounds_to_whole_seconds() {
    assert_eq!(format_hms(0), "0:00:00");
    assert_eq!(format_hms(499), "0:00:00");
    assert_eq!(format_hms(500), "0:00:01");
    assert_eq!(format_hms(3_600_000), "1:00:00");
    assert_eq!(format_hms(u64::MAX), "5124095576030:25:52");
}

#[test]
fn huge_playlist_duration_projects_without_overflow() {
    let snap = Snapshot::from_json_str(
        r#"{
            "active": 1,
            "inputs": [
                {"number": 1, "key": "p", "title": "PLAYOUT", "type": "VideoList",
                 "state": "Running", "position": 1e30, "duration": 1e30}
            ]
        }"#,
    )
    .unwrap();
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &ProjectionConfig::default(), SchedulePhase::Session);
    let playback = dash.program.unwrap().playback.unwrap();
    assert_eq!(playback.duration, "5124095576030:25:52");
    assert_eq!(playback.position, playback.duration);
}

#[test]
fn captions_read_the_configured_field_by_name() {
    let two_fields = |headline: &str, body: &str| {
        Input::new(5u64, "k5", "CAPTIONS", InputKind::Titler).with_attributes(InputAttributes {
            text: vec![
                TextField {
                    name: "Headline.Text".to_owned(),
                    value: headline.to_owned(),
                },
                TextField {
                    name: "Text.Text".to_owned(),
                    value: body.to_owned(),
                },
            ],
            ..InputAttributes::default()
        })
    };

    let snap = Snapshot::new(vec![two_fields("Live captions", "")]);
    let index = SnapshotIndex::build(&snap);
    assert!(!project(&index, &config(), SchedulePhase::Session).captions);

    let snap = Snapshot::new(vec![two_fields("", "words")]);
    let index = SnapshotIndex::build(&snap);
    assert!(project(&index, &config(), SchedulePhase::Session).captions);

    let headline = ProjectionConfig {
        captions_field: "Headline.Text".to_owned(),
        ..config()
    };
    assert!(!project(&index, &headline, SchedulePhase::Session).captions);
}

#[test]
fn duplicate_titles_resolve_to_the_last_declaration() {
    let snap = Snapshot::new(vec![
        Input::new(6u64, "k6", "SLIDES STREAM", InputKind::Mix).with_active(7u64),
        Input::new(7u64, "k7", "SLIDES", InputKind::Video),
        Input::new(8u64, "k8", "SLIDES STREAM", InputKind::Mix).with_active(9u64),
        Input::new(9u64, "k9", "BACKUP SLIDES", InputKind::Video),
    ]);
    let index = SnapshotIndex::build(&snap);
    let dash = project(&index, &config(), SchedulePhase::Session);
    assert!(dash.tracked["slides"].contains("BACKUP SLIDES"));
    assert!(!dash.tracked["slides"].contains("SLIDES"));
}

#[test]
fn topmost_overlays_report_the_top_layer_title() {
    let snap = Snapshot::new(vec![
        Input::new(1u64, "k1", "EXTERNAL", InputKind::Mix)
            .with_overlay(Overlay::full_frame("k2"))
            .with_overlay(Overlay::full_frame("k3")),
        Input::new(2u64, "k2", "REMOTE GUEST", InputKind::Video),
        Input::new(3u64, "k3", "SPEAKER CAM", InputKind::Video),
        Input::new(4u64, "k4", "BARE", InputKind::Video),
        Input::new(5u64, "k5", "DANGLING", InputKind::Video).with_overlay(Overlay::full_frame("gone")),
    ]);
    let index = SnapshotIndex::build(&snap);
    let config = ProjectionConfig {
        topmost_overlay_of: ["EXTERNAL", "BARE", "DANGLING", "ABSENT"]
            .map(str::to_owned)
            .to_vec(),
        ..ProjectionConfig::default()
    };
    let dash = project(&index, &config, SchedulePhase::Session);

    assert_eq!(dash.topmost_overlays.len(), 4);
    assert_eq!(dash.topmost_overlays["EXTERNAL"].as_deref(), Some("SPEAKER CAM"));
    assert_eq!(dash.topmost_overlays["BARE"], None);
    assert_eq!(dash.topmost_overlays["DANGLING"], None);
    assert_eq!(dash.topmost_overlays["ABSENT"], None);
}
