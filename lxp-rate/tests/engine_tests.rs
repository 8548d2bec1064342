//! Pairing and sequencing engine integration tests
//!
//! Exercises scan → extract → group → order → rate → record on real
//! directories, without the HTTP layer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use lxp_rate::config::DesignConfig;
use lxp_rate::models::{PhaseCursor, RatingScale, Ratings, SequencerState, StimulusFile};
use lxp_rate::services::{
    build_record, extract_key, group, presentation_order, start_session, start_session_at,
    Catalog, ConditionFiles, FixedClock, GroupingMode, KeyPolicy, StimulusScanner,
};
use lxp_rate::sinks::{CsvSink, RecordLayout, ResultSink};

fn write_files(root: &Path, dir: &str, names: &[&str]) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    for name in names {
        fs::write(path.join(name), b"RIFF").unwrap();
    }
}

fn condition(label: &str, names: &[&str]) -> ConditionFiles {
    ConditionFiles {
        label: label.to_string(),
        files: names
            .iter()
            .map(|n| StimulusFile::new(PathBuf::from(format!("/s/{}/{}", label, n)), label))
            .collect(),
    }
}

fn prefix_pairing() -> GroupingMode {
    GroupingMode::Intersection {
        block: "main".to_string(),
    }
}

#[test]
fn test_missing_directory_lists_nothing() {
    let root = tempfile::tempdir().unwrap();
    let scanner = StimulusScanner::new();
    assert!(scanner
        .list_stimuli(&root.path().join("does-not-exist"), "SEQ")
        .is_empty());
}

#[test]
fn test_extraction_is_deterministic() {
    let policy = KeyPolicy::Marker {
        markers: vec!["_SEQ".to_string(), "_SIM".to_string()],
    };
    let first = extract_key("C_dark_SIM_chord.wav", &policy);
    for _ in 0..10 {
        assert_eq!(extract_key("C_dark_SIM_chord.wav", &policy), first);
    }
}

#[test]
fn test_intersection_keeps_common_keys_only() {
    let conditions = [
        condition("SEQ", &["x_a.wav", "y_a.wav", "z_a.wav"]),
        condition("SIM", &["y_b.wav", "z_b.wav", "w_b.wav"]),
    ];
    let grouping = group(&conditions, &KeyPolicy::default(), &prefix_pairing());

    let keys: Vec<&str> = grouping.trials.iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["y", "z"]);
    assert_eq!(grouping.skipped_count(), 2);
    for trial in &grouping.trials {
        assert_eq!(trial.phases[0].label, "SEQ");
        assert_eq!(trial.phases[1].label, "SIM");
    }
}

#[test]
fn test_grouping_ignores_listing_order() {
    let forward = [
        condition("SEQ", &["a_1.wav", "b_1.wav", "c_1.wav"]),
        condition("SIM", &["a_2.wav", "c_2.wav", "d_2.wav"]),
    ];
    let reversed = [
        condition("SEQ", &["c_1.wav", "b_1.wav", "a_1.wav"]),
        condition("SIM", &["d_2.wav", "c_2.wav", "a_2.wav"]),
    ];

    let a = group(&forward, &KeyPolicy::default(), &prefix_pairing());
    let b = group(&reversed, &KeyPolicy::default(), &prefix_pairing());
    assert_eq!(a.trials, b.trials);
    assert_eq!(a.skipped, b.skipped);
}

#[test]
fn test_same_seed_same_order() {
    let conditions = [condition(
        "SEQ",
        &["a_x.wav", "b_x.wav", "c_x.wav", "d_x.wav", "e_x.wav", "f_x.wav"],
    )];
    let trials = group(&conditions, &KeyPolicy::default(), &GroupingMode::Independent).trials;

    let first = presentation_order(trials.clone(), 42);
    let second = presentation_order(trials.clone(), 42);
    assert_eq!(first, second);
    assert_eq!(first.len(), trials.len());
}

#[test]
fn test_unseeded_session_records_reproducible_seed() {
    let conditions = [condition("SEQ", &["a_x.wav", "b_x.wav", "c_x.wav", "d_x.wav"])];
    let trials = group(&conditions, &KeyPolicy::default(), &GroupingMode::Independent).trials;

    let session = start_session("p1", trials.clone(), None);
    let replay = start_session("p1", trials, Some(session.order_seed()));
    assert_eq!(session.trials(), replay.trials());
}

#[test]
fn test_session_terminates_after_every_trial() {
    let conditions = [condition("SEQ", &["a_x.wav", "b_x.wav", "c_x.wav"])];
    let trials = group(&conditions, &KeyPolicy::default(), &GroupingMode::Independent).trials;

    let mut session = start_session("p1", trials, Some(3));
    for _ in 0..3 {
        assert!(matches!(session.state(), SequencerState::Ready(_)));
        session = session.advance();
    }
    assert_eq!(session.state(), SequencerState::Done);
    assert_eq!(session.advance().state(), SequencerState::Done);
    assert_eq!(session.remaining(), 0);
}

#[tokio::test]
async fn test_paired_trial_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    write_files(root.path(), "sequential", &["A_balanced_SEQ_scale.wav"]);
    write_files(root.path(), "simultaneous", &["A_balanced_SIM_prog.wav"]);

    let design = DesignConfig::default();
    let catalog = Catalog::load(&design, root.path(), &StimulusScanner::new()).unwrap();
    assert_eq!(catalog.trial_count(), 1);

    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
    let session = start_session_at("p1", catalog.grouping.trials, Some(9), clock.0);

    let trial = session.current().unwrap();
    assert_eq!(trial.key.as_str(), "A_balanced");
    assert_eq!(trial.phases[0].file.filename, "A_balanced_SEQ_scale.wav");
    assert_eq!(trial.phases[1].file.filename, "A_balanced_SIM_prog.wav");

    let session = session
        .record_play(0)
        .unwrap()
        .submit_rating(Ratings::new(5, 3, 2))
        .unwrap()
        .record_play(1)
        .unwrap()
        .submit_rating(Ratings::new(4, 4, 3))
        .unwrap();
    assert_eq!(session.cursor(), Some(PhaseCursor::Complete));

    let record = build_record(&session, None, &RatingScale::default(), &clock).unwrap();

    let data = tempfile::tempdir().unwrap();
    let sink = CsvSink::new(data.path().join("results.csv"), data.path().join("profiles.csv"));
    let layout = RecordLayout::new(design.phase_slots());
    sink.append_result(&layout, &record).await.unwrap();

    let session = session.advance();
    assert_eq!(session.state(), SequencerState::Done);

    let content = fs::read_to_string(sink.results_path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        "2026-10-16T12:00:00Z,p1,2026-10-16T12:00:00Z,main,A_balanced,0,\
         A_balanced_SEQ_scale.wav,5,3,2,1,A_balanced_SIM_prog.wav,4,4,3,1,"
    );
}
