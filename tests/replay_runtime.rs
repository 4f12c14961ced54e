//! End-to-end test: a recording played through the update loop.

use heartlive::{DisplayState, HeartRateModel, Intent, ReplaySensor, Runtime, SessionState};
use std::time::Duration;

fn wait_for(
    updates: &crossbeam_channel::Receiver<DisplayState>,
    pred: impl Fn(&DisplayState) -> bool,
) -> DisplayState {
    loop {
        let state = updates
            .recv_timeout(Duration::from_secs(5))
            .expect("timed out waiting for display update");
        if pred(&state) {
            return state;
        }
    }
}

#[test]
fn test_recording_plays_through_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recording.txt");
    std::fs::write(&path, "# warmup\n61.2\n62.5\n-\n64\n").unwrap();

    let sensor = ReplaySensor::new(&path, Duration::from_millis(5));
    let runtime = Runtime::spawn(HeartRateModel::new(sensor, 24));
    let updates = runtime.subscribe().unwrap();

    runtime.send(Intent::RequestAuth).unwrap();
    wait_for(&updates, |s| s.authorized);

    runtime.send(Intent::Start).unwrap();
    let state = wait_for(&updates, |s| s.recent_bpm.len() == 3);
    assert_eq!(state.recent_bpm, vec![61, 63, 64]);
    assert_eq!(state.bpm_text, "64");

    runtime.send(Intent::End).unwrap();
    let state = wait_for(&updates, |s| s.session == SessionState::Ended);
    assert_eq!(state.status, "Ended");
    assert_eq!(state.recent_bpm, vec![61, 63, 64]);

    runtime.shutdown().unwrap();
}

#[test]
fn test_missing_recording_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let sensor = ReplaySensor::new(dir.path().join("absent.txt"), Duration::from_millis(5));
    let runtime = Runtime::spawn(HeartRateModel::new(sensor, 24));
    let updates = runtime.subscribe().unwrap();

    runtime.send(Intent::RequestAuth).unwrap();
    let state = wait_for(&updates, |s| s.status == "Heart rate unavailable");
    assert!(!state.authorized);

    runtime.send(Intent::Start).unwrap();
    let state = wait_for(&updates, |s| s.status == "Not authorized");
    assert_eq!(state.session, SessionState::NotStarted);

    runtime.shutdown().unwrap();
}

#[test]
fn test_pause_keeps_queued_replay_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recording.txt");
    std::fs::write(&path, "70\n71\n72\n").unwrap();

    let sensor = ReplaySensor::manual(&path);
    let handle = sensor.handle();
    let mut model = HeartRateModel::new(sensor, 24);

    model.request_auth();
    let events = model.events();
    while !model.is_authorized() {
        let event = events
            .recv_timeout(Duration::from_secs(5))
            .expect("authorization outcome");
        model.ingest(event);
    }

    model.start();
    assert!(handle.tick());

    model.pause();
    assert_eq!(model.display().recent_bpm, vec![70, 71]);
    assert_eq!(model.stats().snapshot().readings_dropped, 0);
}
