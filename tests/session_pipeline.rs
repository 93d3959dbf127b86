use chrono::{DateTime, Local, TimeZone};
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use photosort::common::SESSION_ID_FORMAT;
use photosort::config::{AppConfig, ErrorPolicy};
use photosort::pipeline::controller::{self, SessionOutcome};
use photosort::pipeline::types::SessionTrigger;
use photosort::state::ProcessorState;

fn config_for(watch: &Path) -> AppConfig {
    AppConfig {
        watch_folder: watch.to_path_buf(),
        ..AppConfig::default()
    }
}

fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 14, hour, min, sec).unwrap()
}

/// Plain bytes with an image extension: EXIF parsing fails, so the resolver
/// falls back to the mtime set here.
fn write_photo(dir: &Path, name: &str, taken_at: DateTime<Local>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(taken_at.timestamp(), 0)).unwrap();
    path
}

fn trigger_for(marker: &Path, taken_at: DateTime<Local>, subject: &str) -> SessionTrigger {
    SessionTrigger {
        subject_id: subject.to_string(),
        marker_path: marker.to_path_buf(),
        taken_at,
    }
}

#[test]
fn organizes_windowed_candidates_into_sequenced_layout() {
    let tmp = TempDir::new().unwrap();
    let a = write_photo(tmp.path(), "a.jpg", at(10, 0, 0));
    let b = write_photo(tmp.path(), "b.jpg", at(10, 0, 5));
    let marker = write_photo(tmp.path(), "marker.jpg", at(10, 0, 10));

    let state = ProcessorState::new(config_for(tmp.path()));
    let outcome = controller::run(&state, &trigger_for(&marker, at(10, 0, 10), "42"));
    assert_eq!(outcome, SessionOutcome::Organized { moved: 3 });
    assert!(!state.is_halted());

    let session_id = at(10, 0, 10).format(SESSION_ID_FORMAT).to_string();
    assert!(session_id.ends_with("_100010"));

    let dest = tmp
        .path()
        .join("42")
        .join(at(10, 0, 10).format("%Y.%m.%d").to_string());
    assert_eq!(fs::read(dest.join("001.jpg")).unwrap(), b"a.jpg");
    assert_eq!(fs::read(dest.join("002.jpg")).unwrap(), b"b.jpg");
    assert_eq!(fs::read(dest.join("QR_42.jpg")).unwrap(), b"marker.jpg");
    assert!(!a.exists());
    assert!(!b.exists());
    assert!(!marker.exists());

    let backup = tmp.path().join("_backup").join(&session_id);
    assert_eq!(fs::read(backup.join("a.jpg")).unwrap(), b"a.jpg");
    assert_eq!(fs::read(backup.join("b.jpg")).unwrap(), b"b.jpg");
    assert_eq!(fs::read(backup.join("QR_42.jpg")).unwrap(), b"marker.jpg");

    let record_path = tmp
        .path()
        .join("_done")
        .join(format!("done_{session_id}_42.txt"));
    let record = fs::read_to_string(record_path).unwrap();
    assert!(record.contains("subject: 42"));
    assert!(record.contains("photos moved: 3"));
}

#[test]
fn candidates_land_in_capture_order_not_name_order() {
    let tmp = TempDir::new().unwrap();
    write_photo(tmp.path(), "z.jpg", at(9, 30, 0));
    write_photo(tmp.path(), "m.jpg", at(9, 45, 0));
    write_photo(tmp.path(), "a.jpg", at(9, 55, 0));
    let marker = write_photo(tmp.path(), "marker.jpg", at(10, 0, 0));

    let state = ProcessorState::new(config_for(tmp.path()));
    let outcome = controller::run(&state, &trigger_for(&marker, at(10, 0, 0), "7"));
    assert_eq!(outcome, SessionOutcome::Organized { moved: 4 });

    let dest = tmp
        .path()
        .join("7")
        .join(at(10, 0, 0).format("%Y.%m.%d").to_string());
    assert_eq!(fs::read(dest.join("001.jpg")).unwrap(), b"z.jpg");
    assert_eq!(fs::read(dest.join("002.jpg")).unwrap(), b"m.jpg");
    assert_eq!(fs::read(dest.join("003.jpg")).unwrap(), b"a.jpg");
    assert!(!dest.join("004.jpg").exists());
}

#[test]
fn marker_only_session_moves_just_the_marker() {
    let tmp = TempDir::new().unwrap();
    let marker = write_photo(tmp.path(), "marker.jpg", at(12, 0, 0));

    let state = ProcessorState::new(config_for(tmp.path()));
    let outcome = controller::run(&state, &trigger_for(&marker, at(12, 0, 0), "9"));
    assert_eq!(outcome, SessionOutcome::Organized { moved: 1 });

    let dest = tmp
        .path()
        .join("9")
        .join(at(12, 0, 0).format("%Y.%m.%d").to_string());
    assert!(dest.join("QR_9.jpg").is_file());
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
}

#[test]
fn too_many_photos_aborts_without_touching_files() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig {
        max_photos_per_session: 2,
        ..config_for(tmp.path())
    };
    let files: Vec<_> = (0..3u32)
        .map(|i| write_photo(tmp.path(), &format!("p{i}.jpg"), at(10, 0, i)))
        .collect();
    let marker = write_photo(tmp.path(), "marker.jpg", at(10, 0, 30));

    let state = ProcessorState::new(config);
    let outcome = controller::run(&state, &trigger_for(&marker, at(10, 0, 30), "42"));
    assert_eq!(outcome, SessionOutcome::Aborted);
    assert!(state.is_halted());

    for file in &files {
        assert!(file.exists());
    }
    assert!(marker.exists());
    let session_id = at(10, 0, 30).format(SESSION_ID_FORMAT).to_string();
    assert!(!tmp.path().join("_backup").join(&session_id).exists());
    assert!(!tmp.path().join("42").exists());

    let record_path = tmp
        .path()
        .join("_error")
        .join(format!("error_{session_id}.txt"));
    let record = fs::read_to_string(record_path).unwrap();
    assert!(record.contains("too many photos"));
}

#[test]
fn continue_policy_keeps_accepting_triggers_after_a_failure() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig {
        max_photos_per_session: 1,
        error_policy: ErrorPolicy::Continue,
        ..config_for(tmp.path())
    };
    write_photo(tmp.path(), "p0.jpg", at(10, 0, 0));
    write_photo(tmp.path(), "p1.jpg", at(10, 0, 1));
    let marker = write_photo(tmp.path(), "marker.jpg", at(10, 0, 30));

    let state = ProcessorState::new(config);
    let outcome = controller::run(&state, &trigger_for(&marker, at(10, 0, 30), "42"));
    assert_eq!(outcome, SessionOutcome::Aborted);
    assert!(!state.is_halted());
}

#[test]
fn duplicate_session_id_is_rejected_before_any_mutation() {
    let tmp = TempDir::new().unwrap();
    let session_id = at(10, 0, 10).format(SESSION_ID_FORMAT).to_string();
    fs::create_dir_all(tmp.path().join("_backup").join(&session_id)).unwrap();

    let photo = write_photo(tmp.path(), "a.jpg", at(10, 0, 0));
    let marker = write_photo(tmp.path(), "marker.jpg", at(10, 0, 10));

    let state = ProcessorState::new(config_for(tmp.path()));
    let outcome = controller::run(&state, &trigger_for(&marker, at(10, 0, 10), "42"));
    assert_eq!(outcome, SessionOutcome::Aborted);

    assert!(photo.exists());
    assert!(marker.exists());
    assert!(!tmp.path().join("42").exists());
    assert!(
        tmp.path()
            .join("_error")
            .join(format!("error_{session_id}.txt"))
            .is_file()
    );
}
