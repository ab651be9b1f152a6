//! End-to-end extraction tests.
//!
//! Directory handling, degradation, and progress reporting run against
//! synthesized directories and need no fixtures. Tests that decode real
//! video require `tests/fixtures/sample_video.mp4` (see
//! `tests/fixtures/generate_fixtures.sh`) and return early when it is
//! absent.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use framesift::{FramesiftError, Pass, ProgressCallback, ProgressInfo, RunOptions, RunSummary};

const FIXTURE: &str = "tests/fixtures/sample_video.mp4";

/// Records every callback invocation for later inspection.
#[derive(Default)]
struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Sorted file names written into `dir`.
fn output_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to list output dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Directory handling ─────────────────────────────────────────────

#[test]
fn unsupported_entries_are_counted_and_skipped() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");

    fs::write(input.path().join("notes.txt"), "not a video").unwrap();
    fs::write(input.path().join("clip.MP4"), "uppercase extension").unwrap();
    fs::write(input.path().join("movie.mkv"), "unsupported container").unwrap();
    // Subdirectories are not directory entries the run looks at.
    fs::create_dir(input.path().join("nested")).unwrap();
    fs::write(input.path().join("nested").join("inner.mp4"), "hidden").unwrap();

    let options = RunOptions::new(input.path(), output.path(), 10);
    let summary = framesift::run(&options).expect("run should tolerate unsupported entries");

    assert_eq!(summary.videos_supported, 0);
    assert_eq!(summary.videos_unsupported, 3);
    assert_eq!(summary.videos_unreadable, 0);
    assert_eq!(summary.frames_written, 0);
    assert_eq!(summary.budget_remaining, 10);
    assert!(output_names(output.path()).is_empty());
}

#[test]
fn unreadable_video_degrades_instead_of_failing() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");

    fs::write(input.path().join("clip.mp4"), "these bytes are not an mp4").unwrap();

    let options = RunOptions::new(input.path(), output.path(), 10);
    let summary = framesift::run(&options).expect("run should tolerate unreadable videos");

    assert_eq!(summary.videos_supported, 1);
    assert_eq!(summary.videos_unreadable, 1);
    assert_eq!(summary.eligible_frames, 0);
    assert_eq!(summary.frames_written, 0);
}

#[test]
fn missing_input_dir_is_fatal() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");

    let options = RunOptions::new("/nonexistent/input/dir", output.path(), 10);
    let error = framesift::run(&options).unwrap_err();
    assert!(matches!(error, FramesiftError::Io(_)));
}

#[test]
fn output_dir_is_created_recursively() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output_root = tempfile::tempdir().expect("Failed to create temp dir");
    let output = output_root.path().join("deeply").join("nested").join("frames");

    let options = RunOptions::new(input.path(), &output, 10);
    framesift::run(&options).expect("run should create the output dir");
    assert!(output.is_dir());
}

#[test]
fn empty_input_dir_reports_an_all_zero_summary() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");

    let options = RunOptions::new(input.path(), output.path(), 25);
    let summary = framesift::run(&options).expect("run should handle an empty dir");

    assert_eq!(
        summary,
        RunSummary {
            videos_supported: 0,
            videos_unsupported: 0,
            videos_unreadable: 0,
            eligible_frames: 0,
            sample_every: 0.0,
            frames_written: 0,
            budget_remaining: 25,
        }
    );
}

#[test]
fn zero_budget_writes_nothing() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(input.path().join("clip.mp4"), "garbage").unwrap();

    let options = RunOptions::new(input.path(), output.path(), 0);
    let summary = framesift::run(&options).expect("a zero budget is a no-op, not an error");

    assert_eq!(summary.frames_written, 0);
    assert_eq!(summary.budget_remaining, 0);
    assert!(output_names(output.path()).is_empty());
}

#[test]
fn count_eligible_frames_ignores_garbage() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let garbage = input.path().join("clip.mp4");
    fs::write(&garbage, "not decodable").unwrap();

    assert_eq!(framesift::count_eligible_frames(&[garbage], 0), 0);
}

// ── Progress reporting ─────────────────────────────────────────────

#[test]
fn progress_observes_both_passes() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");

    fs::write(input.path().join("clip.mp4"), "garbage").unwrap();
    fs::write(input.path().join("notes.txt"), "not a video").unwrap();

    let recorder = Arc::new(RecordingProgress::default());
    let options = RunOptions::new(input.path(), output.path(), 10)
        .with_progress(Arc::clone(&recorder) as Arc<dyn ProgressCallback>);
    framesift::run(&options).expect("run should complete");

    let infos = recorder.infos.lock().unwrap();
    assert_eq!(infos.len(), 3, "two counting updates plus one extracting");

    // The counting pass visits every directory entry and carries no budget.
    let counting: Vec<&ProgressInfo> = infos
        .iter()
        .filter(|info| info.pass == Pass::Counting)
        .collect();
    assert_eq!(counting.len(), 2);
    for (index, info) in counting.iter().enumerate() {
        assert_eq!(info.current, index as u64 + 1);
        assert_eq!(info.total, Some(2));
        assert_eq!(info.frames_written, 0);
        assert_eq!(info.budget_remaining, None);
    }

    // The extracting pass visits supported entries only, budget attached.
    let last = infos.last().unwrap();
    assert_eq!(last.pass, Pass::Extracting);
    assert_eq!(last.current, 1);
    assert_eq!(last.total, Some(1));
    assert_eq!(last.budget_remaining, Some(10));

    // Counting strictly precedes extracting.
    let first_extracting = infos
        .iter()
        .position(|info| info.pass == Pass::Extracting)
        .unwrap();
    assert!(infos[..first_extracting]
        .iter()
        .all(|info| info.pass == Pass::Counting));
}

// ── Fixture-backed runs ────────────────────────────────────────────

#[test]
fn budget_and_naming_with_real_video() {
    if !Path::new(FIXTURE).exists() {
        return;
    }

    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    fs::copy(FIXTURE, input.path().join("sample_video.mp4")).unwrap();

    let target = 5;
    let options = RunOptions::new(input.path(), output.path(), target);
    let summary = framesift::run(&options).expect("run should extract from the fixture");

    assert!(summary.frames_written >= 1);
    assert!(summary.frames_written <= target);
    assert_eq!(summary.frames_written + summary.budget_remaining, target);

    let names = output_names(output.path());
    assert_eq!(names.len() as u64, summary.frames_written);
    for name in &names {
        let digits = name
            .strip_prefix("sample_video_")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap_or_else(|| panic!("unexpected output name {name}"));
        assert_eq!(digits.len(), 6, "index must be zero-padded: {name}");
        assert!(digits.bytes().all(|byte| byte.is_ascii_digit()));
    }
}

#[test]
fn repeated_runs_write_identical_names() {
    if !Path::new(FIXTURE).exists() {
        return;
    }

    let input = tempfile::tempdir().expect("Failed to create temp dir");
    fs::copy(FIXTURE, input.path().join("sample_video.mp4")).unwrap();

    let first_out = tempfile::tempdir().expect("Failed to create temp dir");
    let second_out = tempfile::tempdir().expect("Failed to create temp dir");

    let first = framesift::run(&RunOptions::new(input.path(), first_out.path(), 4))
        .expect("first run");
    let second = framesift::run(&RunOptions::new(input.path(), second_out.path(), 4))
        .expect("second run");

    assert_eq!(first, second);
    assert_eq!(output_names(first_out.path()), output_names(second_out.path()));
}

#[test]
fn skip_shrinks_the_eligible_pool() {
    if !Path::new(FIXTURE).exists() {
        return;
    }

    let input = tempfile::tempdir().expect("Failed to create temp dir");
    fs::copy(FIXTURE, input.path().join("sample_video.mp4")).unwrap();
    let entries = vec![input.path().join("sample_video.mp4")];

    let unskipped = framesift::count_eligible_frames(&entries, 0);
    assert!(unskipped > 0, "fixture should have countable frames");

    let skipped = framesift::count_eligible_frames(&entries, 2);
    assert_eq!(skipped, unskipped - 2);

    // A skip past the end leaves nothing eligible rather than underflowing.
    assert_eq!(framesift::count_eligible_frames(&entries, u64::MAX), 0);
}
