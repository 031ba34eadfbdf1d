use std::{fs, path::PathBuf};

use tempfile::tempdir;

use miette::Diagnostic;

use cumulus::{CloudSnapshot, CumulusError};
use cumulus_cli::{Args, error_adapter::to_reportables, run};

/// Collects all .txt transcripts from a directory
fn collect_transcripts(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn args_for(input: &str, output: &str) -> Args {
    Args {
        input: input.to_string(),
        output: output.to_string(),
        config: None,
        width: Some(800.0),
        height: Some(600.0),
        density: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_sample_transcripts() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    // Transcripts are at workspace root, relative to workspace not the crate
    let transcripts_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("transcripts");
    let transcripts = collect_transcripts(transcripts_path);

    assert!(
        !transcripts.is_empty(),
        "No transcripts found in transcripts/"
    );

    let mut failed = Vec::new();

    for transcript_path in &transcripts {
        let output_filename = format!(
            "{}.json",
            transcript_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        let args = args_for(
            &transcript_path.to_string_lossy(),
            &output_path.to_string_lossy(),
        );

        match run(&args) {
            Ok(()) => {
                let json = fs::read_to_string(&output_path).expect("Output should exist");
                if let Err(e) = CloudSnapshot::from_json(&json) {
                    failed.push((transcript_path.clone(), CumulusError::from(e)));
                }
            }
            Err(e) => failed.push((transcript_path.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nTranscripts that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} transcript(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_snapshot_reflects_transcript() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("input.txt");
    let output = temp_dir.path().join("cloud.json");
    fs::write(&input, "!exclude um\num rust rust cloud\n-cloud\n").unwrap();

    run(&args_for(
        &input.to_string_lossy(),
        &output.to_string_lossy(),
    ))
    .expect("run should succeed");

    let snapshot =
        CloudSnapshot::from_json(&fs::read_to_string(&output).unwrap()).expect("valid JSON");
    assert_eq!(snapshot.layout.width, 800.0);
    assert_eq!(snapshot.layout.height, 600.0);
    assert_eq!(snapshot.words.len(), 1);
    assert_eq!(snapshot.words[0].name, "rust");
    assert_eq!(snapshot.words[0].count, 2);
}

#[test]
fn e2e_invalid_transcript_reports_location() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("broken.txt");
    let output = temp_dir.path().join("broken.json");
    fs::write(&input, "fine words\nrust*many\n").unwrap();

    let err = run(&args_for(
        &input.to_string_lossy(),
        &output.to_string_lossy(),
    ))
    .unwrap_err();

    match err {
        CumulusError::Transcript { err, .. } => {
            assert_eq!(err.line(), 2);
            assert_eq!(err.message(), "expected an integer weight after `*`");
        }
        other => panic!("expected transcript error, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn e2e_missing_input_is_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out.json");

    let err = run(&args_for("/definitely/not/here.txt", &output.to_string_lossy())).unwrap_err();

    assert!(matches!(err, CumulusError::Io(_)));
    let reportables = to_reportables(&err);
    let help = reportables[0].help().map(|help| help.to_string());
    assert!(help.is_some_and(|help| help.contains("existing transcript")));
}
