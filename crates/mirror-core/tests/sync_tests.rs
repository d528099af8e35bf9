//! End-to-end tests for the sync engine

use chrono::Utc;
use mirror_core::{
    Classification, EntryStatus, Error, ErrorMode, FileStatus, ManifestEntry, ManifestStore,
    SyncOptions, SyncPhase,
};
use mirror_fs::{RelativePath, compute_content_checksum};
use mirror_test_utils::TestProject;
use pretty_assertions::assert_eq;

fn key(s: &str) -> RelativePath {
    RelativePath::new(s).unwrap()
}

fn three_sources() -> TestProject {
    let project = TestProject::new();
    project.write_source("a.pdf", "alpha");
    project.write_source("b.pdf", "bravo");
    project.write_source("c.pdf", "charlie");
    project
}

#[test]
fn first_run_converts_everything_and_writes_index() {
    let project = TestProject::new();
    project.write_source("a.pdf", "alpha");
    project.write_source("docs/b.docx", "bravo");
    let converter = project.converter();

    let result = project.engine(&converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(result.phase, SyncPhase::Done);
    assert_eq!(result.new_count(), 2);
    assert_eq!(result.failed_count(), 0);
    assert_eq!(converter.calls(), vec!["a.pdf", "docs/b.docx"]);
    assert_eq!(project.read_artifact("a.md"), "converted:alpha");
    assert_eq!(project.read_artifact("docs/b.md"), "converted:bravo");

    let manifest = project.manifest();
    assert_eq!(manifest.len(), 2);
    let entry = manifest.get(&key("docs/b.docx")).unwrap();
    assert_eq!(entry.status, EntryStatus::Success);
    assert_eq!(entry.output.as_str(), "docs/b.md");
    assert_eq!(entry.fingerprint, compute_content_checksum(b"bravo"));
    assert!(manifest.last_sync_at.is_some());

    let index = std::fs::read_to_string(project.index_path()).unwrap();
    assert!(index.starts_with("# test-project index\n"));
    assert!(index.contains("# Files: 2\n"));
    assert!(index.ends_with("\na.md\ndocs/b.md\n"));
}

#[test]
fn second_run_without_changes_is_idempotent() {
    let project = three_sources();
    let converter = project.converter();
    let engine = project.engine(&converter);

    engine.run(&SyncOptions::default()).unwrap();
    let index_before = std::fs::read(project.index_path()).unwrap();
    let calls_before = converter.calls().len();

    let second = engine.run(&SyncOptions::default()).unwrap();

    assert_eq!(second.new_count(), 0);
    assert_eq!(second.modified_count(), 0);
    assert_eq!(second.unchanged_count(), 3);
    assert_eq!(second.orphans.detected(), 0);
    assert!(!second.index_written);
    assert_eq!(converter.calls().len(), calls_before);
    assert_eq!(std::fs::read(project.index_path()).unwrap(), index_before);
}

#[test]
fn classification_example_new_modified_unchanged() {
    let project = TestProject::new();
    project.write_source("new.pdf", "brand new");
    project.write_source("changed.pdf", "def");
    project.write_source("same.pdf", "111");
    project.write_artifact("same.md", "converted:111");

    let store = ManifestStore::new(project.manifest_path());
    let mut manifest = store.load().unwrap();
    let earlier = Utc::now() - chrono::Duration::days(1);
    manifest.insert(
        key("changed.pdf"),
        ManifestEntry::success("abc".into(), key("changed.md"), earlier),
    );
    let same_entry = ManifestEntry::success(compute_content_checksum(b"111"), key("same.md"), earlier);
    manifest.insert(key("same.pdf"), same_entry.clone());
    store.commit(&manifest).unwrap();

    let converter = project.converter();
    let result = project.engine(&converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(result.new_count(), 1);
    assert_eq!(result.modified_count(), 1);
    assert_eq!(result.unchanged_count(), 1);
    assert_eq!(converter.calls(), vec!["changed.pdf", "new.pdf"]);

    let after = project.manifest();
    assert_eq!(
        after.get(&key("changed.pdf")).unwrap().fingerprint,
        compute_content_checksum(b"def")
    );
    assert_eq!(
        after.get(&key("new.pdf")).unwrap().fingerprint,
        compute_content_checksum(b"brand new")
    );
    assert_eq!(after.get(&key("same.pdf")), Some(&same_entry));
}

#[test]
fn modified_source_is_reprocessed() {
    let project = three_sources();
    let converter = project.converter();
    let engine = project.engine(&converter);
    engine.run(&SyncOptions::default()).unwrap();

    project.write_source("b.pdf", "bravo v2");
    let result = engine.run(&SyncOptions::default()).unwrap();

    assert_eq!(result.modified_count(), 1);
    assert_eq!(result.outcome("b.pdf").unwrap().classification, Classification::Modified);
    assert_eq!(project.read_artifact("b.md"), "converted:bravo v2");
    assert_eq!(converter.calls().iter().filter(|k| *k == "b.pdf").count(), 2);
}

#[test]
fn force_reprocesses_matching_fingerprints() {
    let project = three_sources();
    let converter = project.converter();
    let engine = project.engine(&converter);
    engine.run(&SyncOptions::default()).unwrap();

    let result = engine
        .run(&SyncOptions {
            force: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(result.modified_count(), 3);
    assert_eq!(result.unchanged_count(), 0);
    assert_eq!(converter.calls().len(), 6);
}

#[test]
fn fail_fast_aborts_and_leaves_manifest_untouched() {
    let project = three_sources();
    let before = project.manifest_bytes();
    let converter = project.converter().failing_on(&["b.pdf"]);

    let err = project
        .engine(&converter)
        .run(&SyncOptions {
            on_error: Some(ErrorMode::Fail),
            ..Default::default()
        })
        .unwrap_err();

    match err {
        Error::ProcessingAborted { key, message } => {
            assert_eq!(key.as_str(), "b.pdf");
            assert!(message.contains("scripted failure"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(converter.calls(), vec!["a.pdf", "b.pdf"]);
    assert_eq!(project.manifest_bytes(), before);
    assert!(!project.index_path().exists());
}

#[test]
fn skip_mode_records_failure_and_commits_the_rest() {
    let project = three_sources();
    let converter = project.converter().failing_on(&["b.pdf"]);

    let result = project
        .engine(&converter)
        .run(&SyncOptions {
            on_error: Some(ErrorMode::Skip),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(converter.calls(), vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(result.failed_count(), 1);
    assert!(matches!(
        &result.outcome("b.pdf").unwrap().status,
        FileStatus::Failed { error } if error.contains("scripted failure")
    ));

    let manifest = project.manifest();
    assert_eq!(manifest.get(&key("a.pdf")).unwrap().status, EntryStatus::Success);
    assert_eq!(manifest.get(&key("c.pdf")).unwrap().status, EntryStatus::Success);
    let failed = manifest.get(&key("b.pdf")).unwrap();
    assert_eq!(failed.status, EntryStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("scripted failure"));
}

#[test]
fn configured_error_mode_applies_without_override() {
    let project = TestProject::with_config(|c| c.on_error = ErrorMode::Fail);
    project.write_source("a.pdf", "alpha");
    let converter = project.converter().failing_on(&["a.pdf"]);

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();
    assert!(matches!(err, Error::ProcessingAborted { .. }));
}

#[test]
fn dry_run_changes_nothing_and_predicts_counts() {
    let project = three_sources();
    let converter = project.converter();
    let engine = project.engine(&converter);
    engine.run(&SyncOptions::default()).unwrap();

    project.write_source("b.pdf", "bravo v2");
    project.write_source("d.pdf", "delta");
    project.remove_source("c.pdf");

    let manifest_before = project.manifest_bytes();
    let tree_before = project.artifact_tree();
    let calls_before = converter.calls().len();

    let preview = engine
        .run(&SyncOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(preview.phase, SyncPhase::Previewing);
    assert!(preview.dry_run);
    assert_eq!(project.manifest_bytes(), manifest_before);
    assert_eq!(project.artifact_tree(), tree_before);
    assert_eq!(converter.calls().len(), calls_before);
    assert_eq!(preview.outcome("d.pdf").unwrap().status, FileStatus::Pending);

    let real = engine.run(&SyncOptions::default()).unwrap();
    assert_eq!(preview.new_count(), real.new_count());
    assert_eq!(preview.modified_count(), real.modified_count());
    assert_eq!(preview.unchanged_count(), real.unchanged_count());
    assert_eq!(preview.orphans.removed(), real.orphans.removed());
    assert_eq!(real.new_count(), 1);
    assert_eq!(real.modified_count(), 1);
    assert_eq!(real.orphans.removed(), 1);
}

#[test]
fn corrupt_manifest_is_fatal_and_untouched() {
    let project = three_sources();
    std::fs::write(project.manifest_path(), "{ not json").unwrap();
    let converter = project.converter();

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();

    assert!(matches!(err, Error::ManifestCorrupt { .. }));
    assert!(err.to_string().contains("mirror init --force"));
    assert_eq!(std::fs::read_to_string(project.manifest_path()).unwrap(), "{ not json");
    assert!(converter.calls().is_empty());
    assert!(project.artifact_tree().is_empty());
}

#[test]
fn manifest_schema_violation_is_corrupt() {
    let project = three_sources();
    std::fs::write(
        project.manifest_path(),
        r#"{"project_name":"p","last_sync_at":null,"files":{"a.pdf":{"processed_at":"2024-01-01T00:00:00Z","output":"a.md","status":"success","error":null}}}"#,
    )
    .unwrap();
    let converter = project.converter();

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();
    match err {
        Error::ManifestCorrupt { reason, .. } => assert!(reason.contains("fingerprint")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_manifest_during_sync_is_fatal() {
    let project = three_sources();
    std::fs::remove_file(project.manifest_path()).unwrap();
    let converter = project.converter();

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();

    assert!(matches!(err, Error::ManifestMissing { .. }));
    assert!(converter.calls().is_empty());
}

#[test]
fn missing_source_directory_is_fatal() {
    let project = TestProject::new();
    std::fs::remove_dir_all(project.source_root()).unwrap();
    let before = project.manifest_bytes();
    let converter = project.converter();

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();

    assert!(matches!(err, Error::SourceUnreadable { .. }));
    assert_eq!(project.manifest_bytes(), before);
}

#[test]
fn unwritable_artifact_root_is_fatal() {
    let project = three_sources();
    std::fs::remove_dir_all(project.artifact_root()).unwrap();
    std::fs::write(project.artifact_root(), "not a directory").unwrap();
    let before = project.manifest_bytes();
    let converter = project.converter();

    let err = project.engine(&converter).run(&SyncOptions::default()).unwrap_err();

    assert!(matches!(err, Error::ArtifactDirectory { .. }));
    assert!(converter.calls().is_empty());
    assert_eq!(project.manifest_bytes(), before);
}

#[test]
fn output_collision_fails_the_later_source() {
    let project = TestProject::new();
    project.write_source("a.docx", "from docx");
    project.write_source("a.pdf", "from pdf");
    let converter = project.converter();

    let result = project.engine(&converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(converter.calls(), vec!["a.docx"]);
    assert_eq!(project.read_artifact("a.md"), "converted:from docx");
    assert!(matches!(
        &result.outcome("a.pdf").unwrap().status,
        FileStatus::Failed { error } if error.contains("already produced from a.docx")
    ));
}

#[test]
fn untracked_file_at_output_path_is_not_overwritten() {
    let project = TestProject::new();
    project.write_artifact("notes.md", "hand written");
    project.write_source("notes.pdf", "scanned notes");
    let converter = project.converter();
    let engine = project.engine(&converter);

    let result = engine.run(&SyncOptions::default()).unwrap();

    assert!(converter.calls().is_empty());
    assert_eq!(project.read_artifact("notes.md"), "hand written");
    assert!(matches!(
        &result.outcome("notes.pdf").unwrap().status,
        FileStatus::Failed { error } if error.contains("not tracked")
    ));
    assert_eq!(
        project.manifest().get(&key("notes.pdf")).unwrap().status,
        EntryStatus::Failed
    );

    let forced = engine
        .run(&SyncOptions {
            force: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(forced.failed_count(), 0);
    assert_eq!(project.read_artifact("notes.md"), "converted:scanned notes");
}

#[test]
fn renamed_source_keeps_shared_artifact() {
    let project = TestProject::new();
    project.write_source("a.pdf", "content");
    let converter = project.converter();
    let engine = project.engine(&converter);
    engine.run(&SyncOptions::default()).unwrap();

    project.remove_source("a.pdf");
    project.write_source("a.docx", "content");
    let result = engine.run(&SyncOptions::default()).unwrap();

    assert_eq!(result.new_count(), 1);
    assert_eq!(result.orphans.removed(), 1);
    assert!(project.artifact_exists("a.md"));
    let manifest = project.manifest();
    assert!(manifest.get(&key("a.pdf")).is_none());
    assert!(manifest.get(&key("a.docx")).is_some());
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let sequential = TestProject::new();
    let parallel = TestProject::with_config(|c| c.jobs = 4);
    for i in 0..24 {
        let content = format!("document {i}");
        sequential.write_source(&format!("dir{}/doc{:02}.pdf", i % 3, i), &content);
        parallel.write_source(&format!("dir{}/doc{:02}.pdf", i % 3, i), &content);
    }
    let failing = ["dir1/doc07.pdf", "dir2/doc20.pdf"];

    let seq_converter = sequential.converter().failing_on(&failing);
    let par_converter = parallel.converter().failing_on(&failing);
    let seq = sequential.engine(&seq_converter).run(&SyncOptions::default()).unwrap();
    let par = parallel.engine(&par_converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(seq.files, par.files);
    assert_eq!(par.failed_count(), 2);

    let strip = |p: &TestProject| -> Vec<(String, String, String, EntryStatus)> {
        p.manifest()
            .entries()
            .map(|(k, e)| {
                (
                    k.to_string(),
                    e.fingerprint.clone(),
                    e.output.to_string(),
                    e.status,
                )
            })
            .collect()
    };
    assert_eq!(strip(&sequential), strip(&parallel));
    assert_eq!(
        std::fs::read_to_string(sequential.index_path())
            .unwrap()
            .split_once("\n\n")
            .unwrap()
            .1,
        std::fs::read_to_string(parallel.index_path())
            .unwrap()
            .split_once("\n\n")
            .unwrap()
            .1
    );
}

#[test]
fn failed_entry_with_same_content_is_not_retried_without_force() {
    let project = TestProject::new();
    project.write_source("a.pdf", "alpha");
    let failing = project.converter().failing_on(&["a.pdf"]);
    project.engine(&failing).run(&SyncOptions::default()).unwrap();

    let healthy = project.converter();
    let engine = project.engine(&healthy);
    let second = engine.run(&SyncOptions::default()).unwrap();
    assert_eq!(second.unchanged_count(), 1);
    assert!(healthy.calls().is_empty());

    let forced = engine
        .run(&SyncOptions {
            force: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(forced.failed_count(), 0);
    assert_eq!(
        project.manifest().get(&key("a.pdf")).unwrap().status,
        EntryStatus::Success
    );
}
