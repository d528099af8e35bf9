//! Orphan collection through full sync runs

use mirror_core::{OrphanAction, SyncOptions};
use mirror_fs::RelativePath;
use mirror_test_utils::TestProject;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn key(s: &str) -> RelativePath {
    RelativePath::new(s).unwrap()
}

fn synced_project() -> TestProject {
    let project = TestProject::new();
    project.write_source("keep.pdf", "keep");
    project.write_source("nested/gone.pdf", "gone");
    let converter = project.converter();
    project.engine(&converter).run(&SyncOptions::default()).unwrap();
    project
}

#[test]
fn removed_source_deletes_artifact_and_entry() {
    let project = synced_project();
    project.remove_source("nested/gone.pdf");
    let converter = project.converter();

    let result = project.engine(&converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(result.orphans.detected(), 1);
    assert_eq!(result.orphans.removed(), 1);
    assert_eq!(result.orphans.outcomes[0].action, OrphanAction::Removed);
    assert!(!project.artifact_exists("nested/gone.md"));
    assert!(!project.artifact_root().join("nested").exists());
    assert!(project.artifact_exists("keep.md"));

    let manifest = project.manifest();
    assert!(!manifest.contains(&key("nested/gone.pdf")));
    assert!(manifest.contains(&key("keep.pdf")));

    let index = std::fs::read_to_string(project.index_path()).unwrap();
    assert!(!index.contains("nested/gone.md"));
}

#[test]
fn no_clean_preserves_artifact_and_entry() {
    let project = synced_project();
    project.remove_source("nested/gone.pdf");
    let converter = project.converter();

    let result = project
        .engine(&converter)
        .run(&SyncOptions {
            no_clean: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(result.orphans.detected(), 1);
    assert_eq!(result.orphans.skipped(), 1);
    assert_eq!(result.orphans.removed(), 0);
    assert!(project.artifact_exists("nested/gone.md"));
    assert!(project.manifest().contains(&key("nested/gone.pdf")));

    // A later cleaning run still finds it.
    let cleaned = project.engine(&converter).run(&SyncOptions::default()).unwrap();
    assert_eq!(cleaned.orphans.removed(), 1);
    assert!(!project.artifact_exists("nested/gone.md"));
}

#[test]
fn artifact_deleted_by_user_only_prunes_entry() {
    let project = synced_project();
    project.remove_source("nested/gone.pdf");
    std::fs::remove_file(project.artifact_root().join("nested/gone.md")).unwrap();
    let converter = project.converter();

    let result = project.engine(&converter).run(&SyncOptions::default()).unwrap();

    assert_eq!(result.orphans.outcomes[0].action, OrphanAction::EntryPruned);
    assert!(!project.manifest().contains(&key("nested/gone.pdf")));
}

#[rstest]
#[case::cleaning(false)]
#[case::no_clean(true)]
fn untracked_user_files_survive(#[case] no_clean: bool) {
    let project = synced_project();
    project.write_artifact("notes/mine.md", "my own notes");
    project.write_artifact("keep.md.bak", "backup");
    project.write_artifact("nested/extra.txt", "user file next to an orphan");
    project.remove_source("keep.pdf");
    project.remove_source("nested/gone.pdf");
    let converter = project.converter();

    let result = project
        .engine(&converter)
        .run(&SyncOptions {
            no_clean,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(result.orphans.detected(), 2);
    assert_eq!(project.read_artifact("notes/mine.md"), "my own notes");
    assert_eq!(project.read_artifact("keep.md.bak"), "backup");
    assert_eq!(
        project.read_artifact("nested/extra.txt"),
        "user file next to an orphan"
    );

    let index = std::fs::read_to_string(project.index_path()).unwrap();
    assert!(index.contains("\nnotes/mine.md\n"));
    assert!(index.contains("\nnested/extra.txt\n"));
}

#[test]
fn dry_run_reports_orphans_without_removing() {
    let project = synced_project();
    project.remove_source("nested/gone.pdf");
    let converter = project.converter();

    let preview = project
        .engine(&converter)
        .run(&SyncOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(preview.orphans.removed(), 1);
    assert!(project.artifact_exists("nested/gone.md"));
    assert!(project.manifest().contains(&key("nested/gone.pdf")));

    let real = project.engine(&converter).run(&SyncOptions::default()).unwrap();
    assert_eq!(preview.orphans.outcomes, real.orphans.outcomes);
}

#[test]
fn dry_run_after_rename_predicts_kept_artifact() {
    let project = TestProject::new();
    project.write_source("a.pdf", "content");
    let converter = project.converter();
    let engine = project.engine(&converter);
    engine.run(&SyncOptions::default()).unwrap();

    project.remove_source("a.pdf");
    project.write_source("a.docx", "content");

    let preview = engine
        .run(&SyncOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(preview.orphans.outcomes[0].action, OrphanAction::EntryPruned);

    let real = engine.run(&SyncOptions::default()).unwrap();
    assert_eq!(preview.orphans.outcomes, real.orphans.outcomes);
    assert!(project.artifact_exists("a.md"));
}
