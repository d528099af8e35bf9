//! Source discovery and index scanning against real directory trees

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use mirror_core::{IndexBuilder, discover};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, rel).unwrap();
}

fn exts(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|e| e.to_string()).collect()
}

fn keys(root: &Path, allowed: &BTreeSet<String>) -> Vec<String> {
    discover(root, allowed, &[])
        .unwrap()
        .iter()
        .map(|s| s.key().to_string())
        .collect()
}

#[test]
fn discovery_is_sorted_and_recursive() {
    let dir = TempDir::new().unwrap();
    for rel in ["z.pdf", "b/y.pdf", "a.pdf", "b/a/x.pdf", "B.pdf"] {
        touch(dir.path(), rel);
    }

    assert_eq!(
        keys(dir.path(), &exts(&["pdf"])),
        vec!["B.pdf", "a.pdf", "b/a/x.pdf", "b/y.pdf", "z.pdf"]
    );
}

#[rstest]
#[case::hidden_file(".secret.pdf")]
#[case::hidden_dir(".cache/a.pdf")]
#[case::nested_hidden_dir("docs/.git/objects/a.pdf")]
#[case::unsupported_extension("notes.xyz")]
#[case::no_extension("Makefile")]
fn ignored_entries(#[case] rel: &str) {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), rel);
    touch(dir.path(), "visible.pdf");

    assert_eq!(keys(dir.path(), &exts(&["pdf"])), vec!["visible.pdf"]);
}

#[test]
fn extension_match_ignores_case() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "Report.PDF");
    touch(dir.path(), "slides.PpTx");

    assert_eq!(
        keys(dir.path(), &exts(&["pdf", "pptx"])),
        vec!["Report.PDF", "slides.PpTx"]
    );
}

#[test]
fn empty_tree_discovers_nothing() {
    let dir = TempDir::new().unwrap();
    assert!(keys(dir.path(), &exts(&["pdf"])).is_empty());
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_sources() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    touch(outside.path(), "real.pdf");
    std::os::unix::fs::symlink(outside.path().join("real.pdf"), dir.path().join("link.pdf"))
        .unwrap();

    assert_eq!(keys(dir.path(), &exts(&["pdf"])), vec!["link.pdf"]);
}

#[test]
fn index_lists_text_files_case_insensitively() {
    let dir = TempDir::new().unwrap();
    for rel in ["b.md", "A.md", "a.txt", "img/logo.png", ".hidden.md", "_index.txt", "sub/Z.csv"] {
        touch(dir.path(), rel);
    }
    let text = exts(&["md", "txt", "csv"]);
    let builder = IndexBuilder::new(dir.path(), &text, "_index.txt", "demo");

    let listing: Vec<String> = builder.scan().unwrap().iter().map(|k| k.to_string()).collect();
    assert_eq!(listing, vec!["A.md", "a.txt", "b.md", "sub/Z.csv"]);
}

#[test]
fn index_rewritten_only_when_listing_changes() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.md");
    let text = exts(&["md"]);
    let builder = IndexBuilder::new(dir.path(), &text, "_index.txt", "demo");
    let first_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    let (_, written) = builder.write(first_at).unwrap();
    assert!(written);
    let content = fs::read_to_string(dir.path().join("_index.txt")).unwrap();
    assert!(content.contains("# Generated: 2024-01-01T00:00:00Z\n"));

    let (_, written) = builder.write(later).unwrap();
    assert!(!written);
    assert_eq!(fs::read_to_string(dir.path().join("_index.txt")).unwrap(), content);

    touch(dir.path(), "b.md");
    let (index, written) = builder.write(later).unwrap();
    assert!(written);
    assert_eq!(index.files.len(), 2);
    assert!(
        fs::read_to_string(dir.path().join("_index.txt"))
            .unwrap()
            .ends_with("\na.md\nb.md\n")
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn discovery_order_is_sorted_and_stable(names in prop::collection::btree_set("[a-z]{1,6}", 1..12)) {
        let dir = TempDir::new().unwrap();
        for name in &names {
            touch(dir.path(), &format!("{name}.pdf"));
        }
        let allowed = exts(&["pdf"]);

        let first = keys(dir.path(), &allowed);
        let second = keys(dir.path(), &allowed);
        let expected: Vec<String> = names.iter().map(|n| format!("{n}.pdf")).collect();

        prop_assert_eq!(&first, &expected);
        prop_assert_eq!(first, second);
    }
}
