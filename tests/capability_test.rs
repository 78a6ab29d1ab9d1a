//! Capability predicate tests.

mod common;

use cadre_rs::capability::{Capability, TaskField};
use cadre_rs::model::TaskStatus;
use common::task;

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[test]
fn assignment_matches_case_insensitively() {
    let cap = Capability::Assignment;
    let t = task("t1", "Do a thing", TaskStatus::ToDo, Some("  alice  "));

    assert!(cap.matches(&t, "Alice"));
    assert!(cap.matches(&t, "ALICE"));
    assert!(!cap.matches(&t, "Bob"));
}

#[test]
fn assignment_requires_non_empty_field() {
    let cap = Capability::Assignment;

    let unassigned = task("t1", "Do a thing", TaskStatus::ToDo, None);
    assert!(!cap.matches(&unassigned, "Alice"));

    let blank = task("t1", "Do a thing", TaskStatus::ToDo, Some("   "));
    assert!(!cap.matches(&blank, "Alice"));
}

// ---------------------------------------------------------------------------
// Keyword
// ---------------------------------------------------------------------------

#[test]
fn keyword_searches_default_fields() {
    let cap = Capability::keyword(["SPEC"]);

    let in_title = task("t1", "Write spec for X", TaskStatus::ToDo, None);
    assert!(cap.matches(&in_title, "Alice"));

    let mut in_content = task("t1", "Something", TaskStatus::ToDo, None);
    in_content.content = "needs a SPECIFICATION".to_string();
    assert!(cap.matches(&in_content, "Alice"));

    let elsewhere = task("t1", "Fix a bug", TaskStatus::ToDo, None);
    assert!(!cap.matches(&elsewhere, "Alice"));
}

#[test]
fn keyword_respects_field_restriction() {
    let cap = Capability::keyword_in(["spec"], vec![TaskField::Description]);

    let mut t = task("t1", "Write spec for X", TaskStatus::ToDo, None);
    assert!(!cap.matches(&t, "Alice"), "title is not searched");

    t.description = "the spec lives here".to_string();
    assert!(cap.matches(&t, "Alice"));
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[test]
fn status_discards_unparseable_entries() {
    let cap = Capability::status(["To Do", "Blocked", "nonsense"]);

    assert!(cap.matches(&task("t1", "x", TaskStatus::ToDo, None), "Alice"));
    assert!(!cap.matches(&task("t1", "x", TaskStatus::Done, None), "Alice"));
}

#[test]
fn status_with_only_bad_entries_matches_nothing() {
    let cap = Capability::status(["Blocked", "???"]);
    assert!(!cap.matches(&task("t1", "x", TaskStatus::ToDo, None), "Alice"));
}

// ---------------------------------------------------------------------------
// Content length
// ---------------------------------------------------------------------------

#[test]
fn content_length_counts_combined_fields() {
    let cap = Capability::content_length(20);

    let short = task("t1", "tiny", TaskStatus::ToDo, None);
    assert!(!cap.matches(&short, "Alice"));

    let mut long = task("t1", "tiny", TaskStatus::ToDo, None);
    long.description = "but the description is plenty long".to_string();
    assert!(cap.matches(&long, "Alice"));
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

#[test]
fn empty_composites_never_match() {
    let t = task("t1", "anything at all", TaskStatus::ToDo, Some("Alice"));

    assert!(!Capability::all_of(vec![]).matches(&t, "Alice"));
    assert!(!Capability::any_of(vec![]).matches(&t, "Alice"));
}

#[test]
fn composite_and_requires_all() {
    let cap = Capability::all_of(vec![
        Capability::Assignment,
        Capability::keyword(["spec"]),
    ]);

    let both = task("t1", "Write spec for X", TaskStatus::ToDo, Some("Alice"));
    assert!(cap.matches(&both, "Alice"));

    let keyword_only = task("t1", "Write spec for X", TaskStatus::ToDo, None);
    assert!(!cap.matches(&keyword_only, "Alice"));
}

#[test]
fn composite_or_requires_any() {
    let cap = Capability::any_of(vec![
        Capability::keyword(["spec"]),
        Capability::keyword(["research"]),
    ]);

    assert!(cap.matches(&task("t1", "research time", TaskStatus::ToDo, None), "A"));
    assert!(!cap.matches(&task("t1", "fix bug", TaskStatus::ToDo, None), "A"));
}

#[test]
fn composite_operator_is_validated_at_construction() {
    assert!(Capability::composite(vec![Capability::Assignment], "AND").is_ok());
    assert!(Capability::composite(vec![Capability::Assignment], "or").is_ok());
    assert!(Capability::composite(vec![Capability::Assignment], "XOR").is_err());
}

// ---------------------------------------------------------------------------
// Failure diagnostics
// ---------------------------------------------------------------------------

#[test]
fn describe_failure_names_missing_keywords() {
    let cap = Capability::keyword(["spec", "design"]);
    let t = task("t1", "Write spec for X", TaskStatus::ToDo, None);

    let detail = cap.describe_failure(&t, "Alice");
    assert!(detail.contains("design"));
    assert!(detail.contains("spec"), "found keywords are listed too");
}

#[test]
fn describe_failure_recurses_into_composites() {
    let cap = Capability::all_of(vec![
        Capability::Assignment,
        Capability::content_length(500),
    ]);
    let t = task("t1", "short", TaskStatus::ToDo, Some("Bob"));

    let detail = cap.describe_failure(&t, "Alice");
    assert!(detail.contains("not assigned to Alice"));
    assert!(detail.contains("content too short"));
}
