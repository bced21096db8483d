use std::collections::BTreeSet;

use loadgate::dag::{StallReport, TaskRegistry, UnitDescriptor, find_eligible};
use loadgate::errors::LoadError;
use loadgate_test_utils::builders::{UnitBuilder, units};

fn ids(units: &[loadgate::dag::Unit]) -> Vec<&str> {
    units.iter().map(|u| u.id.as_str()).collect()
}

fn registry(pairs: &[(&str, &[&str])]) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register(units(pairs)).unwrap();
    registry
}

#[test]
fn register_rejects_missing_id() {
    let mut registry = TaskRegistry::new();
    let err = registry
        .register(vec![UnitDescriptor::new("", "a.js")])
        .unwrap_err();

    assert!(matches!(err, LoadError::Validation(ref msg) if msg.contains("no id")));
    assert!(registry.is_empty());
}

#[test]
fn register_rejects_missing_resource() {
    let mut registry = TaskRegistry::new();
    let err = registry
        .register(vec![UnitBuilder::new("A").resource("  ").build()])
        .unwrap_err();

    assert!(matches!(err, LoadError::Validation(ref msg) if msg.contains("'A'")));
}

#[test]
fn register_rejects_self_dependency() {
    let mut registry = TaskRegistry::new();
    let err = registry.register(units(&[("A", &["A"])])).unwrap_err();

    assert!(matches!(err, LoadError::Validation(ref msg) if msg.contains("itself")));
}

#[test]
fn duplicate_id_aborts_whole_batch() {
    let mut registry = TaskRegistry::new();
    let err = registry
        .register(units(&[("A", &[]), ("B", &[]), ("A", &[])]))
        .unwrap_err();

    assert!(matches!(err, LoadError::Validation(ref msg) if msg.contains("duplicate")));
    assert!(registry.is_empty(), "no unit of a rejected batch may be registered");
}

#[test]
fn duplicate_of_already_pending_id_is_rejected() {
    let mut registry = registry(&[("A", &[])]);
    let err = registry.register(units(&[("A", &[])])).unwrap_err();

    assert!(matches!(err, LoadError::Validation(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn remove_clears_dependency_everywhere_and_reports_change() {
    let mut registry = registry(&[("A", &[]), ("B", &["A"]), ("C", &["A", "B"])]);

    assert!(registry.remove("A"));
    assert!(!registry.contains("A"));
    assert!(registry.get("B").unwrap().depends_on.is_empty());
    assert_eq!(
        registry.get("C").unwrap().depends_on,
        BTreeSet::from(["B".to_string()])
    );
}

#[test]
fn remove_without_dependents_reports_no_change() {
    let mut registry = registry(&[("A", &[]), ("B", &[])]);

    assert!(!registry.remove("A"));
    assert_eq!(registry.len(), 1);
    assert!(!registry.remove("B"));
    assert!(registry.is_empty());
}

#[test]
fn scan_skips_blocked_and_in_flight_units() {
    let registry = registry(&[("A", &[]), ("B", &[]), ("C", &["A"])]);
    let in_flight = BTreeSet::from(["A".to_string()]);

    let eligible = find_eligible(&registry, &in_flight);
    assert_eq!(ids(&eligible), vec!["B"]);
}

#[test]
fn scan_is_stable_and_recomputed_from_current_state() {
    let mut registry = registry(&[("C", &[]), ("A", &[]), ("B", &["A"])]);
    let none = BTreeSet::new();

    let first = find_eligible(&registry, &none);
    let again = find_eligible(&registry, &none);
    assert_eq!(ids(&first), vec!["A", "C"]);
    assert_eq!(first, again);

    registry.remove("A");
    assert_eq!(ids(&find_eligible(&registry, &none)), vec!["B", "C"]);
}

#[test]
fn stall_report_separates_cycles_missing_and_blocked() {
    let registry = registry(&[
        ("A", &["B"]),
        ("B", &["A"]),
        ("C", &["Z"]),
        ("D", &["C"]),
    ]);

    let report = StallReport::from_registry(&registry);

    assert_eq!(report.remaining, vec!["A", "B", "C", "D"]);
    assert_eq!(report.cycles, vec![vec!["A".to_string(), "B".to_string()]]);
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].unit, "C");
    assert_eq!(report.missing[0].dependency, "Z");
    assert_eq!(report.blocked, vec!["D"]);

    let message = report.to_string();
    assert!(message.contains("circular dependency"));
    assert!(message.contains("unregistered 'Z'"));
    assert!(message.contains("cycle between [A, B]"));
}
