mod common;

use common::{project, FakeApi};
use logtrain::metadata::{discover, resolve, ResolutionError};
use logtrain::target::Target;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_resolve_looks_up_project_from_environment() {
    let api = FakeApi::with_project(project());
    let target = Target::pinned("e1", vec!["s1".to_string()]);

    let table = resolve(&api, &target).await.unwrap();

    assert_eq!(table.get("p1"), Some("shop"));
    assert_eq!(table.get("e1"), Some("production"));
    assert_eq!(table.get("e2"), Some("staging"));
    assert_eq!(table.get("s4"), Some("web"));
    assert_eq!(table.name_or_undefined("nope"), "undefined");
    assert_eq!(api.environment_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.project_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resolve_with_explicit_project_skips_environment_lookup() {
    let api = FakeApi::with_project(project());
    let target = Target::pinned("e1", vec![]).with_project("p1");

    let table = resolve(&api, &target).await.unwrap();

    assert_eq!(table.len(), 6);
    assert_eq!(api.environment_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resolve_environment_failure() {
    let api = FakeApi::failing();
    let target = Target::pinned("e1", vec![]);

    let err = resolve(&api, &target).await.unwrap_err();
    match err {
        ResolutionError::Environment { id, .. } => assert_eq!(id, "e1"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(api.project_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resolve_unknown_project_fails() {
    let api = FakeApi::with_project(project());
    let target = Target::pinned("e1", vec![]).with_project("p9");

    let err = resolve(&api, &target).await.unwrap_err();
    assert!(matches!(err, ResolutionError::Project { ref id, .. } if id == "p9"));
    assert!(err.to_string().contains("Project p9 not found"));
}

#[tokio::test]
async fn test_discover_keeps_api_order() {
    let api = FakeApi::with_project(project());

    let ids = discover(&api, "p1", "e1").await.unwrap();
    assert_eq!(ids, vec!["s1".to_string(), "s4".to_string()]);

    let ids = discover(&api, "p1", "e2").await.unwrap();
    assert_eq!(ids, vec!["s2".to_string(), "s4".to_string()]);
}

#[tokio::test]
async fn test_discover_unknown_environment_is_empty() {
    let api = FakeApi::with_project(project());

    let ids = discover(&api, "p1", "e-missing").await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_discover_propagates_api_error() {
    let api = FakeApi::failing();

    let err = discover(&api, "p1", "e1").await.unwrap_err();
    assert!(matches!(err, ResolutionError::Project { .. }));
}
