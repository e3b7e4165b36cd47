//! Filter Engine Tests
//!
//! Tests verify:
//! - Filter string parsing and its error cases
//! - Dot path parsing and resolution
//! - Value canonicalization
//! - Conjunction semantics over prefix and field filters

use revscope::filter::{
    canonicalize, matches_all, parse_filters, DotPath, FieldConstraint, Filter, Operator,
    StaticSubject,
};
use revscope::RevscopeError;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn pod_document() -> serde_json::Value {
    json!({
        "Key": "/registry/pods/default/web-0",
        "Version": 3,
        "Value": {
            "kind": "Pod",
            "metadata": {
                "name": "web-0",
                "namespace": "default",
                "generation": 2,
                "deletionTimestamp": null
            },
            "spec": {
                "containers": [
                    {"name": "web", "image": "nginx:1.25"},
                    {"name": "sidecar", "image": "envoy:1.29"}
                ],
                "hostNetwork": false
            }
        },
        "TypeMeta": {"APIVersion": "v1", "Kind": "Pod"}
    })
}

fn pod_subject() -> StaticSubject<'static> {
    StaticSubject {
        key: b"/registry/pods/default/web-0",
        document: pod_document(),
    }
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_single_constraint() {
    let filters = parse_filters(".Value.metadata.namespace=default").unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(
        filters[0].field_constraint(),
        Some(&FieldConstraint::new(
            ".Value.metadata.namespace",
            Operator::Equals,
            "default"
        ))
    );
}

#[test]
fn test_parse_multiple_constraints_in_order() {
    let filters = parse_filters(".Value.kind=Pod,.TypeMeta.APIVersion=v1").unwrap();
    let lhs: Vec<&str> = filters
        .iter()
        .map(|f| f.field_constraint().unwrap().lhs.as_str())
        .collect();
    assert_eq!(lhs, vec![".Value.kind", ".TypeMeta.APIVersion"]);
}

#[test]
fn test_parse_trims_whitespace() {
    let filters = parse_filters("  .Value.kind =\tPod ,\n.Version= 3 ").unwrap();
    assert_eq!(filters.len(), 2);
    let first = filters[0].field_constraint().unwrap();
    assert_eq!(first.lhs, ".Value.kind");
    assert_eq!(first.rhs, "Pod");
    assert_eq!(filters[1].field_constraint().unwrap().rhs, "3");
}

#[test]
fn test_parse_empty_input() {
    assert!(parse_filters("").unwrap().is_empty());
    assert!(parse_filters(" \t\n").unwrap().is_empty());
}

#[test]
fn test_parse_allows_empty_literal() {
    let filters = parse_filters(".Value.metadata.namespace=").unwrap();
    assert_eq!(filters[0].field_constraint().unwrap().rhs, "");
}

#[test]
fn test_parse_rejects_missing_equals() {
    assert!(matches!(
        parse_filters(".Value.kind"),
        Err(RevscopeError::InvalidFilterSpec { .. })
    ));
}

#[test]
fn test_parse_rejects_two_equals() {
    assert!(matches!(
        parse_filters(".Value.kind=Pod=Job"),
        Err(RevscopeError::InvalidFilterSpec { .. })
    ));
}

#[test]
fn test_parse_rejects_missing_path() {
    match parse_filters(".Value.kind=Pod, =default") {
        Err(RevscopeError::InvalidFilterSpec { raw, .. }) => assert_eq!(raw, " =default"),
        other => panic!("expected InvalidFilterSpec, got {:?}", other),
    }
}

#[test]
fn test_parse_rejects_empty_clause() {
    assert!(parse_filters(".Value.kind=Pod,").is_err());
    assert!(parse_filters(".Value.kind=Pod,,.Version=1").is_err());
}

#[test]
fn test_parse_rejects_malformed_path() {
    assert!(matches!(
        parse_filters(".Value..kind=Pod"),
        Err(RevscopeError::InvalidFilterSpec { .. })
    ));
    assert!(parse_filters(".=Pod").is_err());
}

#[test]
fn test_filter_display() {
    let filters = parse_filters(".Value.kind = Pod").unwrap();
    assert_eq!(filters[0].to_string(), ".Value.kind=Pod");
    assert_eq!(Filter::prefix("/registry/").to_string(), "prefix(/registry/)");
}

// =============================================================================
// Dot Path Tests
// =============================================================================

#[test]
fn test_dot_path_leading_dot_is_optional() {
    let with = DotPath::parse(".Value.kind").unwrap();
    let without = DotPath::parse("Value.kind").unwrap();
    assert_eq!(with.segments(), without.segments());
}

#[test]
fn test_dot_path_resolves_nested_members() {
    let doc = pod_document();
    let path = DotPath::parse(".Value.metadata.name").unwrap();
    assert_eq!(path.resolve(&doc).unwrap(), &json!("web-0"));
}

#[test]
fn test_dot_path_indexes_arrays() {
    let doc = pod_document();
    let path = DotPath::parse(".Value.spec.containers.1.image").unwrap();
    assert_eq!(path.resolve(&doc).unwrap(), &json!("envoy:1.29"));
}

#[test]
fn test_dot_path_miss_is_invalid_path() {
    let doc = pod_document();
    for raw in [
        ".Value.metadata.labels",
        ".Value.spec.containers.7.image",
        ".Value.spec.containers.first",
        ".Value.metadata.name.length",
    ] {
        let path = DotPath::parse(raw).unwrap();
        assert!(
            matches!(path.resolve(&doc), Err(RevscopeError::InvalidPath(_))),
            "{} resolved",
            raw
        );
    }
}

// =============================================================================
// Canonicalization Tests
// =============================================================================

#[test]
fn test_canonicalize() {
    assert_eq!(canonicalize(&json!("default")), Some("default".to_string()));
    assert_eq!(canonicalize(&json!(3)), Some("3".to_string()));
    assert_eq!(canonicalize(&json!(false)), Some("false".to_string()));
    assert_eq!(canonicalize(&json!(["a", 1])), Some(r#"["a",1]"#.to_string()));
    assert_eq!(canonicalize(&json!(null)), None);
}

// =============================================================================
// Matching Tests
// =============================================================================

#[test]
fn test_empty_filter_set_matches_everything() {
    assert!(matches_all(&[], &mut pod_subject()));
}

#[test]
fn test_prefix_filter() {
    let mut subject = pod_subject();
    assert!(Filter::prefix("/registry/pods/").matches(&mut subject));
    assert!(!Filter::prefix("/registry/jobs/").matches(&mut subject));
}

#[test]
fn test_field_filter_matches_strings_and_scalars() {
    let filters = parse_filters(
        ".Value.metadata.namespace=default,.Version=3,.Value.spec.hostNetwork=false",
    )
    .unwrap();
    assert!(matches_all(&filters, &mut pod_subject()));
}

#[test]
fn test_field_filter_compares_numbers_textually() {
    let filters = parse_filters(".Value.metadata.generation=2.0").unwrap();
    assert!(!matches_all(&filters, &mut pod_subject()));
}

#[test]
fn test_unresolvable_path_is_non_match() {
    let filters = parse_filters(".Value.metadata.labels.app=web").unwrap();
    assert!(!matches_all(&filters, &mut pod_subject()));
}

#[test]
fn test_null_value_is_non_match() {
    for raw in [".Value.metadata.deletionTimestamp=null", ".Value.metadata.deletionTimestamp="] {
        let filters = parse_filters(raw).unwrap();
        assert!(!matches_all(&filters, &mut pod_subject()), "{} matched", raw);
    }
}

#[test]
fn test_type_meta_filter() {
    let filters = parse_filters(".TypeMeta.Kind=Pod").unwrap();
    assert!(matches_all(&filters, &mut pod_subject()));
}

#[test]
fn test_conjunction_requires_every_filter() {
    let mut filters = vec![Filter::prefix("/registry/pods/")];
    filters.extend(parse_filters(".Value.metadata.namespace=default").unwrap());
    assert!(matches_all(&filters, &mut pod_subject()));

    filters.extend(parse_filters(".Value.metadata.namespace=kube-system").unwrap());
    assert!(!matches_all(&filters, &mut pod_subject()));
}

#[test]
fn test_needs_payload() {
    assert!(!Filter::prefix("/a").needs_payload());
    assert!(parse_filters(".Key=/a").unwrap()[0].needs_payload());
}
