use restline::http::Method;
use restline::http::Response;
use restline::resource::{
    handler, MapperRegistry, ParamType, ParameterResolver, PathPattern, Route, RouteError,
    RouteTableBuilder,
};

fn noop() -> Option<restline::resource::Handler> {
    Some(handler(|_args| async { Response::ok("") }))
}

#[test]
fn test_route_record_exposes_registration() {
    let mut builder = RouteTableBuilder::default();
    let route = builder
        .register_route(
            Method::GET,
            "/res/{resId}/pages/{page}",
            vec![
                ParameterResolver::path(ParamType::Str),
                ParameterResolver::path(ParamType::I64),
                ParameterResolver::query("sort", ParamType::Str),
            ],
            noop(),
        )
        .unwrap();

    assert_eq!(route.method(), Method::GET);
    assert_eq!(route.path(), "/res/{resId}/pages/{page}");
    assert_eq!(route.resolvers().len(), 3);
    assert_eq!(route.action_signature(), "String resId, i64 page");
    assert!(route.has_handler());
    assert_eq!(builder.len(), 1);
}

#[test]
fn test_route_without_path_resolvers_has_empty_signature() {
    let route = Route::new(
        Method::GET,
        "/res",
        vec![ParameterResolver::query_or("limit", ParamType::U64, "10")],
        noop(),
        &MapperRegistry::with_defaults(),
    )
    .unwrap();
    assert_eq!(route.action_signature(), "");
}

#[test]
fn test_route_rejects_path_after_query() {
    let err = Route::new(
        Method::GET,
        "/res/{resId}",
        vec![
            ParameterResolver::query("q", ParamType::Str),
            ParameterResolver::path(ParamType::Str),
        ],
        noop(),
        &MapperRegistry::with_defaults(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        RouteError::UnsortedPathParameters {
            method: Method::GET,
            path: "/res/{resId}".to_string(),
        }
    );
}

#[test]
fn test_route_rejects_path_after_body_or_context() {
    for first in [ParameterResolver::json_body("Data"), ParameterResolver::Context] {
        let err = Route::new(
            Method::POST,
            "/res/{resId}",
            vec![first, ParameterResolver::path(ParamType::Str)],
            noop(),
            &MapperRegistry::with_defaults(),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::UnsortedPathParameters { .. }));
    }
}

#[test]
fn test_route_rejects_empty_placeholder() {
    for path in ["/res/{}", "/res/{ }", "/a/{  }/b"] {
        let err = Route::new(
            Method::GET,
            path,
            vec![],
            noop(),
            &MapperRegistry::with_defaults(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RouteError::EmptyPathParameter {
                method: Method::GET,
                path: path.to_string(),
            }
        );
    }
}

#[test]
fn test_route_ordering_checked_before_empty_placeholder() {
    let err = Route::new(
        Method::GET,
        "/res/{}",
        vec![
            ParameterResolver::header("X-Id"),
            ParameterResolver::path(ParamType::Str),
        ],
        noop(),
        &MapperRegistry::with_defaults(),
    )
    .unwrap_err();
    assert!(matches!(err, RouteError::UnsortedPathParameters { .. }));
}

#[test]
fn test_route_rejects_more_path_resolvers_than_placeholders() {
    let err = Route::new(
        Method::GET,
        "/res/{resId}",
        vec![
            ParameterResolver::path(ParamType::Str),
            ParameterResolver::path(ParamType::Str),
        ],
        noop(),
        &MapperRegistry::with_defaults(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        RouteError::PathParameterMismatch {
            method: Method::GET,
            path: "/res/{resId}".to_string(),
            resolvers: 2,
            placeholders: 1,
        }
    );
}

#[test]
fn test_route_rejects_malformed_patterns() {
    for path in ["res", "/res/{id", "/res/pre{id}", "/res/{a}{b}"] {
        let err = Route::new(
            Method::GET,
            path,
            vec![],
            noop(),
            &MapperRegistry::with_defaults(),
        )
        .unwrap_err();
        assert!(
            matches!(err, RouteError::InvalidPathPattern { .. }),
            "{path}: {err:?}"
        );
    }
}

#[test]
fn test_route_rejects_unknown_mapper() {
    let err = Route::new(
        Method::POST,
        "/res",
        vec![ParameterResolver::body("application/xml", "Data")],
        noop(),
        &MapperRegistry::with_defaults(),
    )
    .unwrap_err();
    assert_eq!(err, RouteError::UnknownMapper("application/xml".to_string()));

    let err = Route::new(
        Method::POST,
        "/res",
        vec![ParameterResolver::json_body("Data")],
        noop(),
        &MapperRegistry::empty(),
    )
    .unwrap_err();
    assert_eq!(err, RouteError::UnknownMapper("application/json".to_string()));
}

#[test]
fn test_route_failed_registration_is_not_added() {
    let mut builder = RouteTableBuilder::default();
    assert!(builder
        .register_route(Method::GET, "/res/{}", vec![], noop())
        .is_err());
    assert!(builder.is_empty());
}

#[test]
fn test_pattern_matching_is_strict() {
    let pattern = PathPattern::compile("/res/{resId}").unwrap();
    assert_eq!(pattern.matches("/res/42"), Some(vec!["42".to_string()]));
    assert_eq!(pattern.matches("/res/"), None);
    assert_eq!(pattern.matches("/res"), None);
    assert_eq!(pattern.matches("/res/42/"), None);
    assert_eq!(pattern.matches("/RES/42"), None);
    assert_eq!(pattern.matches("/res/42/more"), None);

    let literal = PathPattern::compile("/res").unwrap();
    assert_eq!(literal.matches("/res"), Some(vec![]));
    assert_eq!(literal.matches("/res/"), None);
}

#[test]
fn test_pattern_placeholders_in_order() {
    let pattern = PathPattern::compile("/a/{x}/b/{y}").unwrap();
    assert_eq!(pattern.placeholder_count(), 2);
    assert_eq!(
        pattern.matches("/a/1/b/2"),
        Some(vec!["1".to_string(), "2".to_string()])
    );
}
