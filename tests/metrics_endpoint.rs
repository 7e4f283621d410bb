mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_string, build_app, load_test_config, request};
use tower::ServiceExt;

#[tokio::test]
async fn get_metrics_is_rewritten_to_exposition_endpoint() {
    let (app, state) = build_app(load_test_config());

    let response = app
        .clone()
        .oneshot(request("/metrics", Method::GET))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        state.metrics.content_type()
    );

    let body = body_string(response).await;
    assert!(body.contains("# TYPE http_requests_total counter"));
    assert!(body.contains(r#"http_requests_total{method="GET",status="200"} 1"#));
}

#[tokio::test]
async fn api_metrics_path_serves_the_same_endpoint() {
    let (app, state) = build_app(load_test_config());

    let response = app
        .clone()
        .oneshot(request("/api/metrics", Method::GET))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        state.metrics.content_type()
    );
}

#[tokio::test]
async fn scrapes_are_counted() {
    let (app, _state) = build_app(load_test_config());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request("/metrics", Method::GET))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request("/metrics", Method::GET))
        .await
        .expect("request should complete");
    let body = body_string(response).await;
    assert!(body.contains(r#"http_requests_total{method="GET",status="200"} 3"#));
}

#[tokio::test]
async fn non_get_metrics_request_is_rejected() {
    let (app, _state) = build_app(load_test_config());

    for method in [Method::HEAD, Method::POST, Method::PUT, Method::DELETE] {
        let response = app
            .clone()
            .oneshot(request("/metrics", method.clone()))
            .await
            .expect("request should complete");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        if method != Method::HEAD {
            let body: serde_json::Value =
                serde_json::from_str(&body_string(response).await).expect("body should be JSON");
            assert_eq!(body["error"], "Method not allowed");
        }
    }
}

#[tokio::test]
async fn rejected_scrapes_are_not_counted() {
    let (app, state) = build_app(load_test_config());

    for method in [Method::HEAD, Method::POST] {
        let response = app
            .clone()
            .oneshot(request("/metrics", method))
            .await
            .expect("request should complete");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    let text = state.metrics.render().expect("render should succeed");
    assert!(!text.contains("http_requests_total{"));
}

#[tokio::test]
async fn rewrite_only_matches_exact_path() {
    let (app, _state) = build_app(load_test_config());

    let response = app
        .clone()
        .oneshot(request("/metrics/extra", Method::GET))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configured_rewrites_replace_the_default() {
    let mut config = load_test_config();
    config.rewrites = vec![routemeter::config::RewriteRule::new(
        "/internal/stats",
        "/api/metrics",
    )];
    let (app, _state) = build_app(config);

    let response = app
        .clone()
        .oneshot(request("/internal/stats", Method::GET))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("/metrics", Method::GET))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
