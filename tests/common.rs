#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use routemeter::config::{extract_config, ConfigV1};
use routemeter::middleware::Rewrite;
use routemeter::routes::create_app;
use routemeter::startup::build_state;
use routemeter::state::AppState;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:9184
logging:
  level: "debug"
  format: "json"
metrics:
  process_metrics: false
"#;

pub fn load_test_config() -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("Failed to parse test config YAML")
}

pub fn build_state_from(config: ConfigV1) -> AppState {
    build_state(Arc::new(config)).expect("state should build")
}

pub fn build_app(config: ConfigV1) -> (Rewrite<Router>, AppState) {
    let state = build_state_from(config);
    (create_app(state.clone()), state)
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}
