//! End-to-end tests which drive the whole router, plus the helpers they
//! share with the unit tests.

use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use axum_test::TestServer;
use chrono::Duration;
use serde_json::json;

use crate::{
    auth::token::TokenKeys,
    config::create_app,
    state::{AppState, DbPool, make_pool, run_migrations},
};

mod sockets;

pub const TEST_SECRET: &[u8] =
    b"0000000000000000000000000000000000000000000000000000000000000000";

pub fn make_test_pool() -> DbPool {
    let pool = make_pool(":memory:").unwrap();
    run_migrations(&pool).unwrap();
    assert_eq!(pool.state().idle_connections, 1);
    pool
}

pub fn make_test_state() -> AppState {
    AppState::new(
        make_test_pool(),
        TokenKeys::new(TEST_SECRET, Duration::minutes(30)),
    )
}

pub fn make_test_server() -> (TestServer, AppState) {
    let state = make_test_state();
    let server = TestServer::new(create_app(state.clone())).unwrap();
    (server, state)
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Registers `name` (with password `password`) and returns a token for it.
pub async fn register_and_login(server: &TestServer, name: &str) -> String {
    let res = server
        .post("/register")
        .json(&json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "password": "password",
        }))
        .await;
    assert!(
        res.status_code().is_success(),
        "register failed: {} {}",
        res.status_code(),
        res.text()
    );

    let res = server
        .post("/token")
        .form(&[("username", name), ("password", "password")])
        .await;
    assert!(
        res.status_code().is_success(),
        "login failed: {} {}",
        res.status_code(),
        res.text()
    );

    res.json::<serde_json::Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
