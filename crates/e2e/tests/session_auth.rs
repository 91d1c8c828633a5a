//! Session establishment and the mocked auth endpoints.

use axum::http::StatusCode;
use serde_json::json;

use serenity_common::{email_for, Role, RoleResolution, TEST_PASSWORD};
use serenity_e2e::config::HarnessConfig;
use serenity_e2e::mock::{router_with_all_endpoints, Dispatch, MockRequest};
use serenity_e2e::page::Page;
use serenity_e2e::session::{
    anonymous_session, establish_session, login_direct, login_interactive, stored_identity, AuthStrategy,
    EMAIL_INPUT, LOGIN_PATH, PASSWORD_INPUT, SUBMIT_BUTTON,
};
use serenity_e2e::simulated::SimulatedApp;
use serenity_fixtures::auth::decode_token;

fn quick_config(strategy: AuthStrategy) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.auth_strategy = strategy;
    config.timeouts.login_ms = 500;
    config.timeouts.poll_ms = 5;
    config
}

#[tokio::test]
async fn test_direct_session_lands_on_target() {
    let app = SimulatedApp::default();
    let page = app.open_page();

    let outcome = login_direct(&page, "founder", "/patients").await.unwrap();
    assert!(outcome.signed_in);
    assert_eq!(outcome.strategy, AuthStrategy::Direct);
    assert_eq!(page.current_path().await.unwrap(), "/patients");

    let text = page.text_content().await.unwrap();
    assert!(text.contains("Signed in as"), "{}", text);

    let stored = stored_identity(&page).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Founder);
    let token = page.storage_item("serenity_access_token").await.unwrap().unwrap();
    assert_eq!(decode_token(&token).unwrap().role, Role::Founder);
}

#[tokio::test]
async fn test_interactive_session_signs_in_through_form() {
    let app = SimulatedApp::default();
    let page = app.open_page();
    let config = quick_config(AuthStrategy::Interactive);

    let outcome = login_interactive(&page, "scheduler", &config).await.unwrap();
    assert!(outcome.signed_in);
    assert_eq!(outcome.identity.role, Role::Scheduler);
    assert_eq!(page.current_path().await.unwrap(), "/dashboard");
    assert!(!page.is_visible(PASSWORD_INPUT).await.unwrap());

    let stored = stored_identity(&page).await.unwrap().unwrap();
    assert_eq!(stored.email, email_for(Role::Scheduler));
}

#[tokio::test]
async fn test_establish_session_honors_target_for_both_strategies() {
    let app = SimulatedApp::default();
    for strategy in [AuthStrategy::Direct, AuthStrategy::Interactive] {
        let page = app.open_page();
        let config = quick_config(strategy);
        let outcome = establish_session(&page, "founder", "/billing", &config).await.unwrap();
        assert_eq!(outcome.strategy, strategy);
        assert_eq!(page.current_path().await.unwrap(), "/billing", "{:?}", strategy);
    }
}

#[tokio::test]
async fn test_unknown_role_falls_back_visibly() {
    let app = SimulatedApp::default();
    let page = app.open_page();
    let config = quick_config(AuthStrategy::Direct);

    let outcome = establish_session(&page, "superuser", "/dashboard", &config).await.unwrap();
    assert_eq!(outcome.resolution, RoleResolution::Unknown("superuser".to_string()));
    assert_eq!(outcome.identity.role, Role::Caregiver);
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    let app = SimulatedApp::default();
    let page = app.open_page();
    anonymous_session(&page, LOGIN_PATH).await.unwrap();

    page.fill(EMAIL_INPUT, &email_for(Role::Founder)).await.unwrap();
    page.fill(PASSWORD_INPUT, "not-the-password").await.unwrap();
    page.click(SUBMIT_BUTTON).await.unwrap();

    assert_eq!(page.current_path().await.unwrap(), LOGIN_PATH);
    assert!(page.text_content().await.unwrap().contains("Invalid credentials"));
    assert!(stored_identity(&page).await.unwrap().is_none());
}

#[tokio::test]
async fn test_protected_route_without_session_redirects() {
    let app = SimulatedApp::default();
    let page = app.open_page();
    anonymous_session(&page, "/patients").await.unwrap();
    assert_eq!(page.current_path().await.unwrap(), LOGIN_PATH);
}

#[test]
fn test_login_endpoint_accepts_test_credentials() {
    let router = router_with_all_endpoints().unwrap();
    let request = MockRequest::post("/api/auth/login")
        .unwrap()
        .with_json(json!({ "email": "founder@test.serenitycare.com", "password": TEST_PASSWORD }));

    match router.dispatch(&request) {
        Dispatch::Fulfilled { rule, response } => {
            assert_eq!(rule, "auth.login");
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body["success"], true);
            assert_eq!(response.body["user"]["role"], "founder");
            assert!(response.body["token"].as_str().is_some());
        }
        other => panic!("unexpected dispatch: {:?}", other),
    }
}

#[test]
fn test_login_endpoint_rejects_wrong_password() {
    let router = router_with_all_endpoints().unwrap();
    let request = MockRequest::post("/api/auth/login")
        .unwrap()
        .with_json(json!({ "email": "founder@test.serenitycare.com", "password": "wrong" }));

    let dispatch = router.dispatch(&request);
    let response = dispatch.response().unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Invalid credentials");
}

#[test]
fn test_current_user_requires_bearer() {
    let router = router_with_all_endpoints().unwrap();

    let anonymous = router.dispatch(&MockRequest::get("/api/auth/me").unwrap());
    assert_eq!(anonymous.response().unwrap().status, StatusCode::UNAUTHORIZED);

    let login = router.dispatch(
        &MockRequest::post("/api/auth/login")
            .unwrap()
            .with_json(json!({ "email": email_for(Role::Cfo), "password": TEST_PASSWORD })),
    );
    let token = login.response().unwrap().body["token"].as_str().unwrap().to_string();
    let me = router.dispatch(&MockRequest::get("/api/auth/me").unwrap().with_bearer(&token));
    let response = me.response().unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["role"], "cfo");
}
