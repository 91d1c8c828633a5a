use axum::http::{Method, StatusCode};
use serenity_fixtures::auth::{self, MessageResponse};

use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("auth.login", "**/api/auth/login", |request| {
            let (Some(email), Some(password)) = (request.body_str("email"), request.body_str("password")) else {
                return HandlerOutcome::error(StatusCode::BAD_REQUEST, "Email and password are required");
            };
            match auth::login(email, password) {
                Ok(response) => HandlerOutcome::ok(response),
                Err(failure) => HandlerOutcome::error(StatusCode::UNAUTHORIZED, &failure.error),
            }
        })?
        .method(Method::POST),
        MockRule::new("auth.me", "**/api/auth/me", |request| {
            match auth::current_user(request.authorization()) {
                Ok(response) => HandlerOutcome::ok(response),
                Err(failure) => HandlerOutcome::error(StatusCode::UNAUTHORIZED, &failure.error),
            }
        })?
        .method(Method::GET),
        MockRule::new("auth.logout", "**/api/auth/logout", |_| {
            HandlerOutcome::ok(MessageResponse::new("Logged out"))
        })?
        .method(Method::POST),
        MockRule::new("auth.refresh", "**/api/auth/refresh", |request| {
            match auth::refresh_response(request.authorization()) {
                Ok(response) => HandlerOutcome::ok(response),
                Err(failure) => HandlerOutcome::error(StatusCode::UNAUTHORIZED, &failure.error),
            }
        })?
        .method(Method::POST),
        MockRule::new("auth.forgot-password", "**/api/auth/forgot-password", |_| {
            HandlerOutcome::ok(MessageResponse::new(
                "If an account exists, a reset link has been sent",
            ))
        })?
        .method(Method::POST),
    ])
}
