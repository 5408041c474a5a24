use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{User, token::TokenKeys},
    extract::Form,
    state::Conn,
    util_resp::{FailureResponse, StandardResponse, success, unauthorized},
};

/// The OAuth2 "password" grant form.
#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn issue_token(
    State(keys): State<TokenKeys>,
    mut conn: Conn<true>,
    Form(form): Form<LoginForm>,
) -> StandardResponse {
    let user = match User::<true>::fetch_by_name(&form.username, &mut *conn)? {
        Some(user) if user.check_password(&form.password) => user,
        // todo: password rate limiting
        _ => return unauthorized("Incorrect username or password"),
    };

    let access_token = keys.issue(&user.name).map_err(|e| {
        tracing::error!("failed to sign token: {e}");
        FailureResponse::ServerError(())
    })?;

    tracing::debug!("issued token");

    success(TokenResponse {
        access_token,
        token_type: "bearer",
    })
}
