use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json, async_trait,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;
use serde_json::json;

use crate::{
    auth::token::TokenKeys,
    schema::users,
    state::{Conn, DbPool},
    util_resp::FailureResponse,
};

pub mod login;
pub mod register;
pub mod token;

#[derive(Debug, Queryable, Serialize, Clone)]
pub struct User<const TX: bool = true> {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub team_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl<const TX: bool> User<TX> {
    pub fn fetch_by_name(
        name: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> QueryResult<Option<Self>> {
        users::table
            .filter(users::name.eq(name))
            .first::<User<TX>>(conn)
            .optional()
    }

    pub fn check_password(&self, password: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::error!(user = self.id, "stored hash is unreadable: {e}");
                false
            }
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, FailureResponse> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("failed to hash password: {e}");
            FailureResponse::ServerError(())
        })
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    NoDatabase,
    Unauthorized,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Not authenticated")
            }
            AuthError::InvalidToken | AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid authentication credentials",
            ),
            AuthError::NoDatabase => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            (
                status,
                [(WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "detail": detail })),
            )
                .into_response()
        } else {
            (status, Json(json!({ "detail": detail }))).into_response()
        }
    }
}

/// Resolves the `Authorization: Bearer` header of a request to the user the
/// token was issued for.
#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for User<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
    TokenKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let keys = TokenKeys::from_ref(state);
        let username = keys.verify(bearer.token()).map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            AuthError::InvalidToken
        })?;

        let mut conn = Conn::<TX>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::NoDatabase)?;

        let user = User::<TX>::fetch_by_name(&username, &mut *conn)
            .map_err(|e| {
                tracing::error!("failed to look up user: {e}");
                AuthError::NoDatabase
            })?;

        match user {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(%username, "token names a user that does not exist");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
