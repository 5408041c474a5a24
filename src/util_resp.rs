use axum::{
    Json,
    extract::rejection::{
        FormRejection, JsonRejection, PathRejection, QueryRejection,
    },
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

pub fn success(body: impl Serialize) -> StandardResponse {
    match serde_json::to_value(body) {
        Ok(value) => Ok(SuccessResponse::Success(value)),
        Err(e) => {
            tracing::error!("failed to serialize response body: {e}");
            Err(FailureResponse::ServerError(()))
        }
    }
}

pub fn msg(msg: impl Into<String>) -> StandardResponse {
    success(json!({ "msg": msg.into() }))
}

pub fn no_content() -> StandardResponse {
    Ok(SuccessResponse::NoContent)
}

pub fn bad_request(detail: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(detail.into()))
}

pub fn unauthorized(detail: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::Unauthorized(detail.into()))
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

#[derive(Debug)]
pub enum SuccessResponse {
    Success(serde_json::Value),
    NoContent,
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(value) => Json(value).into_response(),
            SuccessResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

#[derive(Debug)]
pub enum FailureResponse {
    BadRequest(String),
    /// The request was well-formed but its body did not fit the expected
    /// shape (a missing or mistyped field).
    Unprocessable(String),
    NotFound(String),
    Unauthorized(String),
    ServerError(()),
}

impl FailureResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            FailureResponse::BadRequest(_) => StatusCode::BAD_REQUEST,
            FailureResponse::Unprocessable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            FailureResponse::NotFound(_) => StatusCode::NOT_FOUND,
            FailureResponse::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FailureResponse::ServerError(()) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(self, FailureResponse::Unauthorized(_));
        let detail = match self {
            FailureResponse::BadRequest(detail)
            | FailureResponse::Unprocessable(detail)
            | FailureResponse::NotFound(detail)
            | FailureResponse::Unauthorized(detail) => detail,
            FailureResponse::ServerError(()) => {
                "Internal server error".to_string()
            }
        };
        let body = Json(json!({ "detail": detail }));
        if challenge {
            (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<diesel::result::Error> for FailureResponse {
    fn from(e: diesel::result::Error) -> Self {
        tracing::error!("database error: {e}");
        FailureResponse::ServerError(())
    }
}

impl From<diesel::r2d2::PoolError> for FailureResponse {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        tracing::error!("failed to check out a database connection: {e}");
        FailureResponse::ServerError(())
    }
}

impl From<tokio::task::JoinError> for FailureResponse {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!("blocking task failed: {e}");
        FailureResponse::ServerError(())
    }
}

impl FailureResponse {
    fn rejected(status: StatusCode, detail: String) -> Self {
        if status.is_server_error() {
            tracing::error!(%status, "extractor failed: {detail}");
            return FailureResponse::ServerError(());
        }
        tracing::debug!(%status, "rejected request: {detail}");
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            FailureResponse::Unprocessable(detail)
        } else {
            FailureResponse::BadRequest(detail)
        }
    }
}

impl From<JsonRejection> for FailureResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for FailureResponse {
    fn from(rejection: FormRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for FailureResponse {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for FailureResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}
