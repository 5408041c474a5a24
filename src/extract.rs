//! Request extractors whose rejections are rendered like every other error,
//! as `{"detail": ...}`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::util_resp::FailureResponse;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(FailureResponse))]
pub struct Json<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(FailureResponse))]
pub struct Form<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(FailureResponse))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(FailureResponse))]
pub struct Query<T>(pub T);
