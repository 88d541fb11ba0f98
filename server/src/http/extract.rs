//! Request extractors whose rejections use the `{ok:false,error}` envelope.

use axum::{
    Form,
    extract::{FromRequest, FromRequestParts, Path, Query},
};
use platform_api::ApiError;

#[derive(FromRequest)]
#[from_request(via(Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
