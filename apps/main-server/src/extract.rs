//! Extractors that report rejections as `{message}` JSON bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ServerError;

/// `Json<T>` whose rejection is a [`ServerError::InvalidRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ValidJson<T>(pub T);

/// `Query<T>` whose rejection is a [`ServerError::InvalidRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct ValidQuery<T>(pub T);

/// `Path<T>` whose rejection is a [`ServerError::InvalidRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct ValidPath<T>(pub T);
