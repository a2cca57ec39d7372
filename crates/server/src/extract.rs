//! Request extractors with JSON error bodies.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is a 400 [`AppError::BadRequest`].
///
/// Missing fields, wrong types and a non-JSON content type all answer with
/// the same `{"error": ...}` body as every other validation failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
