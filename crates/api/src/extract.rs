//! Request extractors whose rejections use the [`AppError`] JSON shape.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with malformed, mistyped or non-JSON bodies reported as
/// `400 BAD_REQUEST` instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
