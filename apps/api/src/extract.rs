//! Request extractors whose rejections render as `AppError`.
//!
//! Handlers take these instead of `axum::Json`, `Path` and `Query` so a
//! malformed body, path segment or query string answers with the same
//! `{ "error": ... }` body as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
