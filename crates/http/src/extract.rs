//! Extractors whose rejections render through [`AppError`].

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body extractor; malformed bodies become a 400 error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor; malformed queries become a 400 error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
