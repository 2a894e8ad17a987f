//! REST client for the learning platform.

mod client;
mod endpoints;
mod error;

pub use client::{ApiClient, AuthEvent, REQUEST_ID_HEADER};
pub use endpoints::CourseQuery;
pub use error::{ApiError, ApiErrorKind, ApiResult, FieldError};
