//! View data loaders.
//!
//! One loader per page. Loaders issue their reads on mount (in parallel where
//! the reads are independent), degrade failed auxiliary sections to empty
//! defaults, and re-read the authoritative resource after every write.

pub mod admin;
pub mod builder;
pub mod catalog;
pub mod course;
pub mod dashboard;
pub mod load;
pub mod profile;
pub mod quiz;
pub mod register;
pub mod search;

use crate::api::{ApiError, ApiErrorKind, ApiResult};

pub use load::{LoadId, LoadSeq, LoadSlot};
pub use search::{DEFAULT_DEBOUNCE, SearchLoader};

/// Presentation state of a view or section.
#[derive(Debug, Clone, Default)]
pub enum LoadState<T> {
    #[default]
    Loading,
    Ready(T),
    /// 403: the user lacks the role for this page
    Denied(String),
    Failed(ApiError),
}

impl<T> LoadState<T> {
    pub fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => LoadState::Ready(value),
            Err(err) if err.kind == ApiErrorKind::Forbidden => LoadState::Denied(err.message),
            Err(err) => LoadState::Failed(err),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Replaces a failed auxiliary read with `T::default()`.
///
/// Errors that require a new login are still returned; the whole view is
/// unusable in that case.
pub(crate) fn or_default<T: Default>(section: &str, result: ApiResult<T>) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.requires_login() => Err(err),
        Err(err) if err.is_not_found() => {
            tracing::debug!(section, "section not found; using empty default");
            Ok(T::default())
        }
        Err(err) => {
            tracing::warn!(section, error = %err, "section failed to load; using empty default");
            Ok(T::default())
        }
    }
}
