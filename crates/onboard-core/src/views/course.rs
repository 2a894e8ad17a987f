//! Course page: lessons, completion, reviews and quiz access.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::catalog::CourseStatus;
use super::{LoadState, or_default};
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::models::{CourseDetail, CourseId, LessonId, NewReview, ProgressRecord, Review};
use crate::session::Session;

#[derive(Debug, Clone, Default)]
pub struct CourseData {
    pub detail: CourseDetail,
    /// Server-computed percentage; 0 when no record exists
    pub progress: f64,
    pub completed: BTreeSet<LessonId>,
    pub has_record: bool,
    pub reviews: Vec<Review>,
}

impl CourseData {
    pub fn is_completed(&self, lesson: LessonId) -> bool {
        self.completed.contains(&lesson)
    }

    pub fn status(&self) -> CourseStatus {
        if !self.has_record {
            CourseStatus::NotStarted
        } else if self.progress >= 100.0 {
            CourseStatus::Completed
        } else {
            CourseStatus::InProgress
        }
    }

    /// The final quiz unlocks once every lesson is done.
    pub fn quiz_available(&self) -> bool {
        self.detail.has_quiz && self.progress >= 100.0
    }

    fn apply_record(&mut self, record: Option<&ProgressRecord>) {
        match record {
            Some(record) => {
                self.progress = record.progress;
                self.completed = record.completed_lessons.iter().copied().collect();
                self.has_record = true;
            }
            None => {
                self.progress = 0.0;
                self.completed.clear();
                self.has_record = false;
            }
        }
    }
}

pub struct CourseView {
    client: ApiClient,
    session: Arc<Session>,
    id: CourseId,
    state: LoadState<CourseData>,
    review_error: Option<ApiError>,
}

impl CourseView {
    pub fn new(client: ApiClient, session: Arc<Session>, id: CourseId) -> Self {
        Self {
            client,
            session,
            id,
            state: LoadState::Loading,
            review_error: None,
        }
    }

    pub fn state(&self) -> &LoadState<CourseData> {
        &self.state
    }

    /// Validation failure from the last review submission, shown next to the form.
    pub fn review_error(&self) -> Option<&ApiError> {
        self.review_error.as_ref()
    }

    /// Loads the course detail, then progress and reviews.
    ///
    /// The detail is required. Progress falls back to "not started" and
    /// reviews to an empty list.
    pub async fn load(&mut self) -> &LoadState<CourseData> {
        self.state = LoadState::Loading;
        let result = self.fetch().await;
        self.state = LoadState::from_result(result);
        &self.state
    }

    async fn fetch(&self) -> ApiResult<CourseData> {
        self.session.require_auth()?;
        let detail = self.client.course(self.id).await?;

        let (progress, reviews) = tokio::join!(
            self.progress_record(),
            self.client.reviews(self.id)
        );

        let mut data = CourseData {
            detail,
            reviews: or_default("reviews", reviews)?,
            ..CourseData::default()
        };
        data.apply_record(or_default("progress", progress)?.as_ref());
        Ok(data)
    }

    async fn progress_record(&self) -> ApiResult<Option<ProgressRecord>> {
        let records = self.client.progress().await?;
        Ok(records.into_iter().find(|r| r.course.id == self.id))
    }

    /// Marks a lesson complete, or incomplete if it already is, then re-reads progress.
    ///
    /// # Errors
    /// Returns the completion failure. A failed progress re-read is logged and
    /// leaves the previous value in place.
    pub async fn toggle_lesson(&mut self, lesson: LessonId) -> ApiResult<()> {
        self.session.require_auth()?;
        let completed = self
            .state
            .ready()
            .is_some_and(|data| data.is_completed(lesson));

        if completed {
            self.client.uncomplete_lesson(self.id, lesson).await?;
        } else {
            self.client.complete_lesson(self.id, lesson).await?;
        }

        self.refresh_progress().await
    }

    /// Re-reads the progress record and applies the server's value.
    ///
    /// # Errors
    /// Only errors that require a new login are returned.
    pub async fn refresh_progress(&mut self) -> ApiResult<()> {
        match self.progress_record().await {
            Ok(record) => {
                if let LoadState::Ready(data) = &mut self.state {
                    data.apply_record(record.as_ref());
                }
                Ok(())
            }
            Err(err) if err.requires_login() => Err(err),
            Err(err) => {
                tracing::warn!(course = self.id, error = %err, "failed to refresh progress");
                Ok(())
            }
        }
    }

    /// Posts a review, then re-reads the detail (for the average rating) and the reviews.
    ///
    /// On a validation failure the field messages are kept in
    /// [`CourseView::review_error`] and the rest of the page is left untouched.
    ///
    /// # Errors
    /// Returns the submission failure.
    pub async fn submit_review(&mut self, rating: u8, comment: &str) -> ApiResult<Review> {
        self.session.require_auth()?;
        self.review_error = None;

        let review = NewReview {
            rating,
            comment: comment.trim().to_string(),
        };
        let created = match self.client.submit_review(self.id, &review).await {
            Ok(created) => created,
            Err(err) => {
                if err.kind == ApiErrorKind::Validation {
                    self.review_error = Some(err.clone());
                }
                return Err(err);
            }
        };

        let (detail, reviews) =
            tokio::join!(self.client.course(self.id), self.client.reviews(self.id));
        if let LoadState::Ready(data) = &mut self.state {
            match detail {
                Ok(detail) => data.detail = detail,
                Err(err) => tracing::warn!(error = %err, "failed to re-read course after review"),
            }
            match reviews {
                Ok(reviews) => data.reviews = reviews,
                Err(err) => tracing::warn!(error = %err, "failed to re-read reviews"),
            }
        }
        Ok(created)
    }
}
