//! Staff course authoring.

use std::sync::Arc;

use super::LoadState;
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult, FieldError};
use crate::models::{CreatedCourse, NewCourse, NewLesson};
use crate::session::Session;

const DEFAULT_LESSON_MINUTES: u32 = 15;

/// A course being composed before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub role: String,
    pub image_url: String,
    pub lessons: Vec<NewLesson>,
}

impl CourseDraft {
    /// Appends a lesson with the next order number.
    pub fn push_lesson(&mut self, title: &str, content: &str, video_url: &str) {
        let order = u32::try_from(self.lessons.len() + 1).unwrap_or(u32::MAX);
        self.lessons.push(NewLesson {
            title: title.to_string(),
            content: content.to_string(),
            video_url: video_url.to_string(),
            estimated_minutes: DEFAULT_LESSON_MINUTES,
            order,
            ..NewLesson::default()
        });
    }

    /// Builds the request body: lessons with a blank title are dropped and the
    /// rest are renumbered from 1 in their current sequence.
    ///
    /// # Errors
    /// Returns `Validation` when the title or role is blank.
    pub fn into_request(self) -> ApiResult<NewCourse> {
        let mut fields = Vec::new();
        for (field, value) in [("title", &self.title), ("role", &self.role)] {
            if value.trim().is_empty() {
                fields.push(FieldError {
                    field: field.to_string(),
                    messages: vec!["This field may not be blank.".to_string()],
                });
            }
        }
        if !fields.is_empty() {
            return Err(ApiError {
                fields,
                ..ApiError::new(ApiErrorKind::Validation, "Validation failed")
            });
        }

        let lessons = self
            .lessons
            .into_iter()
            .filter(|lesson| !lesson.title.trim().is_empty())
            .zip(1u32..)
            .map(|(lesson, order)| NewLesson { order, ..lesson })
            .collect();

        Ok(NewCourse {
            title: self.title.trim().to_string(),
            description: self.description,
            role: self.role.trim().to_string(),
            image_url: self.image_url,
            lessons,
        })
    }
}

pub struct CourseBuilder {
    client: ApiClient,
    session: Arc<Session>,
    /// `Ready(())` for staff, `Denied` otherwise
    access: LoadState<()>,
}

impl CourseBuilder {
    pub fn new(client: ApiClient, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            access: LoadState::Loading,
        }
    }

    pub fn access(&self) -> &LoadState<()> {
        &self.access
    }

    /// Reads the profile to decide whether the builder is available.
    pub async fn load(&mut self) -> &LoadState<()> {
        self.access = LoadState::Loading;
        let profile = match self.session.require_auth() {
            Ok(()) => self.client.profile().await,
            Err(err) => Err(err),
        };
        self.access = match profile {
            Ok(profile) if profile.is_staff => LoadState::Ready(()),
            Ok(_) => LoadState::Denied("Only staff can create courses".to_string()),
            Err(err) => LoadState::from_result(Err(err)),
        };
        &self.access
    }

    /// Submits the draft.
    ///
    /// # Errors
    /// Returns `Forbidden` if the staff check has not passed, or the
    /// validation / server failure.
    pub async fn create(&self, draft: CourseDraft) -> ApiResult<CreatedCourse> {
        self.session.require_auth()?;
        if let LoadState::Denied(message) = &self.access {
            return Err(ApiError::new(ApiErrorKind::Forbidden, message.clone()));
        }
        if self.access.ready().is_none() {
            return Err(ApiError::new(
                ApiErrorKind::Forbidden,
                "Staff access has not been verified",
            ));
        }

        let request = draft.into_request()?;
        let created = self.client.create_course(&request).await?;
        tracing::info!(title = %created.title, lessons = request.lessons.len(), "course created");
        Ok(created)
    }
}
