//! Typed wrappers for each REST endpoint.

use super::client::ApiClient;
use super::error::ApiResult;
use crate::models::{
    Achievement, Activity, AdminProgressRecord, Course, CourseDetail, CourseId, CreatedCourse,
    Detail, LessonId, LoginRequest, NewCourse, NewReview, ProfileUpdate, ProgressRecord, Quiz,
    QuizResult, QuizSubmission, RegisterRequest, RegisteredUser, Review, TaskBoard, TaskId,
    TaskToggled, TokenPair, UserProfile,
};

/// Filters for `GET /courses/`. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub search: String,
    pub role: String,
}

impl CourseQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            role: String::new(),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        let role = self.role.trim();
        if !role.is_empty() {
            params.push(("role", role.to_string()));
        }
        params
    }
}

impl ApiClient {
    // ---------- auth & accounts ----------

    /// Exchanges credentials for a token pair. Does not touch the store.
    ///
    /// # Errors
    /// Returns `Unauthorized` for bad credentials, or a transport error.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<TokenPair> {
        self.post_public("auth/login/", &LoginRequest { username, password })
            .await
    }

    /// # Errors
    /// Returns `Validation` with field messages when the account is rejected.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<RegisteredUser> {
        self.post_public("accounts/register/", request).await
    }

    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.get("accounts/profile/").await
    }

    /// # Errors
    /// See [`ApiClient::put`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        self.put("accounts/profile/", update).await
    }

    // ---------- courses ----------

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn courses(&self, query: &CourseQuery) -> ApiResult<Vec<Course>> {
        self.get_list("courses/", &query.params()).await
    }

    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn course(&self, id: CourseId) -> ApiResult<CourseDetail> {
        self.get(&format!("courses/{id}/")).await
    }

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn progress(&self) -> ApiResult<Vec<ProgressRecord>> {
        self.get_list("courses/progress/", &[]).await
    }

    /// # Errors
    /// See [`ApiClient::post_empty`].
    pub async fn complete_lesson(&self, course: CourseId, lesson: LessonId) -> ApiResult<Detail> {
        self.post_empty(&format!("courses/{course}/lessons/{lesson}/complete/"))
            .await
    }

    /// # Errors
    /// See [`ApiClient::post_empty`].
    pub async fn uncomplete_lesson(
        &self,
        course: CourseId,
        lesson: LessonId,
    ) -> ApiResult<Detail> {
        self.post_empty(&format!("courses/{course}/lessons/{lesson}/uncomplete/"))
            .await
    }

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn reviews(&self, course: CourseId) -> ApiResult<Vec<Review>> {
        self.get_list(&format!("courses/{course}/reviews/"), &[])
            .await
    }

    /// # Errors
    /// Returns `Validation` for an out-of-range rating or a duplicate review.
    pub async fn submit_review(&self, course: CourseId, review: &NewReview) -> ApiResult<Review> {
        self.post(&format!("courses/{course}/reviews/"), review)
            .await
    }

    // ---------- quiz ----------

    /// # Errors
    /// Returns `NotFound` when the course has no quiz.
    pub async fn quiz(&self, course: CourseId) -> ApiResult<Quiz> {
        self.get(&format!("courses/{course}/quiz/")).await
    }

    /// # Errors
    /// See [`ApiClient::post`].
    pub async fn submit_quiz(
        &self,
        course: CourseId,
        submission: &QuizSubmission,
    ) -> ApiResult<QuizResult> {
        self.post(&format!("courses/{course}/quiz/submit/"), submission)
            .await
    }

    // ---------- onboarding tasks & feeds ----------

    /// # Errors
    /// See [`ApiClient::get`].
    pub async fn tasks(&self) -> ApiResult<TaskBoard> {
        self.get("courses/integration/tasks/").await
    }

    /// # Errors
    /// See [`ApiClient::post_empty`].
    pub async fn toggle_task(&self, task: TaskId) -> ApiResult<TaskToggled> {
        self.post_empty(&format!("courses/integration/tasks/{task}/toggle/"))
            .await
    }

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn activities(&self) -> ApiResult<Vec<Activity>> {
        self.get_list("courses/activities/", &[]).await
    }

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn achievements(&self) -> ApiResult<Vec<Achievement>> {
        self.get_list("courses/achievements/", &[]).await
    }

    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn recommended(&self) -> ApiResult<Vec<Course>> {
        self.get_list("courses/recommended/", &[]).await
    }

    // ---------- staff ----------

    /// # Errors
    /// Returns `Forbidden` for non-staff users.
    pub async fn admin_progress(&self) -> ApiResult<Vec<AdminProgressRecord>> {
        self.get_list("courses/admin/progress/", &[]).await
    }

    /// # Errors
    /// Returns `Forbidden` for non-staff users and `Validation` for bad input.
    pub async fn create_course(&self, course: &NewCourse) -> ApiResult<CreatedCourse> {
        self.post("courses/manage/", course).await
    }
}
