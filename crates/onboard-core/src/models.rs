//! REST payloads exchanged with the learning platform API.
//!
//! Field names follow the backend serializers. Optional fields default so
//! that older servers (which omit modules, streaks, etc.) still decode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CourseId = u64;
pub type LessonId = u64;
pub type TaskId = u64;
pub type QuestionId = u64;
pub type AnswerId = u64;

// ---------- auth & accounts ----------

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token pair returned by `POST /auth/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /auth/refresh/`. Servers with rotation also return a new refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedAccess {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDetails {
    pub department: Option<String>,
    pub mentor_name: Option<String>,
    pub date_joined_company: Option<String>,
    pub city: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub profile: Option<ProfileDetails>,
}

impl UserProfile {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of `PUT /accounts/profile/`; `username` and `is_staff` are read-only server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile: ProfileDetails,
}

impl From<&UserProfile> for ProfileUpdate {
    fn from(user: &UserProfile) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile: user.profile.clone().unwrap_or_default(),
        }
    }
}

// ---------- courses ----------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub role: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub order: u32,
    pub estimated_minutes: Option<u32>,
    pub module: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CourseModule {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub target_minutes: Option<u32>,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CourseDetail {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub role: String,
    pub image_url: Option<String>,
    pub lessons: Vec<Lesson>,
    pub modules: Vec<CourseModule>,
    pub average_rating: Option<f64>,
    pub has_quiz: bool,
}

impl CourseDetail {
    /// Lessons in display order.
    pub fn ordered_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|lesson| (lesson.order, lesson.id));
        lessons
    }
}

/// Progress of the current user in one course. `progress` is a percentage computed server-side.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub id: u64,
    pub course: Course,
    pub progress: f64,
    pub completed_lessons: Vec<LessonId>,
    pub daily_goal_minutes: Option<u32>,
    pub minutes_remaining: Option<i64>,
    pub daily_streak: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Review {
    pub id: u64,
    pub user: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

/// Generic `{"detail": "..."}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Detail {
    pub detail: Option<String>,
}

// ---------- quiz ----------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub answers: Vec<AnswerOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    pub questions: Vec<Question>,
}

/// Map of question id to chosen answer id. Keys serialize as strings in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    pub answers: BTreeMap<QuestionId, AnswerId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
}

// ---------- onboarding tasks & feeds ----------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserTask {
    pub task_id: TaskId,
    pub description: String,
    pub order: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Onboarding checklist with the server-computed completion percentage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskBoard {
    pub progress: f64,
    #[serde(alias = "results")]
    pub tasks: Vec<UserTask>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TaskToggled {
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: u64,
    pub action: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Achievement {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub awarded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdminProgressRecord {
    pub id: u64,
    pub user: String,
    pub course: Course,
    pub progress: f64,
}

// ---------- course authoring ----------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub video_url: String,
    pub image_url: String,
    pub module_title: String,
    pub estimated_minutes: u32,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub role: String,
    pub image_url: String,
    pub lessons: Vec<NewLesson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatedCourse {
    pub id: Option<CourseId>,
    pub title: String,
}

// ---------- list envelopes ----------

/// List endpoints answer either a bare array or a paginated `{"results": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListPayload<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Plain(items) | ListPayload::Paged { results: items } => items,
        }
    }
}
