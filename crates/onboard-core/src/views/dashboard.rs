//! Personal dashboard: profile, course progress, onboarding checklist and feeds.

use std::sync::Arc;

use super::{LoadState, or_default};
use crate::api::{ApiClient, ApiResult};
use crate::models::{
    Achievement, Activity, Course, ProgressRecord, TaskBoard, TaskId, UserProfile,
};
use crate::session::Session;

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub profile: UserProfile,
    pub progress: Vec<ProgressRecord>,
    pub tasks: TaskBoard,
    pub activities: Vec<Activity>,
    pub achievements: Vec<Achievement>,
    pub recommended: Vec<Course>,
}

impl DashboardData {
    pub fn daily_summary(&self) -> Option<DailySummary> {
        DailySummary::from_records(&self.progress)
    }
}

/// Today's goals across all enrolled courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySummary {
    pub remaining_minutes: i64,
    pub completed_goals: usize,
    pub total_courses: usize,
    pub longest_streak: u32,
}

impl DailySummary {
    /// Returns `None` when the user has no progress records.
    pub fn from_records(records: &[ProgressRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let mut summary = Self {
            remaining_minutes: 0,
            completed_goals: 0,
            total_courses: records.len(),
            longest_streak: 0,
        };
        for record in records {
            let remaining = remaining_today(record);
            summary.remaining_minutes += remaining;
            if remaining == 0 {
                summary.completed_goals += 1;
            }
            summary.longest_streak = summary
                .longest_streak
                .max(record.daily_streak.unwrap_or(0));
        }
        Some(summary)
    }
}

/// Minutes left towards today's goal for one course, never negative.
pub fn remaining_today(record: &ProgressRecord) -> i64 {
    record
        .minutes_remaining
        .or_else(|| record.daily_goal_minutes.map(i64::from))
        .unwrap_or(0)
        .max(0)
}

pub struct Dashboard {
    client: ApiClient,
    session: Arc<Session>,
    state: LoadState<DashboardData>,
}

impl Dashboard {
    pub fn new(client: ApiClient, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<DashboardData> {
        &self.state
    }

    /// Loads the profile, then the five independent sections in parallel.
    ///
    /// Only the profile is required; the other sections fall back to empty.
    pub async fn load(&mut self) -> &LoadState<DashboardData> {
        self.state = LoadState::Loading;
        let result = fetch(&self.client, &self.session).await;
        self.state = LoadState::from_result(result);
        &self.state
    }

    /// Flips a checklist item, optimistically, then re-reads the checklist.
    ///
    /// The server's answer always replaces the optimistic value. If both the
    /// toggle and the re-read fail, the flip is reverted. A toggle rejected
    /// for lack of credentials is reverted without a re-read.
    ///
    /// # Errors
    /// Returns the toggle failure, if any.
    pub async fn toggle_task(&mut self, task_id: TaskId) -> ApiResult<()> {
        self.session.require_auth()?;
        self.flip_local(task_id);

        let toggled = self.client.toggle_task(task_id).await;
        if let Err(err) = &toggled {
            tracing::warn!(task_id, error = %err, "task toggle failed");
            if err.requires_login() {
                // Credentials are gone; a re-read would only be rejected too.
                self.flip_local(task_id);
                return toggled.map(|_| ());
            }
        }

        match self.client.tasks().await {
            Ok(board) => {
                if let LoadState::Ready(data) = &mut self.state {
                    data.tasks = board;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to re-read tasks after toggle");
                if toggled.is_err() {
                    self.flip_local(task_id);
                }
            }
        }

        toggled.map(|_| ())
    }

    fn flip_local(&mut self, task_id: TaskId) {
        if let LoadState::Ready(data) = &mut self.state
            && let Some(task) = data.tasks.tasks.iter_mut().find(|t| t.task_id == task_id)
        {
            task.completed = !task.completed;
        }
    }
}

async fn fetch(client: &ApiClient, session: &Session) -> ApiResult<DashboardData> {
    session.require_auth()?;
    let profile = client.profile().await?;

    let (progress, tasks, activities, achievements, recommended) = tokio::join!(
        client.progress(),
        client.tasks(),
        client.activities(),
        client.achievements(),
        client.recommended(),
    );

    Ok(DashboardData {
        profile,
        progress: or_default("progress", progress)?,
        tasks: or_default("tasks", tasks)?,
        activities: or_default("activities", activities)?,
        achievements: or_default("achievements", achievements)?,
        recommended: or_default("recommended", recommended)?,
    })
}
