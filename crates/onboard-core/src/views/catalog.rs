//! Course catalog with debounced search, role and status filters.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::{LoadId, LoadState, SearchLoader, or_default};
use crate::api::{ApiClient, ApiResult, CourseQuery};
use crate::models::{Course, CourseDetail, CourseId, ProgressRecord};
use crate::session::Session;

/// Completion status derived from the user's progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CourseStatus {
    pub fn from_record(record: Option<&ProgressRecord>) -> Self {
        match record {
            None => CourseStatus::NotStarted,
            Some(record) if record.progress >= 100.0 => CourseStatus::Completed,
            Some(_) => CourseStatus::InProgress,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::NotStarted => "not_started",
            CourseStatus::InProgress => "in_progress",
            CourseStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" => Ok(CourseStatus::NotStarted),
            "in_progress" => Ok(CourseStatus::InProgress),
            "completed" => Ok(CourseStatus::Completed),
            other => Err(format!(
                "unknown status '{other}' (expected not_started, in_progress or completed)"
            )),
        }
    }
}

/// Aggregate of the user's progress across courses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSummary {
    pub average_progress: f64,
    pub minutes_remaining: i64,
    pub streak: u32,
    /// At least one course has no minutes left for today
    pub goal_met: bool,
}

impl ProgressSummary {
    pub fn from_records(records: &[ProgressRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let total: f64 = records.iter().map(|r| r.progress).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_progress = total / records.len() as f64;
        Some(Self {
            average_progress,
            minutes_remaining: records
                .iter()
                .map(|r| r.minutes_remaining.unwrap_or(0).max(0))
                .sum(),
            streak: records
                .iter()
                .filter_map(|r| r.daily_streak)
                .max()
                .unwrap_or(0),
            goal_met: records
                .iter()
                .any(|r| r.minutes_remaining.unwrap_or(0) == 0),
        })
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub course: &'a Course,
    pub status: CourseStatus,
    pub progress: f64,
}

pub struct Catalog {
    client: ApiClient,
    session: Arc<Session>,
    search: SearchLoader<Vec<Course>>,
    query: CourseQuery,
    courses: LoadState<Vec<Course>>,
    progress: Vec<ProgressRecord>,
    filter: Option<CourseStatus>,
    details: HashMap<CourseId, CourseDetail>,
    expanded: Option<CourseId>,
}

impl Catalog {
    pub fn new(client: ApiClient, session: Arc<Session>, debounce: Duration) -> Self {
        Self {
            client,
            session,
            search: SearchLoader::new(debounce),
            query: CourseQuery::default(),
            courses: LoadState::Loading,
            progress: Vec::new(),
            filter: None,
            details: HashMap::new(),
            expanded: None,
        }
    }

    /// Loads progress records and schedules the initial course list.
    ///
    /// # Errors
    /// Returns `LoginRequired` when the session has no credentials.
    pub async fn mount(&mut self, query: CourseQuery) -> ApiResult<LoadId> {
        self.session.require_auth()?;
        self.query = query;
        let id = self.submit();
        self.progress = or_default("progress", self.client.progress().await)?;
        Ok(id)
    }

    /// Starts a new debounced search, superseding the pending one.
    pub fn set_search(&mut self, text: &str) -> LoadId {
        self.query.search = text.to_string();
        self.submit()
    }

    pub fn set_role(&mut self, role: &str) -> LoadId {
        self.query.role = role.to_string();
        self.submit()
    }

    pub fn query(&self) -> &CourseQuery {
        &self.query
    }

    fn submit(&mut self) -> LoadId {
        // Never show the previous list as the answer to a new query.
        self.courses = LoadState::Loading;
        let client = self.client.clone();
        let query = self.query.clone();
        self.search
            .submit(async move { client.courses(&query).await })
    }

    /// Waits for the latest search to finish and applies it; see [`Catalog::courses`].
    pub async fn next_result(&mut self) -> LoadId {
        let (id, result) = self.search.next_applied().await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "course search failed");
        }
        self.courses = LoadState::from_result(result);
        id
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_pending()
    }

    pub fn courses(&self) -> &LoadState<Vec<Course>> {
        &self.courses
    }

    pub fn set_filter(&mut self, filter: Option<CourseStatus>) {
        self.filter = filter;
    }

    pub fn record_for(&self, course: CourseId) -> Option<&ProgressRecord> {
        self.progress.iter().find(|r| r.course.id == course)
    }

    /// Courses passing the status filter, in server order.
    pub fn entries(&self) -> Vec<CatalogEntry<'_>> {
        let Some(courses) = self.courses.ready() else {
            return Vec::new();
        };
        courses
            .iter()
            .map(|course| {
                let record = self.record_for(course.id);
                CatalogEntry {
                    course,
                    status: CourseStatus::from_record(record),
                    progress: record.map_or(0.0, |r| r.progress),
                }
            })
            .filter(|entry| self.filter.is_none_or(|status| entry.status == status))
            .collect()
    }

    pub fn summary(&self) -> Option<ProgressSummary> {
        ProgressSummary::from_records(&self.progress)
    }

    /// Expands a course (fetching its detail once) or collapses it if already open.
    ///
    /// # Errors
    /// Returns the detail fetch failure; the catalog itself is unaffected.
    pub async fn toggle_expand(&mut self, id: CourseId) -> ApiResult<Option<&CourseDetail>> {
        if self.expanded == Some(id) {
            self.expanded = None;
            return Ok(None);
        }
        if !self.details.contains_key(&id) {
            let detail = self.client.course(id).await?;
            self.details.insert(id, detail);
        }
        self.expanded = Some(id);
        Ok(self.details.get(&id))
    }

    pub fn expanded(&self) -> Option<&CourseDetail> {
        self.expanded.and_then(|id| self.details.get(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(course: CourseId, progress: f64, remaining: Option<i64>) -> ProgressRecord {
        ProgressRecord {
            course: Course {
                id: course,
                ..Course::default()
            },
            progress,
            minutes_remaining: remaining,
            ..ProgressRecord::default()
        }
    }

    #[test]
    fn test_status_from_record() {
        assert_eq!(CourseStatus::from_record(None), CourseStatus::NotStarted);
        assert_eq!(
            CourseStatus::from_record(Some(&record(1, 0.0, None))),
            CourseStatus::InProgress
        );
        assert_eq!(
            CourseStatus::from_record(Some(&record(1, 100.0, None))),
            CourseStatus::Completed
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in-progress".parse::<CourseStatus>(), Ok(CourseStatus::InProgress));
        assert_eq!("Completed".parse::<CourseStatus>(), Ok(CourseStatus::Completed));
        assert!("done".parse::<CourseStatus>().is_err());
    }

    #[test]
    fn test_progress_summary() {
        let records = [
            record(1, 50.0, Some(10)),
            record(2, 100.0, Some(0)),
            ProgressRecord {
                daily_streak: Some(3),
                ..record(3, 0.0, Some(20))
            },
        ];
        let summary = ProgressSummary::from_records(&records).unwrap();
        assert!((summary.average_progress - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.minutes_remaining, 30);
        assert_eq!(summary.streak, 3);
        assert!(summary.goal_met);
    }
}
