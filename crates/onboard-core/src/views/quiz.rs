//! Final course quiz.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::LoadState;
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::models::{AnswerId, CourseId, QuestionId, Quiz, QuizResult, QuizSubmission};
use crate::session::Session;

pub struct QuizView {
    client: ApiClient,
    session: Arc<Session>,
    course: CourseId,
    /// `Ready(None)` when the course has no quiz
    state: LoadState<Option<Quiz>>,
    answers: BTreeMap<QuestionId, AnswerId>,
    result: Option<QuizResult>,
}

impl QuizView {
    pub fn new(client: ApiClient, session: Arc<Session>, course: CourseId) -> Self {
        Self {
            client,
            session,
            course,
            state: LoadState::Loading,
            answers: BTreeMap::new(),
            result: None,
        }
    }

    pub fn state(&self) -> &LoadState<Option<Quiz>> {
        &self.state
    }

    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    pub async fn load(&mut self) -> &LoadState<Option<Quiz>> {
        self.state = LoadState::Loading;
        self.answers.clear();
        self.result = None;

        let result = match self.session.require_auth() {
            Ok(()) => match self.client.quiz(self.course).await {
                Ok(quiz) => Ok(Some(quiz)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.state = LoadState::from_result(result);
        &self.state
    }

    fn quiz(&self) -> Option<&Quiz> {
        self.state.ready().and_then(Option::as_ref)
    }

    /// Records the chosen answer for a question, replacing any earlier choice.
    ///
    /// # Errors
    /// Returns `Validation` when the question or answer is not part of the quiz.
    pub fn select(&mut self, question: QuestionId, answer: AnswerId) -> ApiResult<()> {
        let quiz = self
            .quiz()
            .ok_or_else(|| ApiError::new(ApiErrorKind::NotFound, "No quiz loaded"))?;
        let Some(q) = quiz.questions.iter().find(|q| q.id == question) else {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                format!("Question {question} is not part of this quiz"),
            ));
        };
        if !q.answers.iter().any(|a| a.id == answer) {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                format!("Answer {answer} is not an option for question {question}"),
            ));
        }
        self.answers.insert(question, answer);
        Ok(())
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerId> {
        &self.answers
    }

    /// Questions that have no selected answer yet, in quiz order.
    pub fn unanswered(&self) -> Vec<QuestionId> {
        self.quiz().map_or_else(Vec::new, |quiz| {
            quiz.questions
                .iter()
                .map(|q| q.id)
                .filter(|id| !self.answers.contains_key(id))
                .collect()
        })
    }

    /// Submits the selected answers; the server scores them.
    ///
    /// # Errors
    /// Returns the submission failure.
    pub async fn submit(&mut self) -> ApiResult<QuizResult> {
        self.session.require_auth()?;
        let submission = QuizSubmission {
            answers: self.answers.clone(),
        };
        let result = self.client.submit_quiz(self.course, &submission).await?;
        tracing::info!(course = self.course, score = result.score, total = result.total, "quiz submitted");
        self.result = Some(result);
        Ok(result)
    }
}
