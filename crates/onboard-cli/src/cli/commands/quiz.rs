//! Final quiz.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use onboard_core::views::quiz::QuizView;

use super::{App, ready};

/// Parses `QUESTION_ID=ANSWER_ID`.
pub fn parse_answer(value: &str) -> Result<(u64, u64), String> {
    let (question, answer) = value
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION_ID=ANSWER_ID, got '{value}'"))?;
    let question = question
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid question id '{}': {err}", question.trim()))?;
    let answer = answer
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid answer id '{}': {err}", answer.trim()))?;
    Ok((question, answer))
}

async fn load(app: &App, course: u64) -> Result<QuizView> {
    let mut view = QuizView::new(app.client.clone(), Arc::clone(&app.session), course);
    if ready(view.load().await)
        .with_context(|| format!("load quiz for course {course}"))?
        .is_none()
    {
        bail!("Course {course} has no quiz");
    }
    Ok(view)
}

pub async fn show(app: &App, course: u64) -> Result<()> {
    let view = load(app, course).await?;
    let Some(quiz) = ready(view.state())? else {
        return Ok(());
    };
    println!("{}", quiz.title);
    for (index, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. {} (question {})", index + 1, question.text, question.id);
        for answer in &question.answers {
            println!("   [{}] {}", answer.id, answer.text);
        }
    }
    println!("\nSubmit with: onboard quiz submit {course} --answer QUESTION_ID=ANSWER_ID ...");
    Ok(())
}

pub async fn submit(app: &App, course: u64, answers: &[(u64, u64)]) -> Result<()> {
    let mut view = load(app, course).await?;
    for &(question, answer) in answers {
        view.select(question, answer)?;
    }
    let unanswered = view.unanswered();
    if !unanswered.is_empty() {
        eprintln!(
            "Warning: {} question(s) left unanswered: {}",
            unanswered.len(),
            unanswered
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let result = view.submit().await.context("submit quiz")?;
    println!("Score: {} / {}", result.score, result.total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("3=12"), Ok((3, 12)));
        assert_eq!(parse_answer(" 3 = 12 "), Ok((3, 12)));
        assert!(parse_answer("3").is_err());
        assert!(parse_answer("x=1").is_err());
    }
}
