//! Staff commands.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use onboard_core::views::admin::AdminProgressView;
use onboard_core::views::builder::{CourseBuilder, CourseDraft};

use super::render::{bar, percent, table};
use super::{App, ready};

pub async fn progress(app: &App) -> Result<()> {
    let mut view = AdminProgressView::new(app.client.clone(), Arc::clone(&app.session));
    let records = ready(view.load().await)?;
    if records.is_empty() {
        println!("No progress recorded yet.");
        return Ok(());
    }
    let mut rows = table(&["User", "Course", "Progress", ""]);
    for record in records {
        rows.add_row(vec![
            record.user.clone(),
            record.course.title.clone(),
            bar(record.progress),
            percent(record.progress),
        ]);
    }
    println!("{rows}");
    Ok(())
}

/// Builds a draft from CLI input; each lesson is `title|content|video_url`.
pub fn draft(
    title: String,
    role: String,
    description: String,
    image_url: String,
    lessons: &[String],
) -> Result<CourseDraft> {
    let mut draft = CourseDraft {
        title,
        description,
        role,
        image_url,
        lessons: Vec::new(),
    };
    for raw in lessons {
        let mut parts = raw.splitn(3, '|');
        let title = parts.next().unwrap_or_default().trim();
        let content = parts.next().unwrap_or_default().trim();
        let video = parts.next().unwrap_or_default().trim();
        if title.is_empty() && !content.is_empty() {
            bail!("Lesson '{raw}' has content but no title");
        }
        draft.push_lesson(title, content, video);
    }
    Ok(draft)
}

pub async fn create_course(app: &App, draft: CourseDraft) -> Result<()> {
    let mut builder = CourseBuilder::new(app.client.clone(), Arc::clone(&app.session));
    ready(builder.load().await)?;
    let created = builder.create(draft).await.context("create course")?;
    match created.id {
        Some(id) => println!("Created course #{id} '{}'.", created.title),
        None => println!("Created course '{}'.", created.title),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_parses_lessons() {
        let draft = draft(
            "Safety".to_string(),
            "welder".to_string(),
            String::new(),
            String::new(),
            &[
                "Intro|Read the handbook".to_string(),
                "Gear|Helmets|https://video.example/gear".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(draft.lessons.len(), 2);
        assert_eq!(draft.lessons[0].content, "Read the handbook");
        assert_eq!(draft.lessons[1].video_url, "https://video.example/gear");
        assert_eq!(draft.lessons[1].order, 2);
    }

    #[test]
    fn test_draft_rejects_untitled_content() {
        let result = draft(
            "Safety".to_string(),
            "welder".to_string(),
            String::new(),
            String::new(),
            &["|orphan content".to_string()],
        );
        assert!(result.is_err());
    }
}
