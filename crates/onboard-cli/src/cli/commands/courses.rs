//! Catalog, course page, lessons and reviews.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use onboard_core::api::CourseQuery;
use onboard_core::models::CourseDetail;
use onboard_core::views::catalog::{Catalog, CourseStatus};
use onboard_core::views::course::{CourseData, CourseView};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::render::{bar, check, percent, table, timestamp, truncate};
use super::{App, ready};

pub async fn list(app: &App, search: String, role: String, status: Option<&str>) -> Result<()> {
    let filter = status
        .map(str::parse::<CourseStatus>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    // One-shot listing: nothing to debounce.
    let mut catalog = Catalog::new(app.client.clone(), Arc::clone(&app.session), Duration::ZERO);
    catalog.mount(CourseQuery { search, role }).await?;
    catalog.next_result().await;
    catalog.set_filter(filter);
    print_catalog(&catalog)
}

/// Reads search terms line by line; only the latest query's result is printed.
pub async fn browse(app: &App, role: String) -> Result<()> {
    let mut catalog = Catalog::new(
        app.client.clone(),
        Arc::clone(&app.session),
        app.config.search_debounce(),
    );
    catalog
        .mount(CourseQuery {
            search: String::new(),
            role,
        })
        .await?;
    eprintln!("Type to search, one query per line. Ctrl-D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("read search input")? {
                    Some(text) => {
                        catalog.set_search(text.trim());
                    }
                    None => break,
                }
            }
            _ = catalog.next_result(), if catalog.is_searching() => {
                println!("\nResults for '{}':", catalog.query().search);
                print_catalog(&catalog)?;
            }
        }
    }

    // Show the answer to the last query before exiting.
    if catalog.is_searching() {
        catalog.next_result().await;
        println!("\nResults for '{}':", catalog.query().search);
        print_catalog(&catalog)?;
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog) -> Result<()> {
    ready(catalog.courses()).context("load courses")?;

    if let Some(summary) = catalog.summary() {
        let goal = if summary.goal_met {
            format!("daily goal met, streak {} d.", summary.streak)
        } else {
            format!("{} min left today", summary.minutes_remaining)
        };
        println!(
            "Average progress {} {}, {goal}",
            bar(summary.average_progress),
            percent(summary.average_progress)
        );
    }

    let entries = catalog.entries();
    if entries.is_empty() {
        println!("No courses found.");
        return Ok(());
    }
    let mut rows = table(&["ID", "Title", "Role", "Status", "Progress"]);
    for entry in entries {
        rows.add_row(vec![
            entry.course.id.to_string(),
            entry.course.title.clone(),
            entry.course.role.clone(),
            entry.status.to_string(),
            percent(entry.progress),
        ]);
    }
    println!("{rows}");
    Ok(())
}

async fn load_course(app: &App, id: u64) -> Result<CourseView> {
    let mut view = CourseView::new(app.client.clone(), Arc::clone(&app.session), id);
    ready(view.load().await).with_context(|| format!("load course {id}"))?;
    Ok(view)
}

pub async fn show(app: &App, id: u64, modules: bool) -> Result<()> {
    let view = load_course(app, id).await?;
    let data = ready(view.state())?;
    print_course(data, modules);
    Ok(())
}

fn print_course(data: &CourseData, modules: bool) {
    let detail = &data.detail;
    println!("#{} {} ({})", detail.id, detail.title, detail.role);
    if !detail.description.trim().is_empty() {
        println!("{}", detail.description.trim());
    }
    match detail.average_rating {
        Some(rating) => println!("Rating: {rating:.2} / 5"),
        None => println!("Nobody has rated this course yet."),
    }
    println!(
        "Status: {}  {} {}",
        data.status(),
        bar(data.progress),
        percent(data.progress)
    );

    print_lessons(data);
    if modules {
        print_modules(detail);
    }

    if detail.has_quiz {
        if data.quiz_available() {
            println!("\nFinal quiz unlocked: `onboard quiz show {}`", detail.id);
        } else {
            println!("\nFinish every lesson to unlock the final quiz.");
        }
    }

    println!("\nReviews");
    if data.reviews.is_empty() {
        println!("  No reviews yet.");
    }
    for review in &data.reviews {
        println!(
            "  {}/5 {} ({}): {}",
            review.rating,
            review.user,
            timestamp(review.created_at),
            review.comment
        );
    }
}

fn print_lessons(data: &CourseData) {
    let lessons = data.detail.ordered_lessons();
    if lessons.is_empty() {
        println!("\nThis course has no lessons yet.");
        return;
    }
    let mut rows = table(&["Done", "#", "ID", "Lesson", "Minutes", "Video"]);
    for lesson in lessons {
        rows.add_row(vec![
            check(data.is_completed(lesson.id)).to_string(),
            lesson.order.to_string(),
            lesson.id.to_string(),
            truncate(&lesson.title, 50),
            lesson
                .estimated_minutes
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
            lesson.video_url.clone().unwrap_or_default(),
        ]);
    }
    println!("{rows}");
}

fn print_modules(detail: &CourseDetail) {
    if detail.modules.is_empty() {
        println!("\nNo modules.");
        return;
    }
    let mut modules = detail.modules.clone();
    modules.sort_by_key(|m| (m.order, m.id));
    println!("\nModules");
    for module in &modules {
        let minutes = module
            .target_minutes
            .map(|m| format!(" (~{m} min)"))
            .unwrap_or_default();
        println!("  {}. {}{minutes}", module.order, module.title);
        for lesson in &module.lessons {
            println!("     - {}", lesson.title);
        }
    }
}

pub async fn set_lesson(app: &App, course: u64, lesson: u64, complete: bool) -> Result<()> {
    let mut view = load_course(app, course).await?;
    let data = ready(view.state())?;
    if !data.detail.lessons.iter().any(|l| l.id == lesson) {
        bail!("Lesson {lesson} is not part of course {course}");
    }

    if data.is_completed(lesson) == complete {
        let state = if complete { "complete" } else { "incomplete" };
        println!("Lesson {lesson} is already {state}.");
    } else {
        view.toggle_lesson(lesson)
            .await
            .with_context(|| format!("update lesson {lesson}"))?;
    }

    let data = ready(view.state())?;
    println!(
        "Course progress: {} {}",
        bar(data.progress),
        percent(data.progress)
    );
    if data.quiz_available() {
        println!("Final quiz unlocked: `onboard quiz show {course}`");
    }
    Ok(())
}

pub async fn review(app: &App, course: u64, rating: u8, comment: &str) -> Result<()> {
    let mut view = load_course(app, course).await?;
    match view.submit_review(rating, comment).await {
        Ok(_) => {}
        Err(err) => {
            if let Some(validation) = view.review_error() {
                bail!("Review rejected: {validation}");
            }
            return Err(err).context("submit review");
        }
    }

    let data = ready(view.state())?;
    println!("Thanks for your review.");
    if let Some(rating) = data.detail.average_rating {
        println!("Average rating is now {rating:.2} / 5 ({} reviews).", data.reviews.len());
    }
    Ok(())
}
