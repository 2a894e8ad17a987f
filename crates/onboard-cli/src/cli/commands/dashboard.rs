//! Dashboard and onboarding checklist.

use std::sync::Arc;

use anyhow::Result;
use onboard_core::models::TaskBoard;
use onboard_core::views::dashboard::{Dashboard, DashboardData, remaining_today};

use super::render::{bar, check, or_dash, percent, table, timestamp, truncate};
use super::{App, ready};

pub async fn show(app: &App) -> Result<()> {
    let mut view = Dashboard::new(app.client.clone(), Arc::clone(&app.session));
    let data = ready(view.load().await)?;
    print_dashboard(data);
    Ok(())
}

fn print_dashboard(data: &DashboardData) {
    let profile = &data.profile;
    let details = profile.profile.clone().unwrap_or_default();
    let role = if profile.is_staff {
        "Administrator"
    } else {
        or_dash(details.department.as_deref())
    };
    println!("{} ({role}, login: {})", profile.display_name(), profile.username);
    println!(
        "Mentor: {}  City: {}  Joined: {}",
        or_dash(details.mentor_name.as_deref()),
        or_dash(details.city.as_deref()),
        or_dash(details.date_joined_company.as_deref()),
    );

    if let Some(summary) = data.daily_summary() {
        println!();
        println!(
            "Today: {} min left, {}/{} daily goals met, longest streak {} d.",
            summary.remaining_minutes,
            summary.completed_goals,
            summary.total_courses,
            summary.longest_streak
        );
    }

    println!("\nYour courses");
    if data.progress.is_empty() {
        println!("You have not started any course yet. Try `onboard courses list`.");
    } else {
        let mut courses = table(&["ID", "Course", "Progress", "", "Left today", "Streak"]);
        for record in &data.progress {
            courses.add_row(vec![
                record.course.id.to_string(),
                record.course.title.clone(),
                bar(record.progress),
                percent(record.progress),
                format!("{} min", remaining_today(record)),
                format!("{} d.", record.daily_streak.unwrap_or(0)),
            ]);
        }
        println!("{courses}");
    }
    if profile.is_staff {
        println!("You have staff access: see `onboard admin progress`.");
    }

    print_tasks(&data.tasks);

    if !data.activities.is_empty() {
        println!("\nRecent activity");
        for activity in data.activities.iter().take(10) {
            println!("  {}  {}", timestamp(activity.timestamp), activity.action);
        }
    }

    if !data.achievements.is_empty() {
        println!("\nAchievements");
        for achievement in &data.achievements {
            println!(
                "  {} {}: {}",
                check(achievement.awarded),
                achievement.name,
                achievement.description
            );
        }
    }

    if !data.recommended.is_empty() {
        println!("\nRecommended");
        for course in &data.recommended {
            println!(
                "  #{} {} ({}) {}",
                course.id,
                course.title,
                course.role,
                truncate(&course.description, 60)
            );
        }
    }
}

fn print_tasks(board: &TaskBoard) {
    println!("\nOnboarding checklist {} {}", bar(board.progress), percent(board.progress));
    if board.tasks.is_empty() {
        println!("No onboarding tasks.");
        return;
    }
    let mut tasks = board.tasks.clone();
    tasks.sort_by_key(|t| (t.order, t.task_id));
    let mut rows = table(&["ID", "Done", "Task", "Completed at"]);
    for task in &tasks {
        rows.add_row(vec![
            task.task_id.to_string(),
            check(task.completed).to_string(),
            task.description.clone(),
            timestamp(task.completed_at),
        ]);
    }
    println!("{rows}");
}

pub async fn tasks(app: &App) -> Result<()> {
    app.session.require_auth()?;
    let board = app.client.tasks().await?;
    print_tasks(&board);
    Ok(())
}

pub async fn toggle_task(app: &App, id: u64) -> Result<()> {
    let mut view = Dashboard::new(app.client.clone(), Arc::clone(&app.session));
    ready(view.load().await)?;
    view.toggle_task(id).await?;
    let data = ready(view.state())?;
    match data.tasks.tasks.iter().find(|t| t.task_id == id) {
        Some(task) if task.completed => println!("Task {id} marked done."),
        Some(_) => println!("Task {id} marked not done."),
        None => println!("Task {id} is no longer on the checklist."),
    }
    print_tasks(&data.tasks);
    Ok(())
}
