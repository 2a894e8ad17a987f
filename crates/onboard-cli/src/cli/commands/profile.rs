//! Profile commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use onboard_core::models::UserProfile;
use onboard_core::views::profile::ProfileView;

use super::render::or_dash;
use super::{App, ready};

/// Fields accepted by `profile update`; omitted ones are left unchanged.
#[derive(clap::Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    mentor: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// Date you joined the company (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    joined: Option<String>,
    #[arg(long)]
    avatar: Option<String>,
}

fn print_profile(user: &UserProfile) {
    let details = user.profile.clone().unwrap_or_default();
    println!("{} ({})", user.display_name(), user.username);
    println!("Email:      {}", or_dash(Some(user.email.as_str())));
    println!(
        "Role:       {}",
        if user.is_staff { "staff" } else { "employee" }
    );
    println!("Department: {}", or_dash(details.department.as_deref()));
    println!("Mentor:     {}", or_dash(details.mentor_name.as_deref()));
    println!("City:       {}", or_dash(details.city.as_deref()));
    println!("Joined:     {}", or_dash(details.date_joined_company.as_deref()));
    println!("Avatar:     {}", or_dash(details.avatar.as_deref()));
}

pub async fn show(app: &App) -> Result<()> {
    let mut view = ProfileView::new(app.client.clone(), Arc::clone(&app.session));
    print_profile(ready(view.load().await)?);
    Ok(())
}

pub async fn update(app: &App, args: UpdateArgs) -> Result<()> {
    let mut view = ProfileView::new(app.client.clone(), Arc::clone(&app.session));
    ready(view.load().await)?;

    let mut draft = view.draft();
    let set = |slot: &mut String, value: Option<String>| {
        if let Some(value) = value {
            *slot = value.trim().to_string();
        }
    };
    set(&mut draft.first_name, args.first_name);
    set(&mut draft.last_name, args.last_name);
    set(&mut draft.email, args.email);

    let details = &mut draft.profile;
    for (slot, value) in [
        (&mut details.department, args.department),
        (&mut details.mentor_name, args.mentor),
        (&mut details.city, args.city),
        (&mut details.date_joined_company, args.joined),
        (&mut details.avatar, args.avatar),
    ] {
        if let Some(value) = value {
            let value = value.trim();
            *slot = (!value.is_empty()).then(|| value.to_string());
        }
    }

    let user = view.update(&draft).await.context("update profile")?;
    println!("Profile saved.");
    print_profile(&user);
    Ok(())
}
