//! Login, logout and registration.

use anyhow::{Context, Result};
use onboard_core::models::RegisterRequest;
use onboard_core::views::register;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::App;

/// Reads one line from stdin (for passwords piped or typed in).
async fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password().await?,
    };
    app.session
        .authenticate(&app.client, username.trim(), &password)
        .await
        .context("login failed")?;
    println!("Logged in as {}.", username.trim());
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    let was_logged_in = app.session.state().has_credentials();
    app.session.logout().context("clear credentials")?;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub async fn register(
    app: &App,
    username: String,
    email: String,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password().await?,
    };
    let request = RegisterRequest {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password,
    };
    let user = register::register(&app.client, &request)
        .await
        .context("registration failed")?;
    println!(
        "Account '{}' created. Run `onboard login -u {}` to sign in.",
        user.username, user.username
    );
    Ok(())
}
