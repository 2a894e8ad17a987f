//! Session inspection.

use std::sync::Arc;

use anyhow::Result;
use onboard_core::config::paths;
use onboard_core::session::SessionState;
use onboard_core::store::{mask_token, spawn_store_watcher};
use tokio_util::sync::CancellationToken;

use super::App;

fn describe(state: &SessionState) -> String {
    match (&state.access, &state.refresh) {
        (Some(access), Some(_)) => format!("Logged in (access {})", mask_token(access)),
        (Some(access), None) => format!(
            "Logged in (access {}, no refresh token)",
            mask_token(access)
        ),
        (None, Some(_)) => "Access token missing; it will be renewed on the next request".to_string(),
        (None, None) => "Not logged in".to_string(),
    }
}

pub fn show(app: &App) {
    println!("{}", describe(&app.session.state()));
    println!("API: {}", app.client.base_url());
    println!("Credentials: {}", paths::credentials_path().display());
}

/// Follows the credential file until Ctrl-C, printing every change.
pub async fn watch(app: &App) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = spawn_store_watcher(
        Arc::clone(&app.store),
        app.config.store_poll_interval(),
        cancel.clone(),
    );

    let mut changes = app.session.subscribe();
    println!("{}", describe(&changes.current()));

    loop {
        tokio::select! {
            state = changes.changed() => match state {
                Some(state) => println!("{}", describe(&state)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    cancel.cancel();
    let _ = watcher.await;
    Ok(())
}
