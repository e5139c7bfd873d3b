//! `open <path>`: navigate to a console view by its path.

use medicore_core::{Console, Route};

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;

use super::{dashboard, doctors, messages, session};

pub async fn handle(
    console: &Console,
    path: &str,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let requested: Route = path.parse().map_err(|_| CliError::UnknownView {
        path: path.to_owned(),
    })?;

    let route = session::enter(console, requested, resolved, global).await?;
    if route == Route::Login {
        session::login(console, resolved, global).await?;
        return session::whoami(console, global);
    }
    if route != requested && !global.quiet {
        eprintln!("{requested} -> {route}");
    }
    show(console, route, global).await
}

/// Render a view once. Form views have nothing to show non-interactively
/// and point at the command that submits them.
pub async fn show(console: &Console, route: Route, global: &GlobalOpts) -> Result<(), CliError> {
    match route {
        Route::Dashboard => dashboard::handle(console, global).await,
        Route::Doctors => {
            let view = console.view_doctors().await;
            let snapshot = view.snapshot();
            super::util::loaded(&snapshot, "doctors", global.quiet)?;
            doctors::print_doctors(snapshot.items(), global);
            Ok(())
        }
        Route::Messages => {
            let view = console.view_messages().await;
            let snapshot = view.snapshot();
            super::util::loaded(&snapshot, "messages", global.quiet)?;
            messages::print_messages(snapshot.items(), global);
            Ok(())
        }
        Route::AddDoctor => hint("medicore doctors add", global),
        Route::AddAdmin => hint("medicore admin add", global),
        Route::Login => session::whoami(console, global),
    }
}

fn hint(command: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if !global.quiet {
        eprintln!("This view is a form. Run: {command}");
    }
    Ok(())
}
