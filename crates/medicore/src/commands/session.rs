//! Session entry: probe, guard, and login on redirect.

use medicore_core::{Console, CoreError, GuardDecision, Principal, Route};

use crate::cli::GlobalOpts;
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

use super::util;

/// Bring the session up far enough to show `route`.
///
/// Runs the start-up probe, then asks the guard. A redirect to the login
/// view logs in with the profile's credentials (or prompts for them) and
/// asks again. Returns the view the guard finally renders.
pub async fn enter(
    console: &Console,
    route: Route,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<Route, CliError> {
    let mut guard = console.guard();

    let pb = util::spinner("Checking session...", global.quiet);
    console.bootstrap().await;
    pb.finish_and_clear();

    match guard.settle(route).await {
        GuardDecision::Render(r) => Ok(r),
        GuardDecision::Redirect(Route::Login) => {
            login(console, resolved, global).await?;
            match guard.check(route) {
                GuardDecision::Render(r) | GuardDecision::Redirect(r) => Ok(r),
                GuardDecision::Placeholder => Err(CliError::Internal(
                    "session still resolving after login".into(),
                )),
            }
        }
        GuardDecision::Redirect(other) => Ok(other),
        GuardDecision::Placeholder => Err(CliError::Internal(
            "session still resolving after start-up probe".into(),
        )),
    }
}

/// Log in with resolved credentials and map failures to the profile.
pub async fn login(
    console: &Console,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let credentials = config::login_credentials(resolved)?;
    let pb = util::spinner("Logging in...", global.quiet);
    let result = console.authenticate(&credentials).await;
    pb.finish_and_clear();

    match result {
        Ok(_) => Ok(()),
        Err(CoreError::AuthenticationFailed { message } | CoreError::Rejected { message, .. }) => {
            Err(CliError::AuthFailed {
                profile: resolved.profile_name.clone(),
                message,
            })
        }
        Err(other) => Err(other.into()),
    }
}

/// Print the signed-in administrator.
pub fn whoami(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let session = console.session().current();
    let principal = session.principal().ok_or(CliError::NotAuthenticated)?;
    let out = output::render_single(
        &global.output,
        principal.as_ref(),
        detail,
        |p| p.email.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(p: &Principal) -> String {
    [
        format!("Name:   {}", p.display_name()),
        format!("Email:  {}", p.email),
        format!("Role:   {}", p.role.as_deref().unwrap_or("-")),
        format!("ID:     {}", p.id),
    ]
    .join("\n")
}
