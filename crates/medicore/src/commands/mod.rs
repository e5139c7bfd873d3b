//! Command dispatch: bridges CLI args -> console operations -> output formatting.

pub mod admin;
pub mod appointments;
pub mod config_cmd;
pub mod dashboard;
pub mod doctors;
pub mod messages;
pub mod open;
pub mod session;
pub mod shell;
pub mod util;

use medicore_core::{Console, Route};

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
///
/// Every command enters through the route guard first, so an anonymous
/// session is logged in (or rejected) before any collection is touched.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // The shell prints notices as they arrive
    if matches!(cmd, Command::Shell) {
        return shell::run(console, resolved, global).await;
    }

    let notices = util::NoticePrinter::new(console, global);
    let result = run_command(cmd, console, resolved, global).await;
    notices.drain();
    result
}

async fn run_command(
    cmd: Command,
    console: &Console,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Open { path } => open::handle(console, &path, resolved, global).await,
        cmd => {
            let route = route_for(&cmd);
            session::enter(console, route, resolved, global).await?;
            match cmd {
                Command::Whoami => session::whoami(console, global),
                Command::Dashboard => dashboard::handle(console, global).await,
                Command::Doctors(args) => doctors::handle(console, args, global).await,
                Command::Messages(args) => messages::handle(console, args, global).await,
                Command::Appointments(args) => appointments::handle(console, args, global).await,
                Command::Admin(args) => admin::handle(console, args).await,
                // Shell, Open and Config are handled above
                Command::Shell | Command::Open { .. } | Command::Config(_) => unreachable!(),
            }
        }
    }
}

/// The console view a one-shot command stands in for.
fn route_for(cmd: &Command) -> Route {
    use crate::cli::{AdminCommand, DoctorsCommand};

    match cmd {
        Command::Doctors(args) => match args.command {
            DoctorsCommand::List { .. } => Route::Doctors,
            DoctorsCommand::Add(_) => Route::AddDoctor,
        },
        Command::Messages(_) => Route::Messages,
        Command::Admin(args) => match args.command {
            AdminCommand::Add(_) => Route::AddAdmin,
        },
        _ => Route::Dashboard,
    }
}
