//! Interactive shell: one console session, live views.
//!
//! The shell keeps the current screen's views mounted, so a write made
//! here refreshes and redraws whatever collection is on screen. Notices
//! are printed as they arrive.

use std::io::{self, BufRead, Write};

use medicore_core::{
    AppointmentStatus, CollectionView, Console, Dashboard, Doctor, GuardDecision, Message, Route,
    RouteGuard,
};
use tokio::task::JoinHandle;

use crate::cli::{GlobalOpts, NewAdminArgs, NewDoctorArgs};
use crate::config::Resolved;
use crate::error::CliError;

use super::{admin, appointments, dashboard, doctors, messages, session, util};

const HELP: &str = "\
Navigation:
  dashboard | doctors | messages     show a view
  goto <path>                        show a view by path (/, /doctors, ...)
  refresh                            refetch the collections on screen
Session:
  login | logout | whoami
Actions:
  accept <id> | reject <id>          review an appointment
  status <id> <status>               set an appointment's status
  add-doctor | add-admin             register an account (prompts)
  view <message-id>                  read a message in full
  delete <message-id>                delete a message
Other:
  help | quit";

// ── Screens ─────────────────────────────────────────────────────────

/// What is on screen. Holding the views keeps them mounted.
enum Screen {
    Blank,
    Login,
    Dashboard(Dashboard),
    Doctors(CollectionView<Doctor>),
    Messages(CollectionView<Message>),
    Form(Route),
}

impl Screen {
    async fn mount(console: &Console, route: Route) -> Self {
        match route {
            Route::Login => Self::Login,
            Route::Dashboard => Self::Dashboard(console.dashboard().await),
            Route::Doctors => Self::Doctors(console.view_doctors().await),
            Route::Messages => Self::Messages(console.view_messages().await),
            Route::AddDoctor | Route::AddAdmin => Self::Form(route),
        }
    }

    fn route(&self) -> Option<Route> {
        match self {
            Self::Blank => None,
            Self::Login => Some(Route::Login),
            Self::Dashboard(_) => Some(Route::Dashboard),
            Self::Doctors(_) => Some(Route::Doctors),
            Self::Messages(_) => Some(Route::Messages),
            Self::Form(route) => Some(*route),
        }
    }

    /// Resolves when a mounted collection changes and has settled on a
    /// fetched result. Never resolves for screens without collections.
    async fn changed(&mut self) {
        loop {
            let populated = match self {
                Self::Dashboard(d) => tokio::select! {
                    s = d.appointments.changed() => s.map(|s| s.is_populated()),
                    s = d.doctors.changed() => s.map(|s| s.is_populated()),
                },
                Self::Doctors(v) => v.changed().await.map(|s| s.is_populated()),
                Self::Messages(v) => v.changed().await.map(|s| s.is_populated()),
                Self::Blank | Self::Login | Self::Form(_) => None,
            };
            match populated {
                Some(true) => return,
                Some(false) => {}
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn render(&mut self, global: &GlobalOpts) -> Result<(), CliError> {
        match self {
            Self::Blank => Ok(()),
            Self::Login => {
                eprintln!("Not logged in. Type `login` to sign in.");
                Ok(())
            }
            Self::Dashboard(d) => {
                d.appointments.catch_up();
                d.doctors.catch_up();
                dashboard::render(d, global)
            }
            Self::Doctors(v) => {
                let snapshot = v.catch_up();
                util::loaded(&snapshot, "doctors", global.quiet)?;
                doctors::print_doctors(snapshot.items(), global);
                Ok(())
            }
            Self::Messages(v) => {
                let snapshot = v.catch_up();
                util::loaded(&snapshot, "messages", global.quiet)?;
                messages::print_messages(snapshot.items(), global);
                Ok(())
            }
            Self::Form(route) => {
                let command = if *route == Route::AddDoctor {
                    "add-doctor"
                } else {
                    "add-admin"
                };
                eprintln!("Type `{command}` to fill in the form.");
                Ok(())
            }
        }
    }

    async fn refresh(&self) {
        // Failures surface as notices.
        match self {
            Self::Dashboard(d) => {
                let _ = tokio::join!(d.appointments.store().refresh(), d.doctors.store().refresh());
            }
            Self::Doctors(v) => {
                let _ = v.store().refresh().await;
            }
            Self::Messages(v) => {
                let _ = v.store().refresh().await;
            }
            Self::Blank | Self::Login | Self::Form(_) => {}
        }
    }
}

// ── Shell state ─────────────────────────────────────────────────────

struct Shell<'a> {
    console: &'a Console,
    resolved: &'a Resolved,
    global: &'a GlobalOpts,
    guard: RouteGuard,
    screen: Screen,
}

enum Flow {
    Continue,
    Quit,
}

impl<'a> Shell<'a> {
    fn new(console: &'a Console, resolved: &'a Resolved, global: &'a GlobalOpts) -> Self {
        Self {
            console,
            resolved,
            global,
            guard: console.guard(),
            screen: Screen::Blank,
        }
    }

    /// Show `requested`, or wherever the guard sends us instead.
    async fn navigate(&mut self, requested: Route) -> Result<(), CliError> {
        let route = match self.guard.check(requested) {
            GuardDecision::Render(route) => route,
            GuardDecision::Redirect(route) => {
                eprintln!("{requested} -> {route}");
                route
            }
            GuardDecision::Placeholder => {
                eprintln!("Still checking the session...");
                return Ok(());
            }
        };
        // Unmount before mounting so the old screen stops listening.
        self.screen = Screen::Blank;
        self.screen = Screen::mount(self.console, route).await;
        self.screen.render(self.global)
    }

    async fn execute(&mut self, line: &str) -> Result<Flow, CliError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("quit" | "exit" | "q", []) => return Ok(Flow::Quit),
            ("help" | "?", []) => println!("{HELP}"),

            ("dashboard" | "dash" | "home", []) => self.navigate(Route::Dashboard).await?,
            ("doctors", []) => self.navigate(Route::Doctors).await?,
            ("messages", []) => self.navigate(Route::Messages).await?,
            ("goto" | "open", [path]) => {
                let route = path.parse::<Route>().map_err(|_| CliError::UnknownView {
                    path: (*path).to_owned(),
                })?;
                self.navigate(route).await?;
            }
            ("refresh", []) => self.screen.refresh().await,

            ("login", []) => {
                session::login(self.console, self.resolved, self.global).await?;
                self.navigate(Route::HOME).await?;
            }
            ("logout", []) => {
                self.console.logout().await;
                let current = self.screen.route().unwrap_or(Route::HOME);
                self.navigate(current).await?;
            }
            ("whoami", []) => session::whoami(self.console, self.global)?,

            ("accept", [id]) => self.set_status(id, AppointmentStatus::Accepted).await?,
            ("reject", [id]) => self.set_status(id, AppointmentStatus::Rejected).await?,
            ("status", [id, status]) => {
                let status = status.parse::<AppointmentStatus>().map_err(|_| CliError::Validation {
                    field: "status".into(),
                    reason: "expected pending, accepted or rejected".into(),
                })?;
                self.set_status(id, status).await?;
            }
            ("add-doctor", []) => {
                self.require(Route::AddDoctor)?;
                let doctor = doctors::collect_new_doctor(NewDoctorArgs::default())?;
                self.console.add_doctor(&doctor).await?;
            }
            ("add-admin", []) => {
                self.require(Route::AddAdmin)?;
                let new_admin = admin::collect_new_admin(NewAdminArgs::default())?;
                self.console.add_admin(&new_admin).await?;
            }
            ("view", [id]) => {
                self.require(Route::Messages)?;
                let snapshot = match &self.screen {
                    Screen::Messages(v) => v.snapshot(),
                    _ => self.console.view_messages().await.snapshot(),
                };
                messages::show(&snapshot, id, self.global)?;
            }
            ("delete", [id]) => {
                if util::confirm(&format!("Delete message {id}?"), self.global.yes)? {
                    self.console.delete_message(id)?;
                }
            }

            _ => eprintln!("Unknown command `{line}`. Type `help` for a list."),
        }
        Ok(Flow::Continue)
    }

    async fn set_status(&mut self, id: &str, status: AppointmentStatus) -> Result<(), CliError> {
        self.require(Route::Dashboard)?;
        appointments::set_status(self.console, id, status).await
    }

    /// Actions run from views behind the guard.
    fn require(&self, route: Route) -> Result<(), CliError> {
        match self.guard.check(route) {
            GuardDecision::Render(_) => Ok(()),
            _ => Err(CliError::NotAuthenticated),
        }
    }
}

// ── Loop ────────────────────────────────────────────────────────────

fn read_line() -> JoinHandle<io::Result<Option<String>>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        Ok((n > 0).then_some(line))
    })
}

fn prompt() {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "medicore> ");
    let _ = stdout.flush();
}

fn report(err: CliError) {
    eprintln!("{:?}", miette::Report::new(err));
}

pub async fn run(
    console: &Console,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut notices = util::NoticePrinter::new(console, global);
    let mut shell = Shell::new(console, resolved, global);

    let pb = util::spinner("Checking session...", global.quiet);
    console.bootstrap().await;
    pb.finish_and_clear();

    if matches!(
        shell.guard.settle(Route::HOME).await,
        GuardDecision::Redirect(Route::Login)
    ) {
        if let Err(e) = session::login(console, resolved, global).await {
            notices.flush();
            report(e);
        }
    }
    notices.flush();
    if let Err(e) = shell.navigate(Route::HOME).await {
        report(e);
    }
    notices.flush();
    eprintln!("Type `help` for commands.");

    let mut pending = read_line();
    prompt();
    loop {
        tokio::select! {
            line = &mut pending => {
                let line = line.map_err(|e| CliError::Internal(e.to_string()))??;
                let Some(line) = line else {
                    break;
                };
                match shell.execute(line.trim()).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => {
                        notices.flush();
                        report(e);
                    }
                }
                notices.flush();
                pending = read_line();
                prompt();
            }
            () = shell.screen.changed() => {
                println!();
                if let Err(e) = shell.screen.render(global) {
                    report(e);
                }
                prompt();
            }
            open = notices.print_next() => {
                if !open {
                    break;
                }
                prompt();
            }
        }
    }
    Ok(())
}
