//! Shared helpers for command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use medicore_core::{Console, Notice, NoticeLevel};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Use the flag value if given, otherwise ask for it.
pub fn text_or_prompt(value: Option<String>, prompt: &str) -> Result<String, CliError> {
    if let Some(v) = value {
        return Ok(v);
    }
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_err)
}

/// Pick one of `choices`, or validate the flag value against them.
pub fn choice_or_select(
    value: Option<String>,
    prompt: &str,
    field: &str,
    choices: &[&str],
) -> Result<String, CliError> {
    if let Some(v) = value {
        return choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&v))
            .map(|c| (*c).to_owned())
            .ok_or_else(|| CliError::Validation {
                field: field.into(),
                reason: format!("expected one of: {}", choices.join(", ")),
            });
    }
    let idx = dialoguer::Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    choices
        .get(idx)
        .map(|c| (*c).to_owned())
        .ok_or_else(|| prompt_err("selection out of range"))
}

/// Initial password for a new account: flag/env value or a hidden prompt.
pub fn new_password(value: Option<String>) -> Result<SecretString, CliError> {
    let password = match value {
        Some(p) => p,
        None => rpassword::prompt_password("Initial password: ").map_err(prompt_err)?,
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password.into())
}

/// Spinner on stderr while a request is in flight. Hidden when quiet or
/// when stderr is not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Collects console notices and prints them to stderr on demand.
pub struct NoticePrinter {
    rx: broadcast::Receiver<Notice>,
    color: bool,
    quiet: bool,
}

impl NoticePrinter {
    pub fn new(console: &Console, global: &GlobalOpts) -> Self {
        Self {
            rx: console.notices().subscribe(),
            color: output::should_color(&global.color),
            quiet: global.quiet,
        }
    }

    /// Print everything raised since the last drain. Errors are always
    /// shown; the rest is suppressed by `--quiet`.
    pub fn drain(mut self) {
        self.flush();
    }

    pub fn flush(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(notice) => self.print(&notice),
                Err(TryRecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "notice receiver lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Wait for the next notice and print it. `false` once the console is gone.
    pub async fn print_next(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(notice) => {
                self.print(&notice);
                true
            }
            Err(RecvError::Lagged(n)) => {
                tracing::debug!(skipped = n, "notice receiver lagged");
                true
            }
            Err(RecvError::Closed) => false,
        }
    }

    fn print(&self, notice: &Notice) {
        if !self.quiet || notice.level == NoticeLevel::Error {
            output::print_notice(notice, self.color);
        }
    }
}

/// Fail when a mounted view has nothing to show, and flag stale data.
pub fn loaded<K>(
    snapshot: &medicore_core::CacheSnapshot<K>,
    what: &str,
    quiet: bool,
) -> Result<(), CliError> {
    if snapshot.state == medicore_core::CacheState::Unpopulated {
        return Err(CliError::FetchFailed { what: what.into() });
    }
    output::note_staleness(snapshot, quiet);
    Ok(())
}
