//! CLI flag overrides on top of `medicore-config` profiles.
//!
//! Core never sees these types -- it receives a pre-built `ConsoleConfig`.

use medicore_config::{self as config, Config, Profile};
use medicore_core::{ConsoleConfig, LoginCredentials};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Profile selected by `--profile`, else the config's default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// A resolved profile plus the console config built from it.
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub console: ConsoleConfig,
}

/// Load the config file, pick the profile, and apply CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let (profile_name, mut profile) = cfg.profile(Some(&profile_name))?;

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }

    let mut console = config::profile_to_console_config(&profile, &profile_name)?;
    if global.no_cache {
        console.cache_dir = None;
    }

    Ok(Resolved {
        profile_name,
        profile,
        console,
    })
}

/// Credentials from the profile chain, or prompted for on a terminal.
pub fn login_credentials(resolved: &Resolved) -> Result<LoginCredentials, CliError> {
    if let Some(creds) = resolved.console.credentials.clone() {
        return Ok(creds);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NotAuthenticated);
    }

    let email = match config::resolve_email(&resolved.profile) {
        Some(email) => email,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Admin email")
            .interact_text()
            .map_err(crate::commands::util::prompt_err)?,
    };
    let password = match config::resolve_password(&resolved.profile) {
        Some(pw) => pw,
        None => rpassword::prompt_password(format!("Password for {email}: "))?.into(),
    };
    Ok(LoginCredentials { email, password })
}
