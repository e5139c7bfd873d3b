//! Clap derive structures for the `medicore` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use medicore_core::AppointmentStatus;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// medicore -- admin console for the MediCore clinic API
#[derive(Debug, Parser)]
#[command(
    name = "medicore",
    version,
    about = "Administer a MediCore clinic from the command line",
    long_about = "Admin console for the MediCore clinic-management API.\n\n\
        Lists doctors, patient messages and appointments, registers doctors\n\
        and administrators, and reviews appointment requests. Run `medicore shell`\n\
        for an interactive session that keeps views live across edits.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "MEDICORE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, env = "MEDICORE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Admin email (overrides profile)
    #[arg(long, short = 'e', global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MEDICORE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MEDICORE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Don't read or write the local collection cache
    #[arg(long, global = true)]
    pub no_cache: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and show the signed-in administrator
    #[command(alias = "login")]
    Whoami,

    /// Appointment totals and the latest requests
    #[command(alias = "dash")]
    Dashboard,

    /// Manage doctors
    #[command(alias = "doc")]
    Doctors(DoctorsArgs),

    /// Read patient messages
    #[command(alias = "msg")]
    Messages(MessagesArgs),

    /// Review appointment requests
    #[command(alias = "appt")]
    Appointments(AppointmentsArgs),

    /// Manage administrators
    Admin(AdminArgs),

    /// Open a console view by path (e.g. /doctors)
    Open {
        /// View path
        path: String,
    },

    /// Interactive session with live views
    Shell,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),
}

// ── Doctors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DoctorsArgs {
    #[command(subcommand)]
    pub command: DoctorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoctorsCommand {
    /// List registered doctors
    #[command(alias = "ls")]
    List {
        /// Only doctors in this department
        #[arg(long, short = 'd')]
        department: Option<String>,
    },

    /// Register a new doctor (prompts for missing fields)
    Add(NewDoctorArgs),
}

#[derive(Debug, Default, Args)]
pub struct NewDoctorArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub doctor_email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub nic: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    /// Avatar image to upload
    #[arg(long)]
    pub avatar: Option<PathBuf>,
    /// Initial password for the new account
    #[arg(long, env = "MEDICORE_NEW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── Messages ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MessagesArgs {
    #[command(subcommand)]
    pub command: MessagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// List messages
    #[command(alias = "ls")]
    List,

    /// Show one message in full
    #[command(alias = "view")]
    Show {
        /// Message ID
        id: String,
    },

    /// Delete a message
    #[command(alias = "rm")]
    Delete {
        /// Message ID
        id: String,
    },
}

// ── Appointments ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppointmentsArgs {
    #[command(subcommand)]
    pub command: AppointmentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppointmentsCommand {
    /// List appointments
    #[command(alias = "ls")]
    List {
        /// Only appointments in this state
        #[arg(long, short = 's', value_parser = parse_status)]
        status: Option<AppointmentStatus>,
    },

    /// Accept or reject an appointment
    SetStatus {
        /// Appointment ID
        id: String,
        /// New status (pending, accepted, rejected)
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
    },
}

fn parse_status(s: &str) -> Result<AppointmentStatus, String> {
    s.parse()
        .map_err(|_| format!("expected pending, accepted or rejected, got '{s}'"))
}

// ── Admin ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Register a new administrator (prompts for missing fields)
    Add(NewAdminArgs),
}

#[derive(Debug, Default, Args)]
pub struct NewAdminArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub admin_email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub nic: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Initial password for the new account
    #[arg(long, env = "MEDICORE_NEW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}
