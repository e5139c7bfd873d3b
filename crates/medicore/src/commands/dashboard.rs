//! Dashboard: headline counts plus the appointment list.

use owo_colors::OwoColorize;
use serde::Serialize;

use medicore_core::{Appointment, Console, Dashboard};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{appointments, util};

#[derive(Serialize)]
struct DashboardReport<'a> {
    admin: Option<&'a str>,
    appointments: usize,
    pending: usize,
    doctors: usize,
    latest: &'a [Appointment],
}

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let pb = util::spinner("Loading dashboard...", global.quiet);
    let dashboard = console.dashboard().await;
    pb.finish_and_clear();
    render(&dashboard, global)
}

pub fn render(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let appointments = dashboard.appointments.snapshot();
    util::loaded(&appointments, "appointments", global.quiet)?;
    let summary = dashboard.summary();

    match global.output {
        OutputFormat::Table => {
            let color = output::should_color(&global.color);
            let name = summary.admin.as_deref().unwrap_or("administrator");
            let header = if color {
                format!("Hello, {}", name.bold())
            } else {
                format!("Hello, {name}")
            };
            let fetched = appointments.state.fetched_at().map_or_else(
                || "not yet fetched".to_owned(),
                |at| {
                    at.with_timezone(&chrono::Local)
                        .format("fetched %Y-%m-%d %H:%M:%S")
                        .to_string()
                },
            );
            let lines = [
                header,
                format!("Appointments:  {}", summary.appointments),
                format!("  pending:     {}", summary.pending),
                format!("Doctors:       {}", summary.doctors),
                format!("({fetched})"),
            ];
            output::print_output(&lines.join("\n"), global.quiet);
            if !appointments.is_empty() {
                appointments::print_appointments(appointments.items(), global);
            }
        }
        OutputFormat::Plain => {
            let out = format!(
                "{} {} {}",
                summary.appointments, summary.pending, summary.doctors
            );
            output::print_output(&out, global.quiet);
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let report = DashboardReport {
                admin: summary.admin.as_deref(),
                appointments: summary.appointments,
                pending: summary.pending,
                doctors: summary.doctors,
                latest: appointments.items(),
            };
            let out = output::render_single(&global.output, &report, |_| String::new(), |_| String::new());
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
