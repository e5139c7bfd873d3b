//! Appointment command handlers.

use tabled::Tabled;

use medicore_core::{Appointment, AppointmentStatus, Console};

use crate::cli::{AppointmentsArgs, AppointmentsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AppointmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Doctor")]
    doctor: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Visited")]
    visited: String,
}

impl AppointmentRow {
    fn new(a: &Appointment, color: bool) -> Self {
        Self {
            id: a.id.clone(),
            patient: a.patient_name(),
            date: a.appointment_date.chars().take(10).collect(),
            doctor: a.doctor_name(),
            department: a.department.clone(),
            status: output::paint_status(a.status, color),
            visited: if a.has_visited { "yes" } else { "no" }.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: AppointmentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AppointmentsCommand::List { status } => {
            let pb = util::spinner("Loading appointments...", global.quiet);
            let view = console.view_appointments().await;
            pb.finish_and_clear();

            let snapshot = view.snapshot();
            util::loaded(&snapshot, "appointments", global.quiet)?;

            let appointments: Vec<Appointment> = snapshot
                .items()
                .iter()
                .filter(|a| status.is_none_or(|s| a.status == s))
                .cloned()
                .collect();
            print_appointments(&appointments, global);
            Ok(())
        }

        AppointmentsCommand::SetStatus { id, status } => set_status(console, &id, status).await,
    }
}

pub async fn set_status(
    console: &Console,
    id: &str,
    status: AppointmentStatus,
) -> Result<(), CliError> {
    console.update_appointment_status(id, status).await?;
    Ok(())
}

pub fn print_appointments(appointments: &[Appointment], global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        appointments,
        |a| AppointmentRow::new(a, color),
        |a| a.id.clone(),
    );
    output::print_output(&out, global.quiet);
}
