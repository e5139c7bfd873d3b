//! Doctor command handlers.

use tabled::Tabled;

use medicore_core::{Console, DEPARTMENTS, Doctor, NewDoctor};

use crate::cli::{DoctorsArgs, DoctorsCommand, GlobalOpts, NewDoctorArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub const GENDERS: &[&str] = &["Male", "Female"];

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DoctorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

impl From<&Doctor> for DoctorRow {
    fn from(d: &Doctor) -> Self {
        Self {
            id: d.id.clone(),
            name: d.full_name(),
            department: d.doctor_department.clone().unwrap_or_default(),
            email: d.email.clone(),
            phone: d.phone.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: DoctorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DoctorsCommand::List { department } => {
            let pb = util::spinner("Loading doctors...", global.quiet);
            let view = console.view_doctors().await;
            pb.finish_and_clear();

            let snapshot = view.snapshot();
            util::loaded(&snapshot, "doctors", global.quiet)?;

            let doctors: Vec<Doctor> = snapshot
                .items()
                .iter()
                .filter(|d| in_department(d, department.as_deref()))
                .cloned()
                .collect();
            print_doctors(&doctors, global);
            Ok(())
        }

        DoctorsCommand::Add(args) => {
            let doctor = collect_new_doctor(args)?;
            console.add_doctor(&doctor).await?;
            Ok(())
        }
    }
}

pub fn print_doctors(doctors: &[Doctor], global: &GlobalOpts) {
    let out = output::render_list(&global.output, doctors, |d| DoctorRow::from(d), |d| d.id.clone());
    output::print_output(&out, global.quiet);
}

fn in_department(doctor: &Doctor, department: Option<&str>) -> bool {
    department.is_none_or(|want| {
        doctor
            .doctor_department
            .as_deref()
            .is_some_and(|have| have.eq_ignore_ascii_case(want))
    })
}

/// Fill the registration form from flags, prompting for anything missing.
pub fn collect_new_doctor(args: NewDoctorArgs) -> Result<NewDoctor, CliError> {
    Ok(NewDoctor {
        first_name: util::text_or_prompt(args.first_name, "First name")?,
        last_name: util::text_or_prompt(args.last_name, "Last name")?,
        email: util::text_or_prompt(args.doctor_email, "Email")?,
        phone: util::text_or_prompt(args.phone, "Phone")?,
        nic: util::text_or_prompt(args.nic, "NIC")?,
        dob: util::text_or_prompt(args.dob, "Date of birth (YYYY-MM-DD)")?,
        gender: util::choice_or_select(args.gender, "Gender", "gender", GENDERS)?,
        doctor_department: util::choice_or_select(
            args.department,
            "Department",
            "department",
            DEPARTMENTS,
        )?,
        avatar: args.avatar,
        password: util::new_password(args.password)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(department: Option<&str>) -> Doctor {
        Doctor {
            id: "d1".into(),
            first_name: "Gregory".into(),
            last_name: "House".into(),
            email: String::new(),
            phone: String::new(),
            nic: String::new(),
            dob: String::new(),
            gender: String::new(),
            doctor_department: department.map(Into::into),
            doc_avatar: None,
        }
    }

    #[test]
    fn department_filter_ignores_case() {
        assert!(in_department(&doctor(Some("Cardiology")), Some("cardiology")));
        assert!(!in_department(&doctor(Some("Cardiology")), Some("ENT")));
        assert!(!in_department(&doctor(None), Some("ENT")));
        assert!(in_department(&doctor(None), None));
    }
}
