//! Admin command handlers.

use medicore_core::{Console, NewAdmin};

use crate::cli::{AdminArgs, AdminCommand, NewAdminArgs};
use crate::error::CliError;

use super::doctors::GENDERS;
use super::util;

pub async fn handle(console: &Console, args: AdminArgs) -> Result<(), CliError> {
    match args.command {
        AdminCommand::Add(args) => {
            let admin = collect_new_admin(args)?;
            console.add_admin(&admin).await?;
            Ok(())
        }
    }
}

pub fn collect_new_admin(args: NewAdminArgs) -> Result<NewAdmin, CliError> {
    Ok(NewAdmin {
        first_name: util::text_or_prompt(args.first_name, "First name")?,
        last_name: util::text_or_prompt(args.last_name, "Last name")?,
        email: util::text_or_prompt(args.admin_email, "Email")?,
        phone: util::text_or_prompt(args.phone, "Phone")?,
        nic: util::text_or_prompt(args.nic, "NIC")?,
        dob: util::text_or_prompt(args.dob, "Date of birth (YYYY-MM-DD)")?,
        gender: util::choice_or_select(args.gender, "Gender", "gender", GENDERS)?,
        password: util::new_password(args.password)?,
    })
}
