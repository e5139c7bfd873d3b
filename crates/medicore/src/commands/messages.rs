//! Message command handlers.

use tabled::Tabled;

use medicore_core::{CacheSnapshot, Console, Message};

use crate::cli::{GlobalOpts, MessagesArgs, MessagesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const PREVIEW_LEN: usize = 60;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Message")]
    preview: String,
}

impl From<&Message> for MessageRow {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            from: format!("{} {}", m.first_name, m.last_name),
            email: m.email.clone(),
            phone: m.phone.clone(),
            preview: preview(&m.message),
        }
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_LEN || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(PREVIEW_LEN).collect();
        format!("{}…", cut.trim_end())
    } else {
        line.to_owned()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: MessagesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MessagesCommand::List => {
            let pb = util::spinner("Loading messages...", global.quiet);
            let view = console.view_messages().await;
            pb.finish_and_clear();

            let snapshot = view.snapshot();
            util::loaded(&snapshot, "messages", global.quiet)?;
            print_messages(snapshot.items(), global);
            Ok(())
        }

        MessagesCommand::Show { id } => {
            let pb = util::spinner("Loading messages...", global.quiet);
            let view = console.view_messages().await;
            pb.finish_and_clear();

            show(&view.snapshot(), &id, global)
        }

        MessagesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete message {id}?"), global.yes)? {
                return Ok(());
            }
            console.delete_message(&id)?;
            Ok(())
        }
    }
}

pub fn print_messages(messages: &[Message], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        messages,
        |m| MessageRow::from(m),
        |m| m.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

/// Print the message with `id` from a loaded snapshot, body in full.
pub fn show(
    snapshot: &CacheSnapshot<Message>,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::loaded(snapshot, "messages", global.quiet)?;
    let message = find(snapshot.items(), id)?;
    let out = output::render_single(&global.output, message, detail, |m| m.message.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

fn find<'a>(messages: &'a [Message], id: &str) -> Result<&'a Message, CliError> {
    messages
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "message".into(),
            identifier: id.to_owned(),
            list_command: "messages list".into(),
        })
}

fn detail(m: &Message) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_owned() } else { s.to_owned() };
    format!(
        "From:   {} {}\nEmail:  {}\nPhone:  {}\nID:     {}\n\n{}",
        m.first_name,
        m.last_name,
        or_dash(&m.email),
        or_dash(&m.phone),
        m.id,
        m.message,
    )
}
