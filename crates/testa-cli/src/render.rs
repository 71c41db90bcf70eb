//! Terminal rendering of session state.

use colored::Colorize;
use testa_core::assistant::MessageRole;
use testa_core::session::{DisplayContent, MessageKind, NormalizedMessage, Session};

/// Header line: model, cost and tokens.
pub fn header(session: &Session) -> String {
    format!(
        "{} | {} | {} tokens",
        session.model().unwrap_or("unknown model"),
        session.total_price,
        session.total_tokens
    )
    .bright_black()
    .to_string()
}

fn role_label(role: MessageRole) -> String {
    match role {
        MessageRole::User => "[user]".green().bold().to_string(),
        MessageRole::Assistant => "[assistant]".bright_magenta().bold().to_string(),
    }
}

/// Renders one record as terminal lines.
pub fn message(record: &NormalizedMessage) -> Vec<String> {
    let mut lines = vec![role_label(record.role)];
    match (&record.kind, &record.content) {
        (MessageKind::Text, DisplayContent::Text(text)) => {
            lines.extend(text.lines().map(|l| l.bright_blue().to_string()));
        }
        (MessageKind::File, DisplayContent::Artifact(path)) => {
            lines.extend(record.text_content.lines().map(|l| l.bright_blue().to_string()));
            lines.push(format!("{} {} -> {}", "file:".yellow(), record.file_name, path.display()));
        }
        (MessageKind::Image, DisplayContent::Artifact(path)) => {
            lines.push(format!("{} {}", "image:".yellow(), path.display()));
        }
        (MessageKind::Unrecognized(raw), _) => {
            lines.push(format!("(unsupported content: {raw})").bright_black().to_string());
        }
        _ => {}
    }
    lines
}
