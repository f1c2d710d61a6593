//! Read-only views over saved chat records: messages, transcript.

use anyhow::{Result, bail};
use console::style;

use chatbot_core::repository::message::MessageRepository;
use chatbot_core::repository::user::UserRepository;
use chatbot_infra::sqlite::message::SqliteMessageRepository;
use chatbot_infra::sqlite::pool::DatabasePool;
use chatbot_infra::sqlite::user::SqliteUserRepository;

/// Longest content shown per line in styled output.
const PREVIEW_CHARS: usize = 60;

/// List a user's message/response pairs, newest first.
///
/// # Examples
///
/// ```bash
/// chatbot messages alice
/// chatbot messages alice -n 10 --json
/// ```
pub async fn list_messages(
    pool: &DatabasePool,
    username: &str,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let users = SqliteUserRepository::new(pool.clone());
    let Some(user) = users.get_by_username(username).await? else {
        bail!("user '{username}' not found");
    };

    let messages = SqliteMessageRepository::new(pool.clone())
        .list_messages(&user.id, limit)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No saved messages for '{}'. Transcripts are saved when {} is enabled.",
            style("i").blue().bold(),
            style(&user.username).cyan(),
            style("chat.persist_transcripts").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Messages from '{}'", style(&user.username).cyan().bold());
    println!();
    for message in &messages {
        println!(
            "  {}  {}",
            style(message.created_at.format("%Y-%m-%d %H:%M")).dim(),
            preview(&message.content)
        );
        match &message.response {
            Some(response) => println!("  {:16}  {}", "", style(preview(response)).green()),
            None => println!("  {:16}  {}", "", style("(no response)").dim()),
        }
    }
    println!();
    println!(
        "  {} message{}",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print every line of a chat session's transcript, oldest first.
pub async fn show_transcript(pool: &DatabasePool, session_id: &str, json: bool) -> Result<()> {
    let lines = SqliteMessageRepository::new(pool.clone())
        .list_chat_messages(session_id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    if lines.is_empty() {
        println!();
        println!(
            "  {} No transcript for session '{}'",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for line in &lines {
        let sender = match line.sender {
            chatbot_types::message::Sender::User => style("You").cyan().bold(),
            chatbot_types::message::Sender::Bot => style("Bot").green().bold(),
        };
        println!(
            "  {} {}: {}",
            style(line.created_at.format("%H:%M:%S")).dim(),
            sender,
            line.message
        );
    }
    println!();

    Ok(())
}

/// Single-line preview, truncated on a char boundary.
fn preview(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("one\ntwo"), "one two");
        let long = "é".repeat(100);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with("..."));
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open_in(dir.path()).await.unwrap();
        let err = list_messages(&pool, "ghost", None, true).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_empty_transcript_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open_in(dir.path()).await.unwrap();
        show_transcript(&pool, "missing", true).await.unwrap();
    }
}
