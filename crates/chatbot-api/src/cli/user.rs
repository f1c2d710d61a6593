//! User account CLI commands: create, delete.

use anyhow::{Result, bail};
use console::style;
use dialoguer::{Confirm, Password};

use chatbot_types::error::AuthError;

use crate::state::ConcreteAuthService;

/// Create a user, prompting for the password (with confirmation) when omitted.
///
/// The same validation as the signup page applies; each failure is printed
/// under its field name.
pub async fn create_user(
    auth: &ConcreteAuthService,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password for {}", style(username).bold()))
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };

    let user = match auth.create_user(username, &password).await {
        Ok(user) => user,
        Err(AuthError::Validation(errors)) => {
            if json {
                println!("{}", serde_json::json!({ "created": false, "errors": errors }));
            } else {
                for (field, messages) in errors.fields() {
                    for message in messages {
                        eprintln!("  {} {}: {}", style("✗").red().bold(), field, message);
                    }
                }
            }
            bail!("user '{username}' was not created");
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "created": true,
                "id": user.id,
                "username": user.username,
            })
        );
    } else {
        println!(
            "  {} User '{}' created",
            style("✓").green().bold(),
            style(&user.username).cyan()
        );
    }

    Ok(())
}

/// Delete a user after confirmation (skipped with `--force`).
pub async fn delete_user(
    auth: &ConcreteAuthService,
    username: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete user '{}' and all of their messages?",
                style(username).bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let user = match auth.delete_user(username).await {
        Ok(user) => user,
        Err(AuthError::Repository(chatbot_types::error::RepositoryError::NotFound)) => {
            bail!("user '{username}' not found");
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": true, "id": user.id, "username": user.username })
        );
    } else {
        println!(
            "  {} User '{}' deleted",
            style("✓").green().bold(),
            style(&user.username).cyan()
        );
    }

    Ok(())
}
