//! CLI command definitions for the `chatbot` binary.
//!
//! `serve` runs the web application; the remaining commands are local
//! administration against the same database (e.g., `chatbot user create`).

pub mod messages;
pub mod user;

use clap::{Parser, Subcommand};

/// Gemini-backed chatbot web service.
#[derive(Parser)]
#[command(name = "chatbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Show a user's saved message/response pairs, newest first.
    Messages {
        /// Username whose messages to show.
        username: String,

        /// Maximum number of messages to show (at least 1).
        #[arg(long, short = 'n', value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },

    /// Print the saved transcript of one chat session.
    Transcript {
        /// Chat session identifier.
        session_id: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user account (prompts for the password when omitted).
    Create {
        /// Username for the new account.
        username: String,

        /// Password (for scripting; prompted securely if omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a user account along with its messages and sessions.
    #[command(alias = "rm")]
    Delete {
        /// Username of the account to delete.
        username: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["chatbot", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: None,
                host: None
            }
        ));

        let cli = Cli::try_parse_from(["chatbot", "-v", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chatbot", "messages", "alice", "-n", "5", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Messages { username, limit } => {
                assert_eq!(username, "alice");
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected messages command"),
        }
    }

    #[test]
    fn test_messages_limit_must_be_positive() {
        for bad in ["0", "-5", "many"] {
            assert!(
                Cli::try_parse_from(["chatbot", "messages", "alice", "-n", bad]).is_err(),
                "{bad}"
            );
        }
        let cli = Cli::try_parse_from(["chatbot", "messages", "alice", "--limit", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Messages { limit: Some(1), .. }));
    }
}
