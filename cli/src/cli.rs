use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "sessionctl", version)]
/// Inspect and edit the `sessions` table directly.
///
/// Connection settings come from DATABASE_URL, SESSION_LOCKING and
/// DB_MAX_CONNECTIONS.
pub struct Cli {
    /// Emit logs as JSON
    #[clap(long, global = true)]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the sessions table if it does not exist
    Init,

    /// Print one session
    Show {
        session_id: String,

        /// Print the record as JSON
        #[clap(long)]
        json: bool,
    },

    /// Store a payload, creating the session if needed
    Put {
        session_id: String,
        data: String,

        /// Compare-and-swap on lock_version instead of a locked read
        #[clap(long)]
        optimistic: bool,
    },

    /// Refresh updated_at without changing the payload
    Touch { session_id: String },

    /// Remove every row of a session
    Delete { session_id: String },

    /// Delete all sessions, or those matching a raw SQL predicate
    Purge {
        /// Raw predicate appended after WHERE; values must be escaped
        #[clap(long = "where")]
        condition: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Show { .. } => "show",
            Command::Put { .. } => "put",
            Command::Touch { .. } => "touch",
            Command::Delete { .. } => "delete",
            Command::Purge { .. } => "purge",
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Command::Show { session_id, .. }
            | Command::Put { session_id, .. }
            | Command::Touch { session_id }
            | Command::Delete { session_id } => Some(session_id),
            Command::Init | Command::Purge { .. } => None,
        }
    }
}
