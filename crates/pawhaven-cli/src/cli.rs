//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pawhaven_core::config::TokenStorage;

#[derive(Debug, Parser)]
#[command(
    name = "pawhaven",
    version,
    about = "Pet shelter client: sign in, check your session, open pages"
)]
pub struct Cli {
    /// Backend base URL (overrides config and PAWHAVEN_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Where the session token is kept
    #[arg(long, value_enum, global = true)]
    pub storage: Option<StorageArg>,

    /// Also write logs to pawhaven.log in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the signed-in user after revalidating the stored session
    Whoami {
        /// Print the session state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when not given
        #[arg(long, env = "PAWHAVEN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        /// Register as shelter staff (requires --staff-code)
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        staff_code: Option<String>,
    },
    /// Resolve a page path the way the app's router would
    Open {
        /// e.g. `/pet/add`
        path: String,
    },
    /// Show configuration and whether a token is stored, without contacting the backend
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageArg {
    File,
    Keyring,
    Memory,
}

impl From<StorageArg> for TokenStorage {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::File => TokenStorage::File,
            StorageArg::Keyring => TokenStorage::Keyring,
            StorageArg::Memory => TokenStorage::Memory,
        }
    }
}
