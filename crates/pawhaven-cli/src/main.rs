//! PawHaven CLI - a command-line front end for the pet shelter.
//!
//! Each run is one "page load": the stored session is revalidated with the
//! backend, one command runs, and any hard redirect restarts the session.

mod app;
mod cli;

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pawhaven_core::auth::{AuthPhase, RegistrationForm, RegistrationOutcome};
use pawhaven_core::config::Config;
use pawhaven_core::nav::{HeaderMenu, MenuItem, Navigation};

use app::{App, TerminalNotifier};
use cli::{Cli, Command};

/// Log file written when `--log-dir` is given
const LOG_FILE: &str = "pawhaven.log";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());
    info!("PawHaven CLI starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(url) = cli.backend_url.clone() {
        config.backend_url = url;
    }
    if let Some(storage) = cli.storage {
        config.token_storage = storage.into();
    }

    let store = config.token_store()?;
    let mut app = App::new(config, store, Arc::new(TerminalNotifier))?;

    let code = run(&mut app, cli.command).await?;
    info!("PawHaven CLI shutting down");
    Ok(code)
}

async fn run(app: &mut App, command: Command) -> Result<ExitCode> {
    match command {
        // Status is the one command that must not touch the backend.
        Command::Status => {
            print_status(app);
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami { json } => {
            app.start().await?;
            let state = app.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
                return Ok(ExitCode::SUCCESS);
            }
            match (state.phase(), state.user()) {
                (AuthPhase::Authenticated, Some(user)) => {
                    let role = user
                        .role
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "no role".to_string());
                    println!("{} <{}> ({})", user.display_name(), user.email, role);
                }
                (AuthPhase::Loading, _) => println!("Session still loading"),
                _ => println!("Not signed in"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Login { email, password } => {
            app.start().await?;
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };
            println!("Authenticating...");
            if app.login(&email, &password).await? {
                println!("Login successful!");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Logout => {
            app.start().await?;
            app.logout().await?;
            println!("Signed out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Register {
            email,
            staff,
            staff_code,
        } => {
            app.start().await?;
            let form = RegistrationForm {
                email,
                password: prompt_password("Password: ")?,
                confirm_password: prompt_password("Confirm password: ")?,
                as_staff: staff,
                staff_code,
            };
            match app.register(&form).await {
                RegistrationOutcome::Registered(_) => Ok(ExitCode::SUCCESS),
                RegistrationOutcome::Invalid(errors) => {
                    for error in errors {
                        eprintln!("✗ {}", error);
                    }
                    Ok(ExitCode::FAILURE)
                }
                RegistrationOutcome::Rejected => Ok(ExitCode::FAILURE),
            }
        }
        Command::Open { path } => {
            app.start().await?;
            let (navigation, menu) = app.open(&path);
            match navigation {
                Navigation::Render(route) => println!("{} ({})", route.title(), route),
                Navigation::Redirect(target) => println!("Redirected to {}", target),
                Navigation::NotFound => {
                    println!("Oops! Sorry, you are visiting an invalid page.");
                    return Ok(ExitCode::FAILURE);
                }
            }
            print_menu(&menu);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

fn print_status(app: &App) {
    println!("Backend:        {}", app.config.backend_url);
    println!("Token storage:  {:?}", app.config.token_storage);
    println!(
        "Stored token:   {}",
        if app.has_stored_token() { "yes (not validated)" } else { "no" }
    );
}

fn print_menu(menu: &HeaderMenu) {
    match menu {
        HeaderMenu::Hidden | HeaderMenu::Empty => {}
        HeaderMenu::LoginButton => println!("  [Login]"),
        HeaderMenu::Account { email, items } => {
            if let Some(email) = email {
                println!("  {}", email);
            }
            for item in items {
                match item {
                    MenuItem::Link(route) => println!("  - {} ({})", route.title(), route),
                    MenuItem::Logout => println!("  - Logout"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use pawhaven_core::auth::{MemoryTokenStore, TokenStore};
    use pawhaven_core::notify::{Notice, Notifier};

    use super::*;

    struct Quiet;

    impl Notifier for Quiet {
        fn notify(&self, _notice: Notice) {}
    }

    #[tokio::test]
    async fn test_status_skips_startup() {
        // No mocks: a rehydration would get a 404 and clear the token.
        let server = MockServer::start_async().await;
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let config = Config {
            backend_url: server.base_url(),
            ..Config::default()
        };
        let mut app = App::new(config, store.clone(), Arc::new(Quiet)).unwrap();

        run(&mut app, Command::Status).await.unwrap();

        assert_eq!(store.read().unwrap().as_deref(), Some("tok"));
        assert!(!app.state().is_loading());
        assert!(!app.state().is_authenticated());
    }
}
