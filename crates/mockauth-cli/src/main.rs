//! CLI entry point for mockauth.
//!
//! This binary provides the `mockauth` command with subcommands for
//! registering, logging in and out, and inspecting the current session.
//! It is the presentation boundary: all state lives in the session
//! manager and its store, and the "toast" lines printed after each
//! command come from the manager's event bus.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mockauth_session::{AuthState, SessionEvent, SessionManager};
use mockauth_store::{
    AuthStore, Database, MemoryStorage, SqliteStorage, StorageBackend, token_issued_at,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

/// Display-only token lifetime feeding the countdown. Tokens are not
/// actually invalidated when it elapses.
const TOKEN_DISPLAY_TTL_SECS: i64 = 30 * 60;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let backend: Arc<dyn StorageBackend> = if cli.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        std::fs::create_dir_all(&cli.data_dir).context("failed to create data directory")?;
        let db_path = cli.data_dir.join("mockauth.db");
        let db = Database::open_and_migrate(db_path.clone())
            .await
            .context("failed to open database")?;
        info!(path = %db_path.display(), "store initialized");
        Arc::new(SqliteStorage::new(db))
    };

    let manager = SessionManager::new(AuthStore::new(backend));
    let mut events = manager.events();

    manager
        .initialize()
        .await
        .context("failed to initialize session")?;

    let result = dispatch(&manager, cli.command).await;

    // Render whatever the event bus collected, success or not.
    drain_toasts(&mut events);

    result
}

async fn dispatch(manager: &SessionManager, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Register {
            email,
            name,
            password,
        } => cmd_register(manager, &email, &password, &name).await,
        Commands::Login { email, password } => cmd_login(manager, &email, &password).await,
        Commands::Logout => cmd_logout(manager).await,
        Commands::Status => cmd_status(manager),
        Commands::Whoami => cmd_whoami(manager),
        Commands::Token { refresh } => cmd_token(manager, refresh).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn cmd_register(
    manager: &SessionManager,
    email: &str,
    password: &str,
    name: &str,
) -> Result<ExitCode> {
    let user = manager.register(email, password, name).await?;
    println!("Welcome, {} <{}>", user.name, user.email);
    Ok(ExitCode::SUCCESS)
}

async fn cmd_login(manager: &SessionManager, email: &str, password: &str) -> Result<ExitCode> {
    let user = manager.login(email, password).await?;
    println!("Welcome back, {}", user.name);
    Ok(ExitCode::SUCCESS)
}

async fn cmd_logout(manager: &SessionManager) -> Result<ExitCode> {
    manager.logout().await?;
    Ok(ExitCode::SUCCESS)
}

/// Print the session state; exits nonzero when no session is active, so
/// scripts can gate on it the way the UI gates protected routes.
fn cmd_status(manager: &SessionManager) -> Result<ExitCode> {
    let snapshot = manager.snapshot();
    match snapshot.state {
        AuthState::Authenticated => {
            match snapshot.user {
                Some(user) => println!("authenticated as {} <{}>", user.name, user.email),
                None => println!("authenticated (no user record)"),
            }
            Ok(ExitCode::SUCCESS)
        }
        AuthState::Unauthenticated | AuthState::Unknown => {
            println!("not authenticated");
            Ok(ExitCode::from(1))
        }
    }
}

fn cmd_whoami(manager: &SessionManager) -> Result<ExitCode> {
    match manager.user() {
        Some(user) => {
            println!("id:         {}", user.id);
            println!("email:      {}", user.email);
            println!("name:       {}", user.name);
            match chrono::DateTime::from_timestamp(user.created_at, 0) {
                Some(created) => println!("registered: {}", created.to_rfc3339()),
                None => println!("registered: {}", user.created_at),
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("not logged in");
            Ok(ExitCode::from(1))
        }
    }
}

async fn cmd_token(manager: &SessionManager, refresh: bool) -> Result<ExitCode> {
    if refresh {
        manager.refresh_token().await?;
    }

    match manager.store().current_token().await? {
        Some(token) => {
            println!("{token}");
            if let Some(issued) = token_issued_at(&token) {
                let elapsed = chrono::Utc::now().signed_duration_since(issued).num_seconds();
                let remaining = (TOKEN_DISPLAY_TTL_SECS - elapsed).max(0);
                println!("expires in {} (display only)", format_countdown(remaining));
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("no token available");
            Ok(ExitCode::from(1))
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Render seconds as `MM:SS`, the shape the token card uses.
fn format_countdown(seconds: i64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Print accumulated session events as toast-style lines.
fn drain_toasts(events: &mut tokio::sync::broadcast::Receiver<Arc<SessionEvent>>) {
    while let Ok(event) = events.try_recv() {
        match &*event {
            SessionEvent::Registered { .. } => println!("✓ account created successfully"),
            SessionEvent::LoggedIn { .. } => println!("✓ login successful"),
            SessionEvent::LoggedOut { .. } => println!("✓ logged out successfully"),
            SessionEvent::TokenRefreshed { .. } => println!("✓ token refreshed successfully"),
            SessionEvent::AuthFailed { message, .. } => eprintln!("✗ {message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_formats_mm_ss() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(format_countdown(30 * 60), "30:00");
    }

    #[test]
    fn cli_parses_register() {
        use clap::Parser;
        let cli = Cli::try_parse_from([
            "mockauth", "register", "a@x.com", "--name", "A", "--password", "secret1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Register { .. }));
    }

    #[test]
    fn cli_parses_token_refresh() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["mockauth", "token", "--refresh"]).unwrap();
        match cli.command {
            Commands::Token { refresh } => assert!(refresh),
            _ => panic!("expected token subcommand"),
        }
    }
}
