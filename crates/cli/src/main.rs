//! Kotob CLI - Shop and administer the bookstore from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! kotob books list --category روايات --sort price
//!
//! # Shop as a guest, then sign in and keep the cart
//! kotob cart add 65f1c0a2e4 --quantity 2
//! kotob auth login -e reader@example.com -p 'secret123'
//!
//! # Place an order
//! kotob orders checkout --government القاهرة --full-name "Mona Adel" --address "12 Nile St"
//!
//! # Admin: dashboard and order management
//! kotob dashboard
//! kotob orders status 65f1c0a2e4 delivered
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in, register, sign out, password reset
//! - `books` - Browse the catalog; create, edit and price books (admin)
//! - `cart` - Guest or account cart
//! - `favorites` - Guest or account favorites
//! - `orders` - Checkout and order management (admin)
//! - `dashboard` - Admin headline figures
//!
//! Results are reported through `tracing` events; set `KOTOB_LOG_FORMAT=json`
//! for machine-readable output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use kotob_client::config::LogFormat;
use kotob_client::{ClientConfig, ClientError, ClientState};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "kotob")]
#[command(author, version, about = "Kotob bookstore CLI")]
struct Cli {
    /// Emit JSON log lines regardless of `KOTOB_LOG_FORMAT`
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register and manage the session
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Browse and manage books
    Books {
        #[command(subcommand)]
        action: commands::books::BooksAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: commands::favorites::FavoritesAction,
    },
    /// Place and manage orders
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Show admin dashboard figures
    Dashboard,
}

impl Commands {
    /// Whether the command reads the cart or favorites lists, which are
    /// fetched from the backend for a signed-in user.
    const fn needs_lists(&self) -> bool {
        matches!(
            self,
            Self::Cart { .. }
                | Self::Favorites { .. }
                | Self::Orders {
                    action: commands::orders::OrdersAction::Checkout { .. }
                }
        )
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kotob_client=info,kotob_cli=info".into());

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(if cli.json { LogFormat::Json } else { config.log_format });

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        match e.downcast_ref::<ClientError>() {
            Some(client_error) => {
                tracing::error!(error = %client_error, "{}", client_error.user_message());
            }
            None => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = ClientState::open(config)?;
    if cli.command.needs_lists() {
        state.init().await?;
    }

    match cli.command {
        Commands::Auth { action } => commands::auth::run(&state, action).await?,
        Commands::Books { action } => commands::books::run(&state, action).await?,
        Commands::Cart { action } => commands::cart::run(&state, action).await?,
        Commands::Favorites { action } => commands::favorites::run(&state, action).await?,
        Commands::Orders { action } => commands::orders::run(&state, action).await?,
        Commands::Dashboard => commands::dashboard::run(&state).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("kotob").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_list_commands_load_cart_and_favorites() {
        assert!(command(&["cart", "show"]).needs_lists());
        assert!(command(&["favorites", "show"]).needs_lists());
        assert!(
            command(&[
                "orders",
                "checkout",
                "--government",
                "القاهرة",
                "--full-name",
                "Mona Adel",
                "--address",
                "12 Nile St",
            ])
            .needs_lists()
        );
    }

    #[test]
    fn test_other_commands_skip_backend_lists() {
        assert!(!command(&["auth", "logout"]).needs_lists());
        assert!(!command(&["auth", "whoami"]).needs_lists());
        assert!(!command(&["books", "list"]).needs_lists());
        assert!(!command(&["orders", "list"]).needs_lists());
        assert!(!command(&["dashboard"]).needs_lists());
    }
}
