//! Tiffin CLI - browse restaurants, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (prompts for the password on stdin if --password is omitted)
//! tiffin login asha
//!
//! # Browse
//! tiffin restaurants --search dosa
//! tiffin menu 1
//!
//! # Build the cart and check out
//! tiffin cart add 7 --quantity 2 --note "extra chutney"
//! tiffin cart show
//! tiffin checkout --address "12 MG Road"
//!
//! # Track orders
//! tiffin orders
//! tiffin orders cancel 31
//! ```
//!
//! # Environment Variables
//!
//! See `tiffin_client::config` for the API and storage settings. In addition:
//!
//! - `RUST_LOG` - Log filter (default: `tiffin=info,tiffin_client=info`)
//! - `TIFFIN_LOG_JSON` - Set to `1` or `true` for JSON log output

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tiffin_client::{ClientConfig, TiffinClient};
use tiffin_core::{
    Country, MenuItemId, OrderId, OrderStatus, PaymentMethodId, PaymentType, RestaurantId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "tiffin")]
#[command(author, version, about = "Order food from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the session (the cart is kept)
    Logout,
    /// Create an account and sign in
    Register {
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// `india` or `america`
        #[arg(long)]
        country: Option<Country>,

        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Show the signed-in user
    Whoami,
    /// List restaurants
    Restaurants {
        /// Search by name, description or address
        #[arg(short, long)]
        search: Option<String>,

        /// `india` or `america`
        #[arg(long)]
        country: Option<Country>,
    },
    /// Show a restaurant's menu
    Menu { restaurant: RestaurantId },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Place an order for the cart
    Checkout {
        #[arg(short, long)]
        address: String,

        /// Defaults to the user's country
        #[arg(long)]
        country: Option<Country>,

        /// Defaults to the user's default payment method
        #[arg(short, long)]
        payment_method: Option<PaymentMethodId>,

        #[arg(short, long, default_value = "")]
        instructions: String,
    },
    /// View and cancel orders
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Manage saved payment methods
    Payments {
        #[command(subcommand)]
        action: Option<PaymentAction>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a menu item
    Add {
        item: MenuItemId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Remove a menu item
    Remove { item: MenuItemId },
    /// Set a line's quantity (0 removes it)
    Set {
        item: MenuItemId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        /// Every order visible to the user, not just their own
        #[arg(long)]
        all: bool,

        /// e.g. `pending`, `out-for-delivery`
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Show one order
    Show { id: OrderId },
    /// Cancel an order
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
enum PaymentAction {
    /// List saved payment methods
    List,
    /// Save a payment method
    Add {
        /// `credit-card`, `debit-card`, `net-banking`, `upi`, `wallet` or `cod`
        payment_type: PaymentType,

        #[arg(long)]
        last4: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        upi: Option<String>,

        /// Make this the default method
        #[arg(long)]
        default: bool,
    },
    /// Make a payment method the default
    Default { id: PaymentMethodId },
    /// Delete a payment method
    Delete { id: PaymentMethodId },
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

/// Map tracing levels to Sentry: warnings and errors become events, the rest breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tiffin=info,tiffin_client=info".into());

    let json = std::env::var("TIFFIN_LOG_JSON")
        .is_ok_and(|value| matches!(value.as_str(), "1" | "true"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer().without_time()))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing layer that feeds it
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        e.report();
        tracing::error!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let client = TiffinClient::open(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&client, &username, password).await?;
        }
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            country,
            phone,
        } => {
            let form = commands::auth::RegisterArgs {
                username,
                email,
                first_name,
                last_name,
                country,
                phone,
            };
            commands::auth::register(&client, form).await?;
        }
        Commands::Logout => commands::auth::logout(&client),
        command => {
            client.session().restore().await;
            if requires_login(&command) && !client.session().is_authenticated() {
                return Err(CliError::NotLoggedIn);
            }
            run_authenticated(&client, command).await?;
        }
    }
    Ok(())
}

/// Commands that talk to the API. Editing the local cart works signed out.
const fn requires_login(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Login { .. }
            | Commands::Logout
            | Commands::Register { .. }
            | Commands::Cart {
                action: None
                    | Some(
                        CartAction::Show
                            | CartAction::Remove { .. }
                            | CartAction::Set { .. }
                            | CartAction::Clear
                    ),
            }
    )
}

async fn run_authenticated(client: &TiffinClient, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Whoami => commands::auth::whoami(client)?,
        Commands::Restaurants { search, country } => {
            commands::catalog::restaurants(client, search, country).await?;
        }
        Commands::Menu { restaurant } => commands::catalog::menu(client, restaurant).await?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(client),
            CartAction::Add {
                item,
                quantity,
                note,
            } => commands::cart::add(client, item, quantity, &note).await?,
            CartAction::Remove { item } => commands::cart::remove(client, item),
            CartAction::Set { item, quantity } => commands::cart::set(client, item, quantity),
            CartAction::Clear => commands::cart::clear(client),
        },
        Commands::Checkout {
            address,
            country,
            payment_method,
            instructions,
        } => {
            commands::orders::checkout(client, address, country, payment_method, instructions)
                .await?;
        }
        Commands::Orders { action } => match action.unwrap_or(OrderAction::List {
            all: false,
            status: None,
        }) {
            OrderAction::List { all, status } => commands::orders::list(client, all, status).await?,
            OrderAction::Show { id } => commands::orders::show(client, id).await?,
            OrderAction::Cancel { id } => commands::orders::cancel(client, id).await?,
        },
        Commands::Payments { action } => match action.unwrap_or(PaymentAction::List) {
            PaymentAction::List => commands::payments::list(client).await?,
            PaymentAction::Add {
                payment_type,
                last4,
                brand,
                upi,
                default,
            } => {
                let method = tiffin_core::NewPaymentMethod {
                    payment_type,
                    is_default: default,
                    card_last4: last4,
                    card_brand: brand,
                    upi_id: upi,
                };
                commands::payments::add(client, &method).await?;
            }
            PaymentAction::Default { id } => commands::payments::set_default(client, id).await?,
            PaymentAction::Delete { id } => commands::payments::delete(client, id).await?,
        },
        Commands::Login { .. } | Commands::Logout | Commands::Register { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_cart_add() {
        let cli = Cli::try_parse_from(["tiffin", "cart", "add", "7", "-q", "2", "-n", "no onions"])
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Cart {
                action: Some(CartAction::Add { item, quantity, note }),
            } => {
                assert_eq!(item, MenuItemId::new(7));
                assert_eq!(quantity, 2);
                assert_eq!(note, "no onions");
            }
            _ => panic!("expected cart add"),
        }
    }

    #[test]
    fn test_parses_negative_quantity() {
        let cli = Cli::try_parse_from(["tiffin", "cart", "set", "7", "-1"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: Some(CartAction::Set { quantity: -1, .. })
            }
        ));
    }

    fn parse(args: &[&str]) -> Commands {
        let args = std::iter::once("tiffin").chain(args.iter().copied());
        Cli::try_parse_from(args)
            .unwrap_or_else(|e| panic!("{e}"))
            .command
    }

    #[test]
    fn test_api_commands_require_login() {
        for args in [
            &["restaurants"][..],
            &["menu", "1"],
            &["cart", "add", "7"],
            &["checkout", "-a", "12 MG Road"],
            &["orders"],
            &["orders", "cancel", "3"],
            &["payments"],
            &["whoami"],
        ] {
            assert!(requires_login(&parse(args)), "{args:?} should require login");
        }
    }

    #[test]
    fn test_offline_commands_do_not_require_login() {
        for args in [
            &["login", "asha", "-p", "pw"][..],
            &["logout"],
            &["register", "asha", "-e", "asha@example.com"],
            &["cart"],
            &["cart", "show"],
            &["cart", "remove", "7"],
            &["cart", "set", "7", "0"],
            &["cart", "clear"],
        ] {
            assert!(!requires_login(&parse(args)), "{args:?} should work signed out");
        }
    }

    #[tokio::test]
    async fn test_signed_out_api_command_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens here; the command must fail before any request.
        let mut config = ClientConfig::for_base_url("http://127.0.0.1:9/api").unwrap();
        config.state_path = dir.path().join("state.json");

        let cli = Cli::try_parse_from(["tiffin", "orders"]).unwrap();
        let err = run(cli, config).await.unwrap_err();
        assert!(matches!(err, CliError::NotLoggedIn));
    }

    #[test]
    fn test_rejects_unknown_payment_type() {
        assert!(Cli::try_parse_from(["tiffin", "payments", "add", "cheque"]).is_err());
    }
}
