//! Command implementations.
//!
//! Commands print results to stdout; diagnostics go through `tracing`.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;

use thiserror::Error;
use tiffin_client::{ClientError, TiffinClient};
use tiffin_core::{Country, CurrencyCode};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Reading interactive input failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// The command needs a signed-in user.
    #[error("Not logged in. Run `tiffin login <username>` first.")]
    NotLoggedIn,
}

impl CliError {
    /// Message for the terminal.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    /// Log the failure and send unexpected client errors to Sentry.
    pub fn report(&self) {
        match self {
            Self::Client(err) => err.report(),
            other => tracing::debug!(error = %other, "Command failed"),
        }
    }
}

/// The signed-in user's country, or India.
fn home_country(client: &TiffinClient) -> Country {
    client
        .session()
        .current_user()
        .and_then(|user| user.country)
        .unwrap_or_default()
}

fn currency(client: &TiffinClient) -> CurrencyCode {
    CurrencyCode::from(home_country(client))
}
