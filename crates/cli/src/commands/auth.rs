//! Login, registration and profile commands.

#![allow(clippy::print_stdout)]

use std::io::{self, BufRead, Write};

use secrecy::SecretString;
use tiffin_client::{Registration, TiffinClient};
use tiffin_core::Country;

use super::CliError;

/// Sign in, reading the password from stdin when not given.
pub async fn login(
    client: &TiffinClient,
    username: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => prompt_secret("Password: ")?,
    };

    let user = client.session().login(username, &password).await?;
    println!("Logged in as {} ({})", user.display_name(), user.role);
    Ok(())
}

/// Account details from the command line; passwords are prompted for.
pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub country: Option<Country>,
    pub phone: String,
}

/// Create an account and sign in.
pub async fn register(client: &TiffinClient, args: RegisterArgs) -> Result<(), CliError> {
    let password = prompt_secret("Password: ")?;
    let password2 = prompt_secret("Confirm password: ")?;

    let registration = Registration {
        username: args.username,
        email: args.email,
        password,
        password2,
        first_name: args.first_name,
        last_name: args.last_name,
        country: args.country,
        phone: args.phone,
    };

    let user = client.session().register(&registration).await?;
    println!("Welcome, {}! Your account is ready.", user.display_name());
    Ok(())
}

/// Forget the session.
pub fn logout(client: &TiffinClient) {
    client.session().logout();
    println!("Logged out.");
}

/// Show the signed-in user.
pub fn whoami(client: &TiffinClient) -> Result<(), CliError> {
    let user = client.session().current_user().ok_or(CliError::NotLoggedIn)?;

    println!("{} ({})", user.display_name(), user.username);
    if !user.email.is_empty() {
        println!("  Email:   {}", user.email);
    }
    println!("  Role:    {}", user.role);
    if let Some(country) = user.country {
        println!("  Country: {country}");
    }
    if let Some(phone) = user.phone.filter(|p| !p.is_empty()) {
        println!("  Phone:   {phone}");
    }
    Ok(())
}

#[allow(clippy::print_stderr)]
fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}
