//! Saved payment methods.

#![allow(clippy::print_stdout)]

use tiffin_client::TiffinClient;
use tiffin_core::{NewPaymentMethod, PaymentMethodId};

use super::CliError;

pub async fn list(client: &TiffinClient) -> Result<(), CliError> {
    let methods = client.api().my_payment_methods().await?;
    if methods.is_empty() {
        println!("No saved payment methods.");
        return Ok(());
    }

    for method in methods {
        let marker = if method.is_default { "*" } else { " " };
        println!("{marker} {:>4}  {}", method.id, method.summary());
    }
    Ok(())
}

pub async fn add(client: &TiffinClient, method: &NewPaymentMethod) -> Result<(), CliError> {
    let created = client.api().create_payment_method(method).await?;
    println!("Saved {} as #{}.", created.summary(), created.id);
    Ok(())
}

pub async fn set_default(client: &TiffinClient, id: PaymentMethodId) -> Result<(), CliError> {
    let message = client.api().set_default_payment_method(id).await?;
    println!("{message}");
    Ok(())
}

pub async fn delete(client: &TiffinClient, id: PaymentMethodId) -> Result<(), CliError> {
    client.api().delete_payment_method(id).await?;
    println!("Deleted payment method #{id}.");
    Ok(())
}
