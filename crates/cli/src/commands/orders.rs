//! Checkout and order history.

#![allow(clippy::print_stdout)]

use tiffin_client::{CheckoutRequest, OrderQuery, TiffinClient, default_payment_method};
use tiffin_core::{Country, CurrencyCode, Order, OrderId, OrderStatus, PaymentMethodId};

use super::{CliError, home_country};

/// Place an order for the cart.
///
/// Country defaults to the user's, and the payment method to the saved default.
pub async fn checkout(
    client: &TiffinClient,
    address: String,
    country: Option<Country>,
    payment_method: Option<PaymentMethodId>,
    instructions: String,
) -> Result<(), CliError> {
    let payment_method = match payment_method {
        Some(id) => Some(id),
        None => {
            let methods = client.api().my_payment_methods().await?;
            default_payment_method(&methods).map(|method| method.id)
        }
    };

    let request = CheckoutRequest {
        delivery_address: address,
        country: country.unwrap_or_else(|| home_country(client)),
        payment_method,
        special_instructions: instructions,
    };

    let order = client.place_order(&request).await?;
    println!("Order #{} placed.", order.id);
    print_order(&order);
    Ok(())
}

/// List the user's orders, or every visible order with `all`.
pub async fn list(
    client: &TiffinClient,
    all: bool,
    status: Option<OrderStatus>,
) -> Result<(), CliError> {
    let orders = if all || status.is_some() {
        let query = OrderQuery {
            status,
            ..OrderQuery::default()
        };
        client.api().list_orders(&query).await?
    } else {
        client.api().my_orders().await?
    };

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders {
        println!("{}", summary_line(order));
    }
    Ok(())
}

pub async fn show(client: &TiffinClient, id: OrderId) -> Result<(), CliError> {
    let order = client.api().get_order(id).await?;
    print_order(&order);
    Ok(())
}

pub async fn cancel(client: &TiffinClient, id: OrderId) -> Result<(), CliError> {
    let message = client.api().cancel_order(id).await?;
    println!("{message}");
    Ok(())
}

fn summary_line(order: &Order) -> String {
    let currency = CurrencyCode::from(order.country);
    let restaurant = order
        .restaurant_name
        .clone()
        .unwrap_or_else(|| format!("restaurant {}", order.restaurant));
    let placed = order
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    format!(
        "#{:<5} {:<16} {:<24} {:>10}  {placed}",
        order.id,
        order.status,
        restaurant,
        order.total_amount.display(currency)
    )
}

fn print_order(order: &Order) {
    let currency = CurrencyCode::from(order.country);

    println!("{}", summary_line(order));
    if !order.delivery_address.is_empty() {
        println!("  Deliver to: {}", order.delivery_address);
    }
    for item in &order.items {
        let name = item
            .menu_item_name
            .clone()
            .unwrap_or_else(|| format!("item {}", item.menu_item));
        println!(
            "  {:<30} x{:<3} {:>10}",
            name,
            item.quantity,
            item.line_total().display(currency)
        );
    }
    if let Some(note) = order.special_instructions.as_deref().filter(|n| !n.is_empty()) {
        println!("  Note: {note}");
    }
}
