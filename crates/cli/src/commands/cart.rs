//! Cart commands. Everything except `add` works offline.

#![allow(clippy::print_stdout)]

use tiffin_client::TiffinClient;
use tiffin_core::{AddOutcome, MenuItemId};

use super::{CliError, currency};

pub fn show(client: &TiffinClient) {
    let cart = client.cart();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    let currency = currency(client);
    for line in cart.lines() {
        println!(
            "{:>4}  {:<30} x{:<3} {:>10}",
            line.menu_item.id,
            line.menu_item.name,
            line.quantity,
            line.unit_price.times(line.quantity).display(currency)
        );
        if !line.special_instructions.is_empty() {
            println!("      note: {}", line.special_instructions);
        }
    }
    println!(
        "{} item(s), total {}",
        cart.item_count(),
        cart.total().display(currency)
    );
}

/// Fetch the item so the cart captures its current price and restaurant.
pub async fn add(
    client: &TiffinClient,
    item: MenuItemId,
    quantity: u32,
    note: &str,
) -> Result<(), CliError> {
    let item = client.api().get_menu_item(item).await?;
    let name = item.name.clone();

    match client.cart().add_item(item, quantity, note) {
        AddOutcome::Appended | AddOutcome::Incremented => {
            println!("Added {quantity} x {name}.");
        }
        AddOutcome::Replaced { .. } => {
            println!("Your cart had items from another restaurant and was replaced.");
            println!("Added {quantity} x {name}.");
        }
        AddOutcome::Ignored => println!("Nothing to add."),
    }
    Ok(())
}

pub fn remove(client: &TiffinClient, item: MenuItemId) {
    if client.cart().remove_item(item) {
        println!("Removed item {item}.");
    } else {
        println!("Item {item} is not in your cart.");
    }
}

pub fn set(client: &TiffinClient, item: MenuItemId, quantity: i64) {
    let found = client.cart().set_quantity(item, quantity);
    match (found, quantity) {
        (false, _) => println!("Item {item} is not in your cart."),
        (true, ..=0) => println!("Removed item {item}."),
        (true, _) => println!("Item {item} quantity set to {quantity}."),
    }
}

pub fn clear(client: &TiffinClient) {
    client.cart().clear();
    println!("Cart cleared.");
}
