//! Restaurant and menu browsing.

#![allow(clippy::print_stdout)]

use tiffin_client::{RestaurantQuery, TiffinClient};
use tiffin_core::{Country, CurrencyCode, MenuItem, RestaurantId};

use super::CliError;

/// List restaurants.
pub async fn restaurants(
    client: &TiffinClient,
    search: Option<String>,
    country: Option<Country>,
) -> Result<(), CliError> {
    let query = RestaurantQuery {
        search,
        country,
        is_active: None,
    };
    let restaurants = client.api().list_restaurants(&query).await?;

    if restaurants.is_empty() {
        println!("No restaurants found.");
        return Ok(());
    }

    for restaurant in restaurants {
        println!("{:>4}  {}", restaurant.id, restaurant.name);
        if !restaurant.address.is_empty() {
            println!("      {}", restaurant.address);
        }
    }
    Ok(())
}

/// Show a restaurant's menu grouped by category.
pub async fn menu(client: &TiffinClient, id: RestaurantId) -> Result<(), CliError> {
    let restaurant = client.api().get_restaurant(id).await?;
    let sections = client.api().get_restaurant_menu(id).await?;
    let currency = CurrencyCode::from(restaurant.country);

    println!("{}", restaurant.name);
    if !restaurant.description.is_empty() {
        println!("{}", restaurant.description);
    }

    for section in sections {
        println!();
        println!("== {} ==", section.category.name);
        for item in &section.items {
            println!("{}", menu_line(item, currency));
        }
    }
    Ok(())
}

fn menu_line(item: &MenuItem, currency: CurrencyCode) -> String {
    let mut tags = Vec::new();
    if item.is_vegan {
        tags.push("vegan");
    } else if item.is_vegetarian {
        tags.push("veg");
    }
    if item.is_gluten_free {
        tags.push("gf");
    }
    if !item.is_available {
        tags.push("unavailable");
    }

    let mut line = format!(
        "{:>4}  {:<30} {:>10}",
        item.id,
        item.name,
        item.price.display(currency)
    );
    if !tags.is_empty() {
        line.push_str(&format!("  [{}]", tags.join(", ")));
    }
    line
}
