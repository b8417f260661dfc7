//! State surviving a restart through the JSON state file.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::SecretString;
use tiffin_client::{ClientError, StorageError, TiffinClient};
use tiffin_core::{MenuItemId, Price, RestaurantId};
use tiffin_integration_tests::{PASSWORD, TestContext, USERNAME};

async fn fill_cart(client: &TiffinClient) {
    let menu = client
        .api()
        .get_restaurant_menu(RestaurantId::new(1))
        .await
        .unwrap();
    client.cart().add_item(menu[0].items[0].clone(), 2, "no onions");
    client.cart().add_item(menu[0].items[1].clone(), 1, "");
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let ctx = TestContext::start().await;
    ctx.mount_catalog().await;

    let client = ctx.open_client();
    fill_cart(&client).await;
    let before = client.cart().snapshot();

    let reopened = ctx.open_client();
    assert_eq!(reopened.cart().snapshot(), before);
    assert_eq!(reopened.cart().total(), Price::from_minor_units(30_000));
    assert_eq!(reopened.cart().restaurant(), Some(RestaurantId::new(1)));
    assert_eq!(reopened.cart().lines()[0].special_instructions, "no onions");
}

#[tokio::test]
async fn test_cart_edits_are_persisted() {
    let ctx = TestContext::start().await;
    ctx.mount_catalog().await;

    let client = ctx.open_client();
    fill_cart(&client).await;
    client.cart().set_quantity(MenuItemId::new(10), 5);
    client.cart().remove_item(MenuItemId::new(11));

    let reopened = ctx.open_client();
    assert_eq!(reopened.cart().item_count(), 5);

    reopened.cart().clear();
    let state = ctx.read_state();
    assert_eq!(state["cart"], "[]");
    assert!(state.get("selected_restaurant").is_none());
}

#[tokio::test]
async fn test_logout_clears_session_keys_only() {
    let ctx = TestContext::start().await;
    ctx.mount_catalog().await;
    ctx.mount_token("a1", "r1").await;
    ctx.mount_profile("a1").await;

    let client = ctx.open_client();
    client
        .session()
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .unwrap();
    fill_cart(&client).await;
    client.session().logout();

    let state = ctx.read_state();
    for key in ["access_token", "refresh_token", "user"] {
        assert!(state.get(key).is_none(), "{key} should be removed");
    }
    assert!(state.get("cart").is_some());

    let reopened = ctx.open_client();
    assert!(!reopened.session().restore().await);
    assert_eq!(reopened.cart().item_count(), 3);
}

#[tokio::test]
async fn test_corrupt_state_file_is_reported() {
    let ctx = TestContext::start().await;
    std::fs::write(ctx.state_path(), "{not json").unwrap();

    let err = TiffinClient::open(ctx.config()).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Storage(StorageError::Corrupt { .. })
    ));
}
