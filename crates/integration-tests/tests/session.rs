//! Session restore, revalidation and the refresh-on-401 flow.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tiffin_client::{AuthStatus, ClientError, Registration};
use tiffin_core::{Country, RestaurantId};
use tiffin_integration_tests::{PASSWORD, TestContext, USERNAME, user_json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn logged_in(ctx: &TestContext) {
    ctx.mount_token("a1", "r1").await;
    ctx.mount_profile("a1").await;

    let client = ctx.open_client();
    client
        .session()
        .login(USERNAME, &SecretString::from(PASSWORD))
        .await
        .unwrap();
    ctx.server.reset().await;
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_revalidates_persisted_session() {
    let ctx = TestContext::start().await;
    logged_in(&ctx).await;

    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 5, "username": USERNAME, "first_name": "Asha K"})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let client = ctx.open_client();
    assert!(client.session().restore().await);
    assert_eq!(client.session().handle().status(), AuthStatus::Authenticated);
    assert_eq!(client.session().current_user().unwrap().first_name, "Asha K");
}

#[tokio::test]
async fn test_failed_revalidation_logs_out_but_keeps_cart() {
    let ctx = TestContext::start().await;
    logged_in(&ctx).await;
    ctx.mount_catalog().await;

    let client = ctx.open_client();
    let menu = client
        .api()
        .get_restaurant_menu(RestaurantId::new(1))
        .await
        .unwrap();
    client.cart().add_item(menu[0].items[0].clone(), 1, "");
    drop(client);

    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;

    let client = ctx.open_client();
    assert!(!client.session().restore().await);
    assert!(!client.session().is_authenticated());
    assert!(client.session().current_user().is_none());
    assert_eq!(client.cart().item_count(), 1);

    let state = ctx.read_state();
    assert!(state.get("access_token").is_none());
    assert!(state.get("user").is_none());
    assert!(state.get("cart").is_some());
}

#[tokio::test]
async fn test_restore_without_session_makes_no_requests() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let client = ctx.open_client();
    assert!(!client.session().restore().await);
    assert_eq!(client.session().handle().status(), AuthStatus::Anonymous);
}

// ============================================================================
// Token Refresh
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_persisted() {
    let ctx = TestContext::start().await;
    logged_in(&ctx).await;
    ctx.mount_profile("a1").await;

    Mock::given(method("GET"))
        .and(path("/orders/my_orders/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/my_orders/"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let client = ctx.open_client();
    assert!(client.session().restore().await);

    let orders = client.api().my_orders().await.unwrap();
    assert!(orders.is_empty());
    let handle = client.session().handle();
    assert_eq!(handle.access_token().unwrap().expose_secret(), "a2");
    assert_eq!(handle.status(), AuthStatus::Authenticated);

    let state = ctx.read_state();
    assert_eq!(state["access_token"], "a2");
    assert_eq!(state["refresh_token"], "r1");
}

#[tokio::test]
async fn test_rejected_refresh_requires_login() {
    let ctx = TestContext::start().await;
    logged_in(&ctx).await;
    ctx.mount_profile("a1").await;

    Mock::given(method("GET"))
        .and(path("/orders/my_orders/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid or expired"})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let client = ctx.open_client();
    assert!(client.session().restore().await);
    let mut status = client.session().subscribe();

    let err = client.api().my_orders().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!client.session().is_authenticated());
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), AuthStatus::LoginRequired);

    let state = ctx.read_state();
    assert!(state.get("access_token").is_none());
    assert!(state.get("refresh_token").is_none());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/users/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json()))
        .expect(1)
        .mount(&ctx.server)
        .await;
    ctx.mount_token("a1", "r1").await;
    ctx.mount_profile("a1").await;

    let (client, _storage) = ctx.memory_client();
    let registration = Registration {
        username: USERNAME.to_string(),
        email: "asha@example.com".to_string(),
        password: SecretString::from(PASSWORD),
        password2: SecretString::from(PASSWORD),
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        country: Some(Country::India),
        phone: String::new(),
    };

    let user = client.session().register(&registration).await.unwrap();
    assert_eq!(user.username, USERNAME);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_register_with_mismatched_passwords_sends_nothing() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/users/register/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let (client, _storage) = ctx.memory_client();
    let registration = Registration {
        username: USERNAME.to_string(),
        email: "asha@example.com".to_string(),
        password: SecretString::from(PASSWORD),
        password2: SecretString::from("something-else"),
        first_name: String::new(),
        last_name: String::new(),
        country: None,
        phone: String::new(),
    };

    let err = client.session().register(&registration).await.unwrap_err();
    match err {
        ClientError::Validation(errors) => assert!(errors.get("password2").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
}
