//! End-to-end tests for the Tiffin client.
//!
//! Every test runs the real client against a `wiremock` server standing in
//! for the ordering API, so no network or credentials are needed:
//!
//! ```bash
//! cargo test -p tiffin-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `ordering_flow` - login, browse, cart and checkout
//! - `session` - restore, revalidation and token refresh
//! - `persistence` - state surviving a restart through the state file

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use tiffin_client::{ClientConfig, MemoryStore, SharedStore, TiffinClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "asha";
pub const PASSWORD: &str = "correct-horse";

/// A mock API plus a scratch directory for state files.
pub struct TestContext {
    pub server: MockServer,
    dir: TempDir,
}

impl TestContext {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(&self.server.uri()).unwrap();
        config.state_path = self.state_path();
        config
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    /// The state file as `key -> value` JSON.
    pub fn read_state(&self) -> Value {
        let contents = std::fs::read_to_string(self.state_path()).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    /// A client over the state file; reopening simulates a restart.
    pub fn open_client(&self) -> TiffinClient {
        TiffinClient::open(self.config()).unwrap()
    }

    /// A client over fresh in-memory storage.
    pub fn memory_client(&self) -> (TiffinClient, SharedStore) {
        let storage: SharedStore = Arc::new(MemoryStore::new());
        let client = TiffinClient::new(self.config(), Arc::clone(&storage)).unwrap();
        (client, storage)
    }

    /// `/token/` issuing `access`/`refresh` for [`USERNAME`] and [`PASSWORD`].
    pub async fn mount_token(&self, access: &str, refresh: &str) {
        Mock::given(method("POST"))
            .and(path("/token/"))
            .and(body_partial_json(json!({"username": USERNAME, "password": PASSWORD})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access": access, "refresh": refresh})),
            )
            .mount(&self.server)
            .await;
    }

    /// `/users/me/` answering requests that carry `access`.
    pub async fn mount_profile(&self, access: &str) {
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .and(header("authorization", format!("Bearer {access}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .mount(&self.server)
            .await;
    }

    /// Restaurant 1 and its menu.
    pub async fn mount_catalog(&self) {
        Mock::given(method("GET"))
            .and(path("/restaurants/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [restaurant_json()]
            })))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/restaurants/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(restaurant_json()))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/restaurants/1/menu/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "category": {"id": 2, "name": "Breakfast", "restaurant": 1},
                "items": [
                    {"id": 10, "name": "Masala Dosa", "price": "120.00", "category": 2, "is_vegetarian": true},
                    {"id": 11, "name": "Idli", "price": "60.00", "category": 2, "is_vegan": true}
                ]
            }])))
            .mount(&self.server)
            .await;
    }
}

pub fn user_json() -> Value {
    json!({
        "id": 5,
        "username": USERNAME,
        "email": "asha@example.com",
        "first_name": "Asha",
        "last_name": "Rao",
        "role": "member",
        "country": "INDIA",
        "phone": "9800000000"
    })
}

pub fn restaurant_json() -> Value {
    json!({
        "id": 1,
        "name": "Dosa Corner",
        "description": "South Indian breakfast",
        "address": "12 MG Road, Bengaluru",
        "country": "INDIA",
        "is_active": true
    })
}
