//! Placing, listing and cancelling orders.
//!
//! Never cached: order status changes on the server at any time.

use tiffin_core::{NewOrder, Order, OrderId, Page};
use tracing::instrument;

use super::{OrderQuery, StatusMessage};
use crate::error::ClientError;
use crate::gateway::{ApiGateway, ApiRequest};

impl ApiGateway {
    /// List orders visible to the current user.
    ///
    /// Admins see every order, managers their country's, members their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, ClientError> {
        let page: Page<Order> = self
            .fetch(ApiRequest::get("/orders/").query(query.pairs()))
            .await?;
        Ok(page.into_items())
    }

    /// List the current user's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ClientError> {
        let page: Page<Order> = self.fetch(ApiRequest::get("/orders/my_orders/")).await?;
        Ok(page.into_items())
    }

    /// Get one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the order does not exist or is not visible.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ClientError> {
        self.fetch(ApiRequest::get(format!("/orders/{id}/"))).await
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` with the API's field errors if the
    /// order is refused, or another error if the request fails.
    #[instrument(skip(self, order), fields(restaurant_id = %order.restaurant, items = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        let body = serde_json::to_value(order)?;
        let created: Order = self.fetch(ApiRequest::post("/orders/", body)).await?;
        tracing::info!(order_id = %created.id, total = %created.total_amount, "Order placed");
        Ok(created)
    }

    /// Cancel an order. Returns the server's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` if the user's role may not cancel
    /// orders, and `ClientError::Api` if the order is already cancelled or
    /// delivered.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<String, ClientError> {
        let response: StatusMessage = self
            .fetch(ApiRequest::post(
                format!("/orders/{id}/cancel/"),
                serde_json::json!({}),
            ))
            .await?;
        Ok(response.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tiffin_core::{Country, MenuItemId, NewOrderItem, OrderStatus, PaymentMethodId, RestaurantId};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionHandle;
    use crate::storage::MemoryStore;

    fn gateway(server: &MockServer) -> ApiGateway {
        let config = ClientConfig::for_base_url(&server.uri()).unwrap();
        ApiGateway::new(&config, SessionHandle::new(Arc::new(MemoryStore::new()))).unwrap()
    }

    fn order_json(id: i64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "restaurant": 1,
            "status": status,
            "country": "INDIA",
            "total_amount": "25.00",
            "delivery_address": "12 MG Road",
            "items": []
        })
    }

    #[tokio::test]
    async fn test_my_orders_accepts_paginated_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/my_orders/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "results": [order_json(2, "PENDING"), order_json(1, "DELIVERED")]
            })))
            .mount(&server)
            .await;

        let orders = gateway(&server).my_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_list_orders_filters_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/"))
            .and(query_param("status", "PENDING"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([order_json(2, "PENDING")])))
            .expect(1)
            .mount(&server)
            .await;

        let orders = gateway(&server)
            .list_orders(&OrderQuery {
                status: Some(OrderStatus::Pending),
                ..OrderQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/"))
            .and(body_json(json!({
                "restaurant": 1,
                "country": "INDIA",
                "delivery_address": "12 MG Road",
                "payment_method": 4,
                "special_instructions": "",
                "items": [{"menu_item": 7, "quantity": 2, "special_instructions": "extra chutney"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(order_json(9, "PENDING")))
            .expect(1)
            .mount(&server)
            .await;

        let order = NewOrder {
            restaurant: RestaurantId::new(1),
            country: Country::India,
            delivery_address: "12 MG Road".to_string(),
            payment_method: PaymentMethodId::new(4),
            special_instructions: String::new(),
            items: vec![NewOrderItem {
                menu_item: MenuItemId::new(7),
                quantity: 2,
                special_instructions: "extra chutney".to_string(),
            }],
        };

        let created = gateway(&server).create_order(&order).await.unwrap();
        assert_eq!(created.id, OrderId::new(9));
    }

    #[tokio::test]
    async fn test_cancel_order_returns_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/3/cancel/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "Order cancelled successfully"})),
            )
            .mount(&server)
            .await;

        let message = gateway(&server).cancel_order(OrderId::new(3)).await.unwrap();
        assert_eq!(message, "Order cancelled successfully");
    }
}
