//! Turning the cart into a placed order.

use tiffin_core::{Cart, Country, NewOrder, Order, PaymentMethod, PaymentMethodId, RestaurantId};
use tracing::instrument;

use crate::cart::CartStore;
use crate::error::{ClientError, add_breadcrumb};
use crate::gateway::ApiGateway;
use crate::validation::{FieldErrors, GENERAL_FIELD};

/// Delivery and payment details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub delivery_address: String,
    pub country: Country,
    /// Usually preselected with [`default_payment_method`].
    pub payment_method: Option<PaymentMethodId>,
    pub special_instructions: String,
}

impl CheckoutRequest {
    /// Build the order payload for `cart`.
    ///
    /// # Errors
    ///
    /// Returns every failing field: an empty cart, a blank address, no
    /// payment method, or a cart whose restaurant cannot be resolved.
    pub fn to_order(&self, cart: &Cart) -> Result<NewOrder, FieldErrors> {
        let mut errors = FieldErrors::new();

        if cart.is_empty() {
            errors.add(GENERAL_FIELD, "Your cart is empty");
        }
        if self.delivery_address.trim().is_empty() {
            errors.add("delivery_address", "Please enter a delivery address");
        }
        if self.payment_method.is_none() {
            errors.add("payment_method", "Please select a payment method");
        }

        let restaurant = order_restaurant(cart);
        if !cart.is_empty() && restaurant.is_none() {
            errors.add(
                "restaurant",
                "Could not determine the restaurant for this cart",
            );
        }

        match (restaurant, self.payment_method) {
            (Some(restaurant), Some(payment_method)) if errors.is_empty() => Ok(NewOrder {
                restaurant,
                country: self.country,
                delivery_address: self.delivery_address.trim().to_string(),
                payment_method,
                special_instructions: self.special_instructions.clone(),
                items: cart.order_items(),
            }),
            _ => Err(errors),
        }
    }
}

/// Validate the cart and request, place the order, and clear the cart.
///
/// The cart is cleared only after the API accepts the order; on any error it
/// is left as it was.
///
/// # Errors
///
/// Returns `ClientError::Validation` before any request when the cart or
/// request is incomplete, or the API's error when the order is refused.
#[instrument(skip(gateway, cart, request))]
pub async fn place_order(
    gateway: &ApiGateway,
    cart: &CartStore,
    request: &CheckoutRequest,
) -> Result<Order, ClientError> {
    let order = request.to_order(&cart.snapshot())?;
    let order = gateway.create_order(&order).await?;

    cart.clear();
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );
    Ok(order)
}

/// The method flagged as the user's default, if any.
#[must_use]
pub fn default_payment_method(methods: &[PaymentMethod]) -> Option<&PaymentMethod> {
    methods.iter().find(|method| method.is_default)
}

/// The first line's restaurant, falling back to the cart's marker.
fn order_restaurant(cart: &Cart) -> Option<RestaurantId> {
    cart.lines()
        .first()
        .and_then(|line| line.restaurant_id)
        .or_else(|| cart.restaurant())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tiffin_core::{MenuItem, PaymentType, Price, RestaurantRef};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionHandle;
    use crate::storage::{MemoryStore, SharedStore};

    fn item(id: i64, restaurant: Option<RestaurantRef>) -> MenuItem {
        let item: MenuItem = serde_json::from_value(json!({
            "id": id, "name": "Dosa", "price": "10.00"
        }))
        .unwrap();
        MenuItem { restaurant, ..item }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            delivery_address: "  12 MG Road ".to_string(),
            country: Country::India,
            payment_method: Some(PaymentMethodId::new(4)),
            special_instructions: "Ring twice".to_string(),
        }
    }

    fn fixtures(server: &MockServer) -> (ApiGateway, CartStore) {
        let storage: SharedStore = Arc::new(MemoryStore::new());
        let config = ClientConfig::for_base_url(&server.uri()).unwrap();
        let gateway = ApiGateway::new(&config, SessionHandle::new(Arc::clone(&storage))).unwrap();
        (gateway, CartStore::load(storage))
    }

    #[test]
    fn test_empty_request_reports_every_field() {
        let errors = CheckoutRequest::default().to_order(&Cart::new()).unwrap_err();
        assert!(errors.get(GENERAL_FIELD).is_some());
        assert!(errors.get("delivery_address").is_some());
        assert!(errors.get("payment_method").is_some());
        assert!(errors.get("restaurant").is_none());
    }

    #[test]
    fn test_unresolved_restaurant_is_rejected() {
        let mut cart = Cart::new();
        cart.add_item(item(1, Some(RestaurantRef::Text("abc".to_string()))), 1, "");

        let errors = request().to_order(&cart).unwrap_err();
        assert!(errors.get("restaurant").is_some());
    }

    #[test]
    fn test_order_built_from_cart() {
        let mut cart = Cart::new();
        cart.add_item(item(7, Some(RestaurantRef::Id(RestaurantId::new(1)))), 2, "extra chutney");

        let order = request().to_order(&cart).unwrap();
        assert_eq!(order.restaurant, RestaurantId::new(1));
        assert_eq!(order.delivery_address, "12 MG Road");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].special_instructions, "extra chutney");
    }

    #[tokio::test]
    async fn test_place_order_clears_cart_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/"))
            .and(body_partial_json(json!({"restaurant": 1, "payment_method": 4})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 12, "restaurant": 1, "status": "PENDING", "total_amount": "20.00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (gateway, cart) = fixtures(&server);
        cart.add_item(item(7, Some(RestaurantRef::Id(RestaurantId::new(1)))), 2, "");

        let order = place_order(&gateway, &cart, &request()).await.unwrap();
        assert_eq!(order.total_amount, Price::from_minor_units(2000));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_keeps_cart_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (gateway, cart) = fixtures(&server);
        cart.add_item(item(7, Some(RestaurantRef::Id(RestaurantId::new(1)))), 2, "");

        let err = place_order(&gateway, &cart, &request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_place_order_validates_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (gateway, cart) = fixtures(&server);
        let err = place_order(&gateway, &cart, &request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_default_payment_method() {
        let methods: Vec<PaymentMethod> = serde_json::from_value(json!([
            {"id": 1, "payment_type": "CASH_ON_DELIVERY"},
            {"id": 2, "payment_type": "UPI", "upi_id": "asha@upi", "is_default": true}
        ]))
        .unwrap();

        let chosen = default_payment_method(&methods).unwrap();
        assert_eq!(chosen.id, PaymentMethodId::new(2));
        assert_eq!(chosen.payment_type, PaymentType::Upi);
        assert!(default_payment_method(&methods[..1]).is_none());
    }
}
