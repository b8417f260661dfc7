//! The user's stored payment methods.

use tiffin_core::{NewPaymentMethod, PaymentMethod, PaymentMethodId};
use tracing::instrument;

use super::StatusMessage;
use crate::error::ClientError;
use crate::gateway::{ApiGateway, ApiRequest};
use crate::validation::validate_payment_method;

impl ApiGateway {
    /// List the current user's payment methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_payment_methods(&self) -> Result<Vec<PaymentMethod>, ClientError> {
        self.fetch(ApiRequest::get("/payment-methods/my_payment_methods/"))
            .await
    }

    /// Save a new payment method.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` before any request when a card is
    /// missing its last four digits or brand, or UPI is missing its id.
    #[instrument(skip(self, method), fields(payment_type = %method.payment_type))]
    pub async fn create_payment_method(
        &self,
        method: &NewPaymentMethod,
    ) -> Result<PaymentMethod, ClientError> {
        validate_payment_method(method)?;
        let body = serde_json::to_value(method)?;
        self.fetch(ApiRequest::post("/payment-methods/", body)).await
    }

    /// Make a payment method the user's default.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Forbidden` if the method belongs to someone else.
    #[instrument(skip(self), fields(payment_method_id = %id))]
    pub async fn set_default_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> Result<String, ClientError> {
        let response: StatusMessage = self
            .fetch(ApiRequest::post(
                format!("/payment-methods/{id}/set_default/"),
                serde_json::json!({}),
            ))
            .await?;
        Ok(response.status)
    }

    /// Delete a payment method.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the method does not exist.
    #[instrument(skip(self), fields(payment_method_id = %id))]
    pub async fn delete_payment_method(&self, id: PaymentMethodId) -> Result<(), ClientError> {
        self.send(ApiRequest::delete(format!("/payment-methods/{id}/")))
            .await?;
        Ok(())
    }
}
