//! Registration and the current user's profile.

use tiffin_core::UserProfile;
use tracing::instrument;

use crate::error::ClientError;
use crate::gateway::{ApiGateway, ApiRequest};
use crate::validation::Registration;

impl ApiGateway {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the session cannot be refreshed.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        self.fetch(ApiRequest::get("/users/me/")).await
    }

    /// Create an account. Does not log in.
    ///
    /// The form is not validated here; [`SessionStore::register`](crate::SessionStore::register)
    /// validates before calling this.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` with the API's field errors, for
    /// example when the username is taken.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        self.send(ApiRequest::post("/users/register/", registration.to_body()).anonymous())
            .await?;
        Ok(())
    }
}
