//! Restaurant listing, detail and menu.

use tiffin_core::{MenuSection, Page, Restaurant, RestaurantId};
use tracing::instrument;

use super::RestaurantQuery;
use crate::error::ClientError;
use crate::gateway::cache::{CacheKey, CacheValue};
use crate::gateway::{ApiGateway, ApiRequest};

impl ApiGateway {
    /// List restaurants visible to the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_restaurants(
        &self,
        query: &RestaurantQuery,
    ) -> Result<Vec<Restaurant>, ClientError> {
        let key = CacheKey::Restaurants(query.clone());
        if let Some(CacheValue::Restaurants(restaurants)) = self.cached(&key).await {
            return Ok(restaurants);
        }

        let page: Page<Restaurant> = self
            .fetch(ApiRequest::get("/restaurants/").query(query.pairs()))
            .await?;
        let restaurants = page.into_items();

        self.cache(key, CacheValue::Restaurants(restaurants.clone()))
            .await;
        Ok(restaurants)
    }

    /// Get one restaurant.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the restaurant does not exist or is
    /// outside the user's country.
    #[instrument(skip(self), fields(restaurant_id = %id))]
    pub async fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant, ClientError> {
        let key = CacheKey::Restaurant(id);
        if let Some(CacheValue::Restaurant(restaurant)) = self.cached(&key).await {
            return Ok(*restaurant);
        }

        let restaurant: Restaurant = self
            .fetch(ApiRequest::get(format!("/restaurants/{id}/")))
            .await?;

        self.cache(key, CacheValue::Restaurant(Box::new(restaurant.clone())))
            .await;
        Ok(restaurant)
    }

    /// Get a restaurant's active categories with their available items.
    ///
    /// Items come back with a bare category id, so each one is stamped with
    /// `id` as its restaurant; this is what lets the cart scope them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(restaurant_id = %id))]
    pub async fn get_restaurant_menu(
        &self,
        id: RestaurantId,
    ) -> Result<Vec<MenuSection>, ClientError> {
        let key = CacheKey::Menu(id);
        if let Some(CacheValue::Menu(sections)) = self.cached(&key).await {
            return Ok(sections);
        }

        let sections: Vec<MenuSection> = self
            .fetch(ApiRequest::get(format!("/restaurants/{id}/menu/")))
            .await?;
        let sections: Vec<MenuSection> = sections
            .into_iter()
            .map(|section| MenuSection {
                items: section
                    .items
                    .into_iter()
                    .map(|item| item.with_restaurant(id))
                    .collect(),
                category: section.category,
            })
            .collect();

        self.cache(key, CacheValue::Menu(sections.clone())).await;
        Ok(sections)
    }
}
