//! Menu items and categories.

use tiffin_core::{MenuCategory, MenuItem, MenuItemId, Page};
use tracing::instrument;

use super::{CategoryQuery, MenuItemQuery};
use crate::error::ClientError;
use crate::gateway::cache::{CacheKey, CacheValue};
use crate::gateway::{ApiGateway, ApiRequest};

impl ApiGateway {
    /// List menu items.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_menu_items(&self, query: &MenuItemQuery) -> Result<Vec<MenuItem>, ClientError> {
        let key = CacheKey::MenuItems(query.clone());
        if let Some(CacheValue::MenuItems(items)) = self.cached(&key).await {
            return Ok(items);
        }

        let page: Page<MenuItem> = self
            .fetch(ApiRequest::get("/menu-items/").query(query.pairs()))
            .await?;
        let items = page.into_items();

        self.cache(key, CacheValue::MenuItems(items.clone())).await;
        Ok(items)
    }

    /// Get one menu item.
    ///
    /// The detail response nests the category, so the item's restaurant is
    /// always resolvable.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the item does not exist.
    #[instrument(skip(self), fields(menu_item_id = %id))]
    pub async fn get_menu_item(&self, id: MenuItemId) -> Result<MenuItem, ClientError> {
        let key = CacheKey::MenuItem(id);
        if let Some(CacheValue::MenuItem(item)) = self.cached(&key).await {
            return Ok(*item);
        }

        let item: MenuItem = self
            .fetch(ApiRequest::get(format!("/menu-items/{id}/")))
            .await?;

        self.cache(key, CacheValue::MenuItem(Box::new(item.clone())))
            .await;
        Ok(item)
    }

    /// List menu categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        query: &CategoryQuery,
    ) -> Result<Vec<MenuCategory>, ClientError> {
        let key = CacheKey::Categories(query.clone());
        if let Some(CacheValue::Categories(categories)) = self.cached(&key).await {
            return Ok(categories);
        }

        let page: Page<MenuCategory> = self
            .fetch(ApiRequest::get("/categories/").query(query.pairs()))
            .await?;
        let categories = page.into_items();

        self.cache(key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}
