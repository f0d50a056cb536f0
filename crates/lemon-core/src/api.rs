//! Typed application endpoints.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Result;
use crate::client::ApiClient;
use crate::types::User;

/// A feedback form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields of the profile that can be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A titled group of dishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub title: String,
    #[serde(rename = "data")]
    pub items: Vec<MenuItem>,
}

/// Restaurant details. Fields beyond the name are passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    pub name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Application endpoints over the authenticated pipeline.
///
/// Paths come from [`Endpoints`](crate::config::Endpoints).
#[derive(Clone)]
pub struct LemonApi {
    client: Arc<ApiClient>,
}

impl LemonApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Submit feedback and return the server's acknowledgement.
    #[instrument(skip_all)]
    pub async fn submit_feedback(&self, feedback: &Feedback) -> Result<serde_json::Value> {
        let path = &self.client.config().endpoints.feedback;
        debug!(path = %path, "Submitting feedback");
        Ok(self.client.post(path, feedback).await?.json()?)
    }

    /// Update the signed-in user's profile.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let path = &self.client.config().endpoints.user_profile;
        Ok(self.client.put(path, update).await?.json()?)
    }

    /// Fetch the signed-in user's profile.
    pub async fn get_user_profile(&self) -> Result<User> {
        let path = &self.client.config().endpoints.user_profile;
        self.client.get_json(path).await
    }

    /// Fetch the menu, grouped by section.
    pub async fn get_menu_items(&self) -> Result<Vec<MenuSection>> {
        let path = &self.client.config().endpoints.menu_items;
        self.client.get_json(path).await
    }

    /// Fetch restaurant details.
    pub async fn get_restaurant_info(&self) -> Result<RestaurantInfo> {
        let path = &self.client.config().endpoints.restaurant_info;
        self.client.get_json(path).await
    }
}
