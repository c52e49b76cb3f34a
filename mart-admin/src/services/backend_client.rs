//! HTTP client for the NEXT MART backend API.

use crate::config::BackendSettings;
use crate::models::delivery::{
    Delivery, DeliveryHistory, DeliveryList, DeliveryQuery, DeliveryStatusUpdate, DeliveryUpdate,
};
use crate::models::inventory::{InventoryHistoryList, InventoryQuery, InventoryUpdate};
use crate::models::product::{Product, ProductList, ProductPayload, ProductQuery};
use mart_core::error::AppError;
use mart_core::observability::TracedClientExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("resource not found")]
    NotFound,

    #[error("backend rejected the session token")]
    Unauthorized,

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("backend returned status {0}")]
    Status(u16),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => AppError::NotFound(anyhow::anyhow!("Resource not found")),
            BackendError::Unauthorized => {
                AppError::Unauthorized(anyhow::anyhow!("Session token rejected by backend"))
            }
            BackendError::Rejected { message, .. } => AppError::BadRequest(anyhow::anyhow!(message)),
            other => AppError::BadGateway(other.to_string()),
        }
    }
}

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build backend HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-success statuses onto [`BackendError`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                let body = response.text().await.unwrap_or_default();
                // Echo-style `{"message": "..."}` bodies
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v["message"].as_str().map(str::to_string))
                    .unwrap_or(body);
                Err(BackendError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
            other => {
                tracing::warn!(status = %other, "Backend returned an error status");
                Err(BackendError::Status(other.as_u16()))
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    pub(crate) async fn get_json<T, Q>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &Q,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut request = self.client.traced_get(&url).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Backend GET failed");
            BackendError::from(e)
        })?;

        Self::decode(response).await
    }

    pub(crate) async fn post_json<B>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<reqwest::Response, BackendError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut request = self.client.traced_post(&url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Backend POST failed");
            BackendError::from(e)
        })?;

        Self::check(response).await
    }

    async fn patch_json<T, B>(&self, path: &str, token: &str, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        let response = self
            .client
            .traced_patch(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Backend PATCH failed");
                BackendError::from(e)
            })?;

        Self::decode(response).await
    }

    // Products

    pub async fn list_products(
        &self,
        token: &str,
        query: &ProductQuery,
    ) -> Result<ProductList, BackendError> {
        self.get_json("/api/products", Some(token), query).await
    }

    pub async fn get_product(&self, token: &str, id: &str) -> Result<Product, BackendError> {
        self.get_json(&format!("/api/products/{id}"), Some(token), &())
            .await
    }

    pub async fn create_product(
        &self,
        token: &str,
        product: &ProductPayload,
    ) -> Result<Product, BackendError> {
        let response = self.post_json("/api/products", Some(token), product).await?;
        Ok(response.json().await?)
    }

    pub async fn update_product(
        &self,
        token: &str,
        id: &str,
        product: &ProductPayload,
    ) -> Result<Product, BackendError> {
        self.patch_json(&format!("/api/products/{id}"), token, product)
            .await
    }

    pub async fn delete_product(&self, token: &str, id: &str) -> Result<(), BackendError> {
        let url = self.url(&format!("/api/products/{id}"));
        let response = self
            .client
            .traced_delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Backend DELETE failed");
                BackendError::from(e)
            })?;

        Self::check(response).await?;
        Ok(())
    }

    // Inventory

    pub async fn list_inventory_histories(
        &self,
        token: &str,
        query: &InventoryQuery,
    ) -> Result<InventoryHistoryList, BackendError> {
        self.get_json("/api/inventory/histories", Some(token), query)
            .await
    }

    pub async fn product_inventory_histories(
        &self,
        token: &str,
        product_id: &str,
        query: &InventoryQuery,
    ) -> Result<InventoryHistoryList, BackendError> {
        self.get_json(
            &format!("/api/inventory/products/{product_id}/histories"),
            Some(token),
            query,
        )
        .await
    }

    pub async fn update_inventory(
        &self,
        token: &str,
        update: &InventoryUpdate,
    ) -> Result<(), BackendError> {
        self.post_json("/api/inventory/update", Some(token), update)
            .await?;
        Ok(())
    }

    // Deliveries

    pub async fn list_deliveries(
        &self,
        token: &str,
        query: &DeliveryQuery,
    ) -> Result<DeliveryList, BackendError> {
        self.get_json("/api/deliveries", Some(token), query).await
    }

    pub async fn get_delivery(&self, token: &str, id: &str) -> Result<Delivery, BackendError> {
        self.get_json(&format!("/api/deliveries/{id}"), Some(token), &())
            .await
    }

    pub async fn update_delivery(
        &self,
        token: &str,
        id: &str,
        update: &DeliveryUpdate,
    ) -> Result<Delivery, BackendError> {
        self.patch_json(&format!("/api/deliveries/{id}"), token, update)
            .await
    }

    pub async fn update_delivery_status(
        &self,
        token: &str,
        id: &str,
        update: &DeliveryStatusUpdate,
    ) -> Result<Delivery, BackendError> {
        self.patch_json(&format!("/api/deliveries/{id}/status"), token, update)
            .await
    }

    pub async fn delivery_history(
        &self,
        token: &str,
        id: &str,
    ) -> Result<DeliveryHistory, BackendError> {
        self.get_json(&format!("/api/deliveries/{id}/history"), Some(token), &())
            .await
    }
}
