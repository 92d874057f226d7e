//! Remote API contract consumed by steps and the orchestrator.
//!
//! The HTTP implementation lives in `dojo-client`; tests use the in-memory
//! double from [`crate::mock`].
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode: {0}")]
    Decode(String),
}

/// Raw outcome of a call whose status the caller inspects itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_created(&self) -> bool {
        self.status == 201
    }

    /// `id` of the resource in the response body, if any.
    pub fn id(&self) -> Option<u64> {
        self.data.get("id").and_then(Value::as_u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prod_type: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// Payload of a product creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub prod_type: u64,
}

#[async_trait]
pub trait DojoApi: Send + Sync {
    async fn get_user(&self, id: u64) -> Result<ApiResponse, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// Not idempotent on the server side; callers check names first.
    async fn create_product(&self, product: &NewProduct) -> Result<ApiResponse, ApiError>;

    async fn add_product_metadata(
        &self,
        product_id: u64,
        name: &str,
        value: &str,
    ) -> Result<ApiResponse, ApiError>;
}
