//! In-memory [`DojoApi`] that records every call.
//!
//! Enabled for this crate's tests and, through the `mock` feature, for the
//! test suites of the step and orchestrator crates.
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::api::{ApiError, ApiResponse, DojoApi, NewProduct, Product, User};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetUser(u64),
    ListUsers,
    ListProducts,
    CreateProduct(NewProduct),
    AddProductMetadata {
        product_id: u64,
        name: String,
        value: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    products: Vec<Product>,
    users: Vec<User>,
    calls: Vec<ApiCall>,
    next_id: u64,
    failing_creates: HashSet<String>,
    rejected_creates: HashSet<String>,
    fail_metadata: bool,
    fail_get_user: bool,
    fail_list_products: bool,
}

#[derive(Debug, Default)]
pub struct MockDojo {
    state: Mutex<MockState>,
}

impl MockDojo {
    pub fn new() -> Self {
        let mock = Self::default();
        {
            let mut state = mock.lock();
            state.next_id = 1;
            state.users.push(User {
                id: 1,
                username: "admin".to_string(),
            });
        }
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed products that already exist on the server.
    pub fn with_products(self, names: &[&str]) -> Self {
        {
            let mut state = self.lock();
            for name in names {
                let id = state.next_id;
                state.next_id += 1;
                state.products.push(Product {
                    id,
                    name: name.to_string(),
                    description: String::new(),
                    prod_type: Some(1),
                });
            }
        }
        self
    }

    pub fn with_user(self, id: u64, username: &str) -> Self {
        self.lock().users.push(User {
            id,
            username: username.to_string(),
        });
        self
    }

    /// Creating `name` fails at the transport level.
    pub fn failing_create(self, name: &str) -> Self {
        self.lock().failing_creates.insert(name.to_string());
        self
    }

    /// Creating `name` is answered with HTTP 400.
    pub fn rejecting_create(self, name: &str) -> Self {
        self.lock().rejected_creates.insert(name.to_string());
        self
    }

    pub fn failing_metadata(self) -> Self {
        self.lock().fail_metadata = true;
        self
    }

    pub fn failing_get_user(self) -> Self {
        self.lock().fail_get_user = true;
        self
    }

    pub fn failing_list_products(self) -> Self {
        self.lock().fail_list_products = true;
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::CreateProduct(p) => Some(p.name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn metadata_calls(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ApiCall::AddProductMetadata { .. }))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DojoApi for MockDojo {
    async fn get_user(&self, id: u64) -> Result<ApiResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::GetUser(id));
        if state.fail_get_user {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(match state.users.iter().find(|u| u.id == id) {
            Some(user) => ApiResponse::new(200, json!({"id": user.id, "username": user.username})),
            None => ApiResponse::new(404, json!({"detail": "Not found."})),
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListUsers);
        Ok(state.users.clone())
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListProducts);
        if state.fail_list_products {
            return Err(ApiError::Transport("connection reset".to_string()));
        }
        Ok(state.products.clone())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<ApiResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::CreateProduct(product.clone()));

        if state.failing_creates.contains(&product.name) {
            return Err(ApiError::Transport("connection reset".to_string()));
        }
        if state.rejected_creates.contains(&product.name) {
            return Ok(ApiResponse::new(
                400,
                json!({"name": ["product with this name already exists."]}),
            ));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.products.push(Product {
            id,
            name: product.name.clone(),
            description: product.description.clone(),
            prod_type: Some(product.prod_type),
        });
        Ok(ApiResponse::new(
            201,
            json!({"id": id, "name": product.name, "prod_type": product.prod_type}),
        ))
    }

    async fn add_product_metadata(
        &self,
        product_id: u64,
        name: &str,
        value: &str,
    ) -> Result<ApiResponse, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::AddProductMetadata {
            product_id,
            name: name.to_string(),
            value: value.to_string(),
        });
        if state.fail_metadata {
            return Err(ApiError::Status {
                status: 500,
                body: "metadata backend unavailable".to_string(),
            });
        }
        Ok(ApiResponse::new(
            201,
            json!({"product": product_id, "name": name, "value": value}),
        ))
    }
}
