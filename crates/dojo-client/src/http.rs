//! reqwest-backed implementation of [`DojoApi`]
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use dojo_core::{ApiError, ApiResponse, BootstrapError, DojoApi, NewProduct, Product, Result, User};

use crate::settings::{ApiKey, ClientOptions};

/// List envelope. Older API versions wrap results in `objects`.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(alias = "objects", default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

pub struct HttpDojoClient {
    http: Client,
    api_root: String,
    user: String,
    debug: bool,
}

impl HttpDojoClient {
    pub fn new(host: &str, api_key: &ApiKey, user: &str, options: &ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&format!("Token {}", api_key.expose()))
            .map_err(|e| BootstrapError::Client(format!("invalid API key: {e}")))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!options.verify_ssl);

        for (key, value) in &options.extra {
            match (key.as_str(), value.as_u64()) {
                ("timeout", Some(secs)) => builder = builder.timeout(Duration::from_secs(secs)),
                _ => debug!(option = %key, "Ignoring unsupported client option"),
            }
        }

        let http = builder
            .build()
            .map_err(|e| BootstrapError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_root: format!("{}/api/{}", host.trim_end_matches('/'), options.api_version),
            user: user.to_string(),
            debug: options.debug,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<ApiResponse, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if self.debug {
            debug!(status, body = %body, "API response");
        }

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        Ok(ApiResponse::new(status, data))
    }

    /// GET every page of a list endpoint.
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut url = Some(self.endpoint(path));

        while let Some(current) = url.take() {
            if self.debug {
                debug!(url = %current, "GET");
            }
            let response = self.send(self.http.get(&current)).await?;
            if !response.success() {
                return Err(ApiError::Status {
                    status: response.status,
                    body: response.data.to_string(),
                });
            }
            let page: Page<T> = serde_json::from_value(response.data)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            items.extend(page.results);
            url = page.next;
        }

        Ok(items)
    }
}

#[async_trait]
impl DojoApi for HttpDojoClient {
    async fn get_user(&self, id: u64) -> std::result::Result<ApiResponse, ApiError> {
        self.send(self.http.get(self.endpoint(&format!("users/{id}/")))).await
    }

    async fn list_users(&self) -> std::result::Result<Vec<User>, ApiError> {
        self.list_all("users/").await
    }

    async fn list_products(&self) -> std::result::Result<Vec<Product>, ApiError> {
        self.list_all("products/").await
    }

    async fn create_product(&self, product: &NewProduct) -> std::result::Result<ApiResponse, ApiError> {
        self.send(self.http.post(self.endpoint("products/")).json(product))
            .await
    }

    async fn add_product_metadata(
        &self,
        product_id: u64,
        name: &str,
        value: &str,
    ) -> std::result::Result<ApiResponse, ApiError> {
        let body = json!({"product": product_id, "name": name, "value": value});
        self.send(self.http.post(self.endpoint("metadata/")).json(&body))
            .await
    }
}
