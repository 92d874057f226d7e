//! Dojo Client: authenticated access to the remote DefectDojo API

pub mod auth;
pub mod factory;
pub mod http;
pub mod settings;

pub use auth::get_api_key;
pub use factory::{create_client, test_client, ADMIN_USER_ID};
pub use http::HttpDojoClient;
pub use settings::{auth_vars, AdminPassword, ApiKey, AuthSettings, ClientOptions};
