//! Typed view over the auth context, plus the two secrets a run handles.
use serde_json::{Map, Value};
use std::fmt;

use dojo_core::{BootstrapError, Context, Result, VarsMap};

/// Env-file variable → auth context key.
pub const AUTH_VARS: [(&str, &str); 5] = [
    ("DD_HOST", "host"),
    ("DD_DEBUG", "debug"),
    ("DD_VERIFY_SSL", "verify_ssl"),
    ("DD_API_VERSION", "api_version"),
    ("DD_USER", "user"),
];

pub const DEFAULT_API_VERSION: &str = "v2";

pub fn auth_vars() -> VarsMap {
    AUTH_VARS
        .iter()
        .map(|(external, internal)| (external.to_string(), internal.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub host: String,
    pub user: String,
    pub api_version: String,
    pub verify_ssl: bool,
    pub debug: bool,
    /// Any other context entries, handed to the client as options.
    pub extra: Map<String, Value>,
}

/// Everything except host and user, as passed to the client constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub api_version: String,
    pub verify_ssl: bool,
    pub debug: bool,
    pub extra: Map<String, Value>,
}

impl AuthSettings {
    pub fn from_context(ctx: &Context) -> Result<Self> {
        let mut extra = ctx.as_map().clone();

        let host = required_str(&mut extra, "host")?
            .trim_end_matches('/')
            .to_string();
        let user = required_str(&mut extra, "user")?;
        let api_version = match extra.remove("api_version") {
            None | Some(Value::Null) => DEFAULT_API_VERSION.to_string(),
            Some(Value::String(v)) if !v.is_empty() => v,
            Some(other) => {
                return Err(BootstrapError::InvalidConfig(format!(
                    "api_version must be a string, got {other}"
                )))
            }
        };
        let verify_ssl = optional_bool(&mut extra, "verify_ssl", true)?;
        let debug = optional_bool(&mut extra, "debug", false)?;

        Ok(Self {
            host,
            user,
            api_version,
            verify_ssl,
            debug,
            extra,
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_version: self.api_version.clone(),
            verify_ssl: self.verify_ssl,
            debug: self.debug,
            extra: self.extra.clone(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/{}/api-token-auth/", self.host, self.api_version)
    }
}

fn required_str(map: &mut Map<String, Value>, key: &str) -> Result<String> {
    match map.remove(key) {
        Some(Value::String(v)) if !v.is_empty() => Ok(v),
        _ => Err(BootstrapError::MissingConfig(key.to_string())),
    }
}

fn optional_bool(map: &mut Map<String, Value>, key: &str, default: bool) -> Result<bool> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(b),
        Some(other) => Err(BootstrapError::InvalidConfig(format!(
            "{key} must be one of 1/0/true/false/True/False, got {other}"
        ))),
    }
}

/// Admin password, sourced only from the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminPassword(String);

impl AdminPassword {
    pub const ENV_VAR: &'static str = "DD_ADMIN_PASSWORD";
    pub const DEFAULT: &'static str = "admin";

    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn from_env() -> Self {
        Self(std::env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminPassword(***)")
    }
}

/// API token returned by the token-auth endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
