//! Token authentication against the api-token-auth endpoint
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use dojo_core::{BootstrapError, Result};

use crate::settings::{AdminPassword, ApiKey, AuthSettings};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Log in as `settings.user` and return the user's API token.
///
/// The password never comes from the context: it is passed in separately so
/// it cannot end up in context debug output.
pub async fn get_api_key(settings: &AuthSettings, password: &AdminPassword) -> Result<ApiKey> {
    let url = settings.token_url();
    info!(url = %url, user = %settings.user, "Requesting API token");

    let http = Client::builder()
        .danger_accept_invalid_certs(!settings.verify_ssl)
        .build()
        .map_err(|e| BootstrapError::Auth(e.to_string()))?;

    let form = [
        ("username", settings.user.as_str()),
        ("password", password.expose()),
    ];
    let response = http.post(&url).form(&form).send().await.map_err(|e| {
        error!(url = %url, "Failed to reach token endpoint, set DEBUG for details");
        debug!(error = ?e, "Token request failure");
        BootstrapError::Auth(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(status = status.as_u16(), "Token endpoint rejected the login");
        return Err(BootstrapError::Auth(format!("login rejected with HTTP {status}")));
    }

    let body: TokenResponse = response.json().await.map_err(|e| {
        error!("Token endpoint returned an unreadable body, set DEBUG for details");
        debug!(error = ?e, "Token decode failure");
        BootstrapError::Auth(e.to_string())
    })?;

    body.token
        .filter(|t| !t.is_empty())
        .map(ApiKey::new)
        .ok_or_else(|| {
            error!("Token endpoint response carried no token");
            BootstrapError::Auth("no token in response".to_string())
        })
}
