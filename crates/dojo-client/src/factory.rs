//! Client construction and the pre-flight connectivity check
use tracing::{debug, error, info};

use dojo_core::{BootstrapError, DojoApi, Result};

use crate::http::HttpDojoClient;
use crate::settings::{ApiKey, AuthSettings};

/// The administrative user every installation starts with.
pub const ADMIN_USER_ID: u64 = 1;

pub fn create_client(settings: &AuthSettings, api_key: &ApiKey) -> Result<HttpDojoClient> {
    let options = settings.client_options();
    debug!(
        host = %settings.host,
        user = %settings.user,
        options = ?options,
        "Creating DefectDojo client"
    );

    HttpDojoClient::new(&settings.host, api_key, &settings.user, &options).map_err(|e| {
        error!("Failed to create DD client, set DEBUG for details");
        debug!(error = ?e, "Client construction failure");
        e
    })
}

/// Fetch the admin user to prove the client is authenticated and the server
/// reachable. A transport failure here is fatal.
pub async fn test_client(api: &dyn DojoApi) -> Result<bool> {
    info!("Testing client configuration is valid");

    match api.get_user(ADMIN_USER_ID).await {
        Ok(response) => {
            if !response.success() {
                error!(status = response.status, "Client test request was not successful");
            }
            Ok(response.success())
        }
        Err(e) => {
            error!("Client failed with exception, use DEBUG for details");
            debug!(error = ?e, "Client test failure");
            Err(BootstrapError::ClientTestFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_core::mock::{ApiCall, MockDojo};
    use serde_json::Map;

    #[tokio::test]
    async fn test_client_reads_admin_user() {
        let api = MockDojo::new();
        assert!(test_client(&api).await.unwrap());
        assert_eq!(api.calls(), vec![ApiCall::GetUser(ADMIN_USER_ID)]);
    }

    #[tokio::test]
    async fn transport_failure_is_escalated() {
        let api = MockDojo::new().failing_get_user();
        let err = test_client(&api).await.unwrap_err();
        assert!(matches!(err, BootstrapError::ClientTestFailed(_)));
    }

    #[test]
    fn create_client_uses_settings() {
        let settings = AuthSettings {
            host: "https://dojo.local".to_string(),
            user: "admin".to_string(),
            api_version: "v2".to_string(),
            verify_ssl: false,
            debug: true,
            extra: Map::new(),
        };
        let client = create_client(&settings, &ApiKey::new("token")).unwrap();
        assert_eq!(client.endpoint("products/"), "https://dojo.local/api/v2/products/");
    }
}
