//! Unified Error Model
use thiserror::Error;

use crate::api::ApiError;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("CONTEXT/{0} is not implemented, choose an explicit context source")]
    NotImplemented(String),

    #[error("CONFIG/missing required key '{0}'")]
    MissingConfig(String),

    #[error("CONFIG/{0}")]
    InvalidConfig(String),

    #[error("CONFIG/step '{step}' does not name an item collection (with_items)")]
    NoItemsConfigured { step: String },

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),

    #[error("ENV/{0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("YAML/{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("AUTH/{0}")]
    Auth(String),

    #[error("CLIENT/{0}")]
    Client(String),

    #[error("CLIENT/test failed: {0}")]
    ClientTestFailed(String),

    #[error("API/{0}")]
    Api(#[from] ApiError),

    #[error("ITEM/'{name}' already exists and allow_existing is false")]
    ItemExists { name: String },

    #[error("ITEM/{0}")]
    InvalidItem(String),
}

impl BootstrapError {
    /// Fatal errors abort the whole run; everything else is logged by the
    /// caller and the run moves on to the next item or step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotImplemented(_)
                | Self::MissingConfig(_)
                | Self::InvalidConfig(_)
                | Self::NoItemsConfigured { .. }
                | Self::Auth(_)
                | Self::Client(_)
                | Self::ClientTestFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        assert!(BootstrapError::MissingConfig("products".into()).is_fatal());
        assert!(BootstrapError::NoItemsConfigured { step: "create_product".into() }.is_fatal());
        assert!(BootstrapError::ClientTestFailed("refused".into()).is_fatal());
    }

    #[test]
    fn item_and_api_errors_are_recoverable() {
        assert!(!BootstrapError::ItemExists { name: "Alpha".into() }.is_fatal());
        assert!(!BootstrapError::Api(ApiError::Transport("reset".into())).is_fatal());
        assert!(!BootstrapError::InvalidItem("not a mapping".into()).is_fatal());
    }

    #[test]
    fn messages_carry_category_prefix() {
        let err = BootstrapError::MissingConfig("steps".into());
        assert_eq!(err.to_string(), "CONFIG/missing required key 'steps'");
    }
}
