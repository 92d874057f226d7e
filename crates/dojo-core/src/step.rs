//! Step contract: one named, declarative provisioning action
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::api::DojoApi;
use crate::coerce::coerce_bool;
use crate::context::Context;
use crate::error::{BootstrapError, Result};

/// Default for `with_items` when a step does not name its collection.
pub const NO_ITEMS: &str = "ENOITEMS";

#[async_trait]
pub trait Step: Send + Sync {
    /// Key of the step under `steps:` in the bootstrap document.
    fn name(&self) -> &'static str;

    async fn run(&self, api: &dyn DojoApi, ctx: &Context) -> Result<StepReport>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOptions {
    pub allow_existing: bool,
    pub with_items: String,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            allow_existing: false,
            with_items: NO_ITEMS.to_string(),
        }
    }
}

impl StepOptions {
    /// Options declared under `steps.<step>`; absent fields take defaults.
    pub fn resolve(ctx: &Context, step: &str) -> Self {
        let declared = ctx
            .get("steps")
            .and_then(|steps| steps.get(step))
            .and_then(Value::as_object);

        let Some(declared) = declared else {
            return Self::default();
        };

        let allow_existing = declared
            .get("allow_existing")
            .cloned()
            .map(coerce_bool)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let with_items = declared
            .get("with_items")
            .and_then(Value::as_str)
            .unwrap_or(NO_ITEMS)
            .to_string();

        Self {
            allow_existing,
            with_items,
        }
    }

    /// The item collection named by `with_items`.
    ///
    /// Every failure here is a configuration error, raised before the step
    /// touches the network.
    pub fn items<'a>(&self, ctx: &'a Context, step: &str) -> Result<&'a [Value]> {
        if self.with_items == NO_ITEMS {
            return Err(BootstrapError::NoItemsConfigured {
                step: step.to_string(),
            });
        }

        match ctx.get(&self.with_items) {
            None => Err(BootstrapError::MissingConfig(self.with_items.clone())),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(BootstrapError::InvalidConfig(format!(
                "'{}' must be a sequence of item mappings",
                self.with_items
            ))),
        }
    }
}

/// Per-step item tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StepReport {
    pub fn new(step: &str) -> Self {
        Self {
            step: step.to_string(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}
