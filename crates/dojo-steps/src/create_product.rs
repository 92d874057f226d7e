//! `create_product`: create-if-absent for every declared product
//!
//! ```yaml
//! steps:
//!   create_product:
//!     allow_existing: true
//!     with_items: products
//! products:
//!   - name: Payments API
//!     description: Card processing backend
//!     prod_type: 1
//!     account: "123456789012"
//! ```
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use dojo_core::{
    ApiError, BootstrapError, Context, DojoApi, NewProduct, Result, Step, StepOptions, StepReport,
};

pub const STEP_NAME: &str = "create_product";

pub const NO_NAME: &str = "ENOPRODNAME";
pub const NO_DESCRIPTION: &str = "ENOPRODDESCR";
pub const DEFAULT_PROD_TYPE: u64 = 1;
pub const NO_ACCOUNT: &str = "none";

/// Metadata key tagging a product with its owning account.
pub const ACCOUNT_METADATA: &str = "account";

/// One declared product with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    pub name: String,
    pub description: String,
    pub prod_type: u64,
    pub account: String,
}

impl ProductSpec {
    pub fn from_item(item: &Value) -> Result<Self> {
        let fields = item
            .as_object()
            .ok_or_else(|| BootstrapError::InvalidItem(format!("expected a mapping, got {item}")))?;

        let text = |key: &str, default: &str| match fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        };

        let prod_type = match fields.get("prod_type") {
            None | Some(Value::Null) => DEFAULT_PROD_TYPE,
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid_prod_type(item))?,
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid_prod_type(item))?,
            Some(_) => return Err(invalid_prod_type(item)),
        };

        Ok(Self {
            name: text("name", NO_NAME),
            description: text("description", NO_DESCRIPTION),
            prod_type,
            account: text("account", NO_ACCOUNT),
        })
    }

    pub fn new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.clone(),
            description: self.description.clone(),
            prod_type: self.prod_type,
        }
    }
}

fn invalid_prod_type(item: &Value) -> BootstrapError {
    BootstrapError::InvalidItem(format!("prod_type must be a positive integer in {item}"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Created,
    Skipped,
}

#[derive(Debug, Default)]
pub struct CreateProductStep;

impl CreateProductStep {
    pub fn new() -> Self {
        Self
    }

    async fn provision(
        &self,
        api: &dyn DojoApi,
        item: &Value,
        existing: &HashSet<String>,
        allow_existing: bool,
    ) -> Result<Outcome> {
        let spec = ProductSpec::from_item(item)?;

        if existing.contains(&spec.name) {
            if allow_existing {
                info!("Product '{}' already exists, skipping", spec.name);
                return Ok(Outcome::Skipped);
            }
            return Err(BootstrapError::ItemExists { name: spec.name });
        }

        let response = api.create_product(&spec.new_product()).await?;
        if !response.is_created() {
            return Err(ApiError::Status {
                status: response.status,
                body: response.data.to_string(),
            }
            .into());
        }

        match response.id() {
            Some(id) => self.tag_account(api, id, &spec).await,
            None => {
                warn!(product = %spec.name, "Create response carried no id, account not tagged");
            }
        }

        info!("Added '{}'", spec.name);
        Ok(Outcome::Created)
    }

    /// Best effort: the product exists either way.
    async fn tag_account(&self, api: &dyn DojoApi, product_id: u64, spec: &ProductSpec) {
        match api
            .add_product_metadata(product_id, ACCOUNT_METADATA, &spec.account)
            .await
        {
            Ok(response) if response.success() => {
                debug!(product = %spec.name, account = %spec.account, "Tagged product with account");
            }
            Ok(response) => {
                warn!(
                    product = %spec.name,
                    status = response.status,
                    "Account metadata was rejected"
                );
            }
            Err(e) => {
                warn!(product = %spec.name, "Failed to attach account metadata, set DEBUG for details");
                debug!(error = ?e, "Metadata failure");
            }
        }
    }
}

#[async_trait]
impl Step for CreateProductStep {
    fn name(&self) -> &'static str {
        STEP_NAME
    }

    async fn run(&self, api: &dyn DojoApi, ctx: &Context) -> Result<StepReport> {
        let options = StepOptions::resolve(ctx, STEP_NAME);
        let items = options.items(ctx, STEP_NAME)?;

        // Read once; items created below are not added back.
        let existing: HashSet<String> = api
            .list_products()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        debug!(existing = existing.len(), items = items.len(), "Fetched existing products");

        let mut report = StepReport::new(STEP_NAME);
        for item in items {
            match self
                .provision(api, item, &existing, options.allow_existing)
                .await
            {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!(item = %item, "Error in creating new product, set DEBUG for details");
                    debug!(error = ?e, "Item failure");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
