//! Dojo Steps: provisioning steps the runner can dispatch to.
//!
//! Each step is keyed by its name under `steps:` in the bootstrap document
//! and reads its items from the collection named by `with_items`.
//!
//! ```text
//! steps.create_product ──► with_items: products ──► create-if-absent per item
//! ```

mod create_product;

pub use create_product::{CreateProductStep, ProductSpec, STEP_NAME as CREATE_PRODUCT};

use dojo_core::{Step, StepRunner};

/// Every step this crate provides.
pub fn default_steps() -> Vec<Box<dyn Step>> {
    vec![Box::new(CreateProductStep::new())]
}

pub fn default_runner() -> StepRunner {
    StepRunner::new(default_steps())
}
