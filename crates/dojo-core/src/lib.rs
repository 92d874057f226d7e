//! Dojo Core: context assembly, step contract and dispatch
//!
//! Building blocks shared by the client, the step implementations and the
//! orchestrator binary.

pub mod api;
pub mod coerce;
pub mod context;
pub mod error;
pub mod runner;
pub mod step;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use api::{ApiError, ApiResponse, DojoApi, NewProduct, Product, User};
pub use coerce::coerce_bool;
pub use context::{create_context, Context, ContextSource, VarsMap};
pub use error::{BootstrapError, Result};
pub use runner::{DispatchReport, PlannedStep, StepRunner};
pub use step::{Step, StepOptions, StepReport, NO_ITEMS};
