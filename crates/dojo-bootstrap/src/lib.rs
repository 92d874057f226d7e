//! Dojo Bootstrap: provisions a DefectDojo server from declarative config
//!
//! # Run Flow
//!
//! ```text
//! .env ──► auth context ──► token ──► client ──► client test
//!                                                    │
//! bootstrap.yml ──► bootstrap context ──► steps ◄────┘
//! ```
//!
//! Failures before dispatch abort the run. Inside dispatch only configuration
//! errors abort; everything else is logged and the run carries on.
//!
//! `Bootstrapping ENDED` is logged whenever dispatch returns. A missing
//! `steps` mapping or item collection aborts before that point, so such a
//! run ends on the error instead of the completion line.

pub mod logging;
pub mod orchestrator;

pub use orchestrator::{BootstrapConfig, Connector, HttpConnector, Orchestrator, RunReport};

/// Default env file holding the `DD_*` auth variables.
pub const DEFAULT_ENV_FILE: &str = ".env";
/// Default declarative bootstrap document.
pub const DEFAULT_BOOTSTRAP_FILE: &str = "bootstrap.yml";
