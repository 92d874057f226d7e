//! Step Runner: dispatches declared steps to their handlers in order
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::api::DojoApi;
use crate::context::Context;
use crate::error::{BootstrapError, Result};
use crate::step::{Step, StepReport};

pub struct StepRunner {
    steps: Vec<Box<dyn Step>>,
}

/// A step name as declared in the bootstrap document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStep {
    pub name: String,
    pub handled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub executed: Vec<StepReport>,
    /// Declared names with no registered handler.
    pub ignored: Vec<String>,
    /// Steps that raised a recoverable error.
    pub failed: Vec<String>,
    pub elapsed_ms: u64,
}

impl StepRunner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn handler(&self, name: &str) -> Option<&dyn Step> {
        self.steps.iter().find(|s| s.name() == name).map(|s| s.as_ref())
    }

    /// Declared steps in document order, flagged with whether a handler exists.
    pub fn plan(&self, ctx: &Context) -> Result<Vec<PlannedStep>> {
        let steps = ctx
            .get("steps")
            .and_then(Value::as_object)
            .ok_or_else(|| BootstrapError::MissingConfig("steps".to_string()))?;

        Ok(steps
            .keys()
            .map(|name| PlannedStep {
                name: name.clone(),
                handled: self.handler(name).is_some(),
            })
            .collect())
    }

    /// Run every declared step that has a handler, strictly in order.
    ///
    /// Unknown names are skipped without error. Fatal errors abort the
    /// dispatch; any other step failure is logged and the next step runs.
    pub async fn dispatch(&self, api: &dyn DojoApi, ctx: &Context) -> Result<DispatchReport> {
        let start = Instant::now();
        let mut report = DispatchReport::default();

        for planned in self.plan(ctx)? {
            let Some(step) = self.handler(&planned.name) else {
                debug!(step = %planned.name, "No handler registered for step, ignoring");
                report.ignored.push(planned.name);
                continue;
            };

            info!("Running step '{}'", planned.name);
            match step.run(api, ctx).await {
                Ok(step_report) => {
                    info!(
                        step = %planned.name,
                        created = step_report.created,
                        skipped = step_report.skipped,
                        failed = step_report.failed,
                        "Step completed"
                    );
                    report.executed.push(step_report);
                }
                Err(e) if e.is_fatal() => {
                    error!(step = %planned.name, error = %e, "Step configuration is invalid");
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        step = %planned.name,
                        "Exception raised in bootstrapping step, set DEBUG for details"
                    );
                    debug!(error = ?e, "Step failure");
                    report.failed.push(planned.name);
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }
}
