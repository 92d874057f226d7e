//! Orchestrator: auth context → client → bootstrap context → steps
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use dojo_client::{auth_vars, create_client, get_api_key, test_client, AdminPassword, AuthSettings};
use dojo_core::{
    create_context, BootstrapError, Context, ContextSource, DispatchReport, DojoApi, Result,
    StepRunner,
};

/// Where a run reads its two configuration sources from.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub env_file: PathBuf,
    pub bootstrap_file: PathBuf,
    /// Let variables already set in the process environment win over the env file.
    pub overlay_env: bool,
}

impl BootstrapConfig {
    pub fn new(env_file: impl Into<PathBuf>, bootstrap_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
            bootstrap_file: bootstrap_file.into(),
            overlay_env: true,
        }
    }

    pub fn without_env_overlay(mut self) -> Self {
        self.overlay_env = false;
        self
    }

    fn auth_source(&self) -> ContextSource {
        ContextSource::EnvFile {
            path: self.env_file.clone(),
            vars_map: auth_vars(),
            overlay_env: self.overlay_env,
        }
    }
}

/// Turns auth settings into an authenticated API handle.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &AuthSettings) -> Result<Box<dyn DojoApi>>;
}

/// Token login followed by an HTTP client carrying the token.
pub struct HttpConnector {
    password: AdminPassword,
}

impl HttpConnector {
    pub fn new(password: AdminPassword) -> Self {
        Self { password }
    }

    pub fn from_env() -> Self {
        Self::new(AdminPassword::from_env())
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, settings: &AuthSettings) -> Result<Box<dyn DojoApi>> {
        let api_key = get_api_key(settings, &self.password).await?;
        let client = create_client(settings, &api_key)?;
        Ok(Box::new(client))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub steps: DispatchReport,
    pub elapsed_ms: u64,
}

pub struct Orchestrator<C> {
    connector: C,
    runner: StepRunner,
}

impl<C: Connector> Orchestrator<C> {
    /// Orchestrator wired with every step `dojo-steps` provides.
    pub fn new(connector: C) -> Self {
        Self::with_runner(connector, dojo_steps::default_runner())
    }

    pub fn with_runner(connector: C, runner: StepRunner) -> Self {
        Self { connector, runner }
    }

    /// Build the auth context, authenticate, and prove the client works.
    /// Every failure here is fatal.
    pub async fn connect(&self, config: &BootstrapConfig) -> Result<Box<dyn DojoApi>> {
        let auth = create_context(&config.auth_source())?;
        let settings = AuthSettings::from_context(&auth).map_err(|e| {
            error!(
                path = %config.env_file.display(),
                error = %e,
                "Auth configuration is incomplete"
            );
            e
        })?;

        let api = self.connector.connect(&settings).await?;
        if !test_client(api.as_ref()).await? {
            return Err(BootstrapError::ClientTestFailed(
                "administrative user lookup was not successful".to_string(),
            ));
        }
        info!("Client tested successfully");
        Ok(api)
    }

    pub fn load_bootstrap(&self, config: &BootstrapConfig) -> Result<Context> {
        info!("Generating bootstrap config");
        create_context(&ContextSource::yaml_file(&config.bootstrap_file))
    }

    pub async fn run(&self, config: &BootstrapConfig) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        self.run_inner(config, run_id)
            .instrument(info_span!("bootstrap", run_id = %run_id))
            .await
    }

    async fn run_inner(&self, config: &BootstrapConfig, run_id: Uuid) -> Result<RunReport> {
        let start = Instant::now();
        info!("Bootstrapping STARTS");

        let api = self.connect(config).await?;
        let bootstrap = self.load_bootstrap(config)?;
        let steps = self.runner.dispatch(api.as_ref(), &bootstrap).await?;

        info!(
            executed = steps.executed.len(),
            ignored = steps.ignored.len(),
            failed = steps.failed.len(),
            "Bootstrapping ENDED"
        );

        Ok(RunReport {
            run_id,
            steps,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
