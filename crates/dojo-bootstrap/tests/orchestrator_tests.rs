//! End-to-end runs of the orchestrator against the in-memory API.
//!
//! Auth and bootstrap files are real files on disk; only the network side is
//! replaced, through a `Connector` handing out a shared `MockDojo`.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use tracing_subscriber::fmt::MakeWriter;

use dojo_bootstrap::{BootstrapConfig, Connector, Orchestrator};
use dojo_client::AuthSettings;
use dojo_core::mock::{ApiCall, MockDojo};
use dojo_core::{
    ApiError, ApiResponse, BootstrapError, DojoApi, NewProduct, Product, Result, User,
};

// =============================================================================
// Harness
// =============================================================================

struct Shared(Arc<MockDojo>);

#[async_trait]
impl DojoApi for Shared {
    async fn get_user(&self, id: u64) -> std::result::Result<ApiResponse, ApiError> {
        self.0.get_user(id).await
    }

    async fn list_users(&self) -> std::result::Result<Vec<User>, ApiError> {
        self.0.list_users().await
    }

    async fn list_products(&self) -> std::result::Result<Vec<Product>, ApiError> {
        self.0.list_products().await
    }

    async fn create_product(&self, product: &NewProduct) -> std::result::Result<ApiResponse, ApiError> {
        self.0.create_product(product).await
    }

    async fn add_product_metadata(
        &self,
        product_id: u64,
        name: &str,
        value: &str,
    ) -> std::result::Result<ApiResponse, ApiError> {
        self.0.add_product_metadata(product_id, name, value).await
    }
}

#[derive(Clone)]
struct MockConnector {
    api: Arc<MockDojo>,
    seen: Arc<Mutex<Option<AuthSettings>>>,
}

impl MockConnector {
    fn new(api: MockDojo) -> Self {
        Self {
            api: Arc::new(api),
            seen: Arc::new(Mutex::new(None)),
        }
    }

    fn seen(&self) -> Option<AuthSettings> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, settings: &AuthSettings) -> Result<Box<dyn DojoApi>> {
        *self.seen.lock().unwrap() = Some(settings.clone());
        Ok(Box::new(Shared(Arc::clone(&self.api))))
    }
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(env: &Path, bootstrap: &Path) -> BootstrapConfig {
    BootstrapConfig::new(env, bootstrap).without_env_overlay()
}

fn fixture(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    Path::new(&manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("testing/fixtures")
        .join(name)
}

const SINGLE_PRODUCT: &str = r#"
steps:
  create_product:
    with_items: products
products:
  - name: P1
"#;

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn end_to_end_creates_declared_product() {
    let (logs, _guard) = capture_logs();
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let bootstrap = write(&dir, "bootstrap.yml", SINGLE_PRODUCT);
    let connector = MockConnector::new(MockDojo::new());

    let report = Orchestrator::new(connector.clone())
        .run(&config(&env, &bootstrap))
        .await
        .unwrap();

    let seen = connector.seen().unwrap();
    assert_eq!((seen.host.as_str(), seen.user.as_str()), ("h", "u"));
    assert_eq!(connector.api.created_names(), vec!["P1"]);
    assert_eq!(connector.api.metadata_calls().len(), 1);
    assert_eq!(connector.api.calls()[0], ApiCall::GetUser(1));
    assert_eq!(report.steps.executed[0].created, 1);

    let output = logs.contents();
    assert!(output.contains("Bootstrapping STARTS"));
    assert!(output.contains("Client tested successfully"));
    assert!(output.contains("Bootstrapping ENDED"));
}

#[tokio::test]
async fn fixture_run_skips_existing_and_ignores_unknown_steps() {
    let connector = MockConnector::new(MockDojo::new().with_products(&["Identity"]));

    let report = Orchestrator::new(connector.clone())
        .run(&config(&fixture("auth.env"), &fixture("bootstrap.yml")))
        .await
        .unwrap();

    let seen = connector.seen().unwrap();
    assert_eq!(seen.host, "http://localhost:8080");
    assert!(!seen.verify_ssl);
    assert!(!seen.debug);

    assert_eq!(connector.api.created_names(), vec!["Payments API", "Marketing Site"]);
    assert_eq!(report.steps.executed[0].skipped, 1);
    assert_eq!(report.steps.ignored, vec!["create_engagement"]);
}

#[tokio::test]
async fn step_failure_is_swallowed_and_run_completes() {
    let (logs, _guard) = capture_logs();
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let bootstrap = write(&dir, "bootstrap.yml", SINGLE_PRODUCT);
    let connector = MockConnector::new(MockDojo::new().failing_list_products());

    let report = Orchestrator::new(connector.clone())
        .run(&config(&env, &bootstrap))
        .await
        .unwrap();

    assert_eq!(report.steps.failed, vec!["create_product"]);
    assert!(connector.api.created_names().is_empty());
    assert!(logs.contents().contains("Bootstrapping ENDED"));
}

#[tokio::test]
async fn connect_hands_back_a_tested_client() {
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let connector = MockConnector::new(MockDojo::new().with_user(2, "auditor"));

    let api = Orchestrator::new(connector.clone())
        .connect(&config(&env, &dir.path().join("unused.yml")))
        .await
        .unwrap();

    let users: Vec<_> = api
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(users, vec!["admin", "auditor"]);
    assert_eq!(
        connector.api.calls(),
        vec![ApiCall::GetUser(1), ApiCall::ListUsers]
    );
}

// =============================================================================
// Fatal paths
// =============================================================================

#[tokio::test]
async fn failed_client_test_aborts_before_provisioning() {
    let (logs, _guard) = capture_logs();
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let bootstrap = write(&dir, "bootstrap.yml", SINGLE_PRODUCT);
    let connector = MockConnector::new(MockDojo::new().failing_get_user());

    let err = Orchestrator::new(connector.clone())
        .run(&config(&env, &bootstrap))
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::ClientTestFailed(_)));
    assert_eq!(connector.api.calls(), vec![ApiCall::GetUser(1)]);
    assert!(!logs.contents().contains("Bootstrapping ENDED"));
}

#[tokio::test]
async fn missing_auth_file_is_fatal_before_connecting() {
    let dir = tempdir().unwrap();
    let bootstrap = write(&dir, "bootstrap.yml", SINGLE_PRODUCT);
    let connector = MockConnector::new(MockDojo::new());

    let err = Orchestrator::new(connector.clone())
        .run(&config(&dir.path().join("missing.env"), &bootstrap))
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::MissingConfig(ref key) if key == "host"));
    assert!(connector.seen().is_none());
}

#[tokio::test]
async fn missing_steps_mapping_is_fatal() {
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let connector = MockConnector::new(MockDojo::new());

    let err = Orchestrator::new(connector.clone())
        .run(&config(&env, &fixture("no_steps.yml")))
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::MissingConfig(ref key) if key == "steps"));
    assert!(connector.api.created_names().is_empty());
}

#[tokio::test]
async fn missing_products_key_aborts_the_run() {
    let (logs, _guard) = capture_logs();
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let bootstrap = write(
        &dir,
        "bootstrap.yml",
        "steps:\n  create_product:\n    with_items: products\n",
    );
    let connector = MockConnector::new(MockDojo::new());

    let err = Orchestrator::new(connector.clone())
        .run(&config(&env, &bootstrap))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(!connector.api.calls().contains(&ApiCall::ListProducts));
    assert!(!logs.contents().contains("Bootstrapping ENDED"));
}

#[tokio::test]
async fn unreadable_bootstrap_file_resolves_to_missing_steps() {
    let dir = tempdir().unwrap();
    let env = write(&dir, ".env", "DD_HOST=h\nDD_USER=u\n");
    let connector = MockConnector::new(MockDojo::new());

    let err = Orchestrator::new(connector.clone())
        .run(&config(&env, &dir.path().join("absent.yml")))
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::MissingConfig(ref key) if key == "steps"));
}
