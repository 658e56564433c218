//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use dialogues_service::config::ServiceConfig;
use dialogues_service::http::HttpServer;
use dialogues_service::lifecycle::Shutdown;
use dialogues_service::store;
use sqlx::AnyPool;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running service on an ephemeral port, backed by a throwaway SQLite file.
pub struct TestService {
    pub addr: SocketAddr,
    pub pool: AnyPool,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
    _dir: TempDir,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config pointing at a fresh SQLite database inside `dir`.
pub fn sqlite_config(dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.database.url = Some(format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("service.db").display()
    ));
    config.database.bootstrap_schema = true;
    config.database.max_connections = 4;
    config.database.acquire_timeout_secs = 30;
    config.tasks.write_delay_ms = 100;
    config.tasks.sweep_interval_secs = 1;
    config
}

/// Start the service with `configure` applied on top of [`sqlite_config`].
pub async fn start_service<F>(configure: F) -> TestService
where
    F: FnOnce(&mut ServiceConfig),
{
    let dir = tempfile::tempdir().unwrap();
    let mut config = sqlite_config(&dir);
    configure(&mut config);

    let pool = store::connect(&config.database).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, pool.clone());
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestService {
        addr,
        pool,
        shutdown,
        handle,
        _dir: dir,
    }
}

/// Client that never pools or proxies, so each test sees fresh connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}
