#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use taskboard_api::auth::TokenService;
use taskboard_api::config::AppConfig;
use taskboard_api::database::MemoryStore;
use taskboard_api::server;
use taskboard_api::state::AppState;

const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The application served from a background thread of the test process.
///
/// The thread dies with the process, so a finished run leaves no server behind.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = std::net::TcpListener::bind(("127.0.0.1", port))
            .with_context(|| format!("failed to bind port {}", port))?;
        listener.set_nonblocking(true)?;

        // In-memory storage keeps the suite independent of a database
        let mut config = AppConfig::development();
        config.security.jwt_secret = JWT_SECRET.to_string();
        let tokens = TokenService::from_config(&config.security)?;
        let app = server::app(AppState::new(Arc::new(MemoryStore::new()), tokens), &config);

        std::thread::Builder::new()
            .name("test-server".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build server runtime");
                runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::from_std(listener)
                        .expect("failed to register listener");
                    axum::serve(listener, app).await.expect("test server failed");
                });
            })
            .context("failed to start server thread")?;

        Ok(Self { port, base_url: format!("http://127.0.0.1:{}", port) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::start().expect("failed to start test server"));
    wait_ready(&server.base_url, Duration::from_secs(10)).await?;
    Ok(server)
}

/// The `taskboard-api serve` binary on its own port. Killed when dropped.
pub struct ServerProcess {
    pub base_url: String,
    child: Child,
}

impl ServerProcess {
    pub fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;

        let child = Command::new(env!("CARGO_BIN_EXE_taskboard-api"))
            .arg("serve")
            .env("APP_ENV", "development")
            .env("STORAGE_BACKEND", "memory")
            .env("SERVER_HOST", "127.0.0.1")
            .env("TASKBOARD_PORT", port.to_string())
            .env("JWT_SECRET", JWT_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { base_url: format!("http://127.0.0.1:{}", port), child })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        wait_ready(&self.base_url, timeout).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn wait_ready(base_url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = Instant::now() + timeout;
    loop {
        if Instant::now() > deadline {
            break;
        }
        let url = format!("{}/health", base_url);
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status() == StatusCode::OK {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    anyhow::bail!("server did not become ready on {} within {:?}", base_url, timeout)
}

/// A registered user talking to the shared test server.
pub struct TestUser {
    pub server: &'static TestServer,
    pub client: reqwest::Client,
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Email that no other test in the run will use.
pub fn unique_email(name: &str) -> String {
    format!("{}-{}@example.com", name, uuid::Uuid::new_v4().simple())
}

impl TestUser {
    pub async fn register(name: &str) -> Result<Self> {
        let server = ensure_server().await?;
        let client = reqwest::Client::new();
        let email = unique_email(name);

        let res = client
            .post(server.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": "correct horse" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = res.json().await?;
        let token = body["token"].as_str().context("no token")?.to_string();
        let id = body["user"]["id"].as_str().context("no user id")?.to_string();

        Ok(Self { server, client, id, email, token })
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.server.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str, body: Value) -> RequestBuilder {
        self.client.post(self.server.url(path)).bearer_auth(&self.token).json(&body)
    }

    pub fn put(&self, path: &str, body: Value) -> RequestBuilder {
        self.client.put(self.server.url(path)).bearer_auth(&self.token).json(&body)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.server.url(path)).bearer_auth(&self.token)
    }

    /// Create a project and return its id.
    pub async fn create_project(&self, title: &str) -> Result<String> {
        let res = self.post("/api/projects", json!({ "title": title })).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create project failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["id"].as_str().context("no project id")?.to_string())
    }

    /// Create a task in `project` and return the created task.
    pub async fn create_task(&self, project: &str, title: &str) -> Result<Value> {
        let res = self
            .post("/api/tasks", json!({ "title": title, "projectId": project }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create task failed: {}", res.status());
        Ok(res.json().await?)
    }
}
