//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use coffeehouse_cms::config::CmsConfig;
use coffeehouse_cms::{HttpServer, Shutdown};

/// A seeded content document covering every editable section.
pub fn seed_document() -> Value {
    json!({
        "hero": {
            "title": "Morning Grind",
            "subtitle": "Small-batch coffee",
            "button_text": "See the menu",
            "image": "hero.jpg"
        },
        "about": { "who": "Two baristas", "why": "Good coffee" },
        "menu": [
            { "name": "Espresso", "description": "Short and strong", "price": "$2.50" }
        ],
        "team": [ { "name": "Ana", "bio": "Roaster" } ],
        "contact": {
            "address": "1 Bean St",
            "email": "hello@grind.cafe",
            "phone": "555-0100",
            "map_lat": 40.7,
            "map_lng": -74.0,
            "google_maps_api_key": "seed-key"
        },
        "footer": {
            "address": "1 Bean St",
            "city": "Springfield",
            "phone": "555-0100",
            "email": "hello@grind.cafe"
        },
        "logo": "logo.png",
        "favicon": "favicon.ico",
        "opening_hours": { "mon": "7-19" }
    })
}

/// A running server backed by a temporary content directory.
pub struct TestCms {
    pub dir: tempfile::TempDir,
    pub addr: SocketAddr,
    pub config: CmsConfig,
    pub client: reqwest::Client,
    pub config_tx: mpsc::UnboundedSender<CmsConfig>,
    shutdown: Shutdown,
}

impl TestCms {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(tweak: impl FnOnce(&mut CmsConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let content_path = dir.path().join("content.json");
        write_json(&content_path, &seed_document());
        let upload_dir = dir.path().join("img");
        std::fs::create_dir_all(&upload_dir).unwrap();
        for default in ["hero.jpg", "logo.png", "favicon.ico"] {
            std::fs::write(upload_dir.join(default), b"shipped").unwrap();
        }

        let mut config = CmsConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.storage.content_path = content_path.to_string_lossy().into_owned();
        config.storage.upload_dir = upload_dir.to_string_lossy().into_owned();
        config.admin.dev_mode = true;
        tweak(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let (config_tx, config_updates) = mpsc::unbounded_channel();
        let server = HttpServer::new(config.clone());
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, config_updates, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            dir,
            addr,
            config,
            client,
            config_tx,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn content_path(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.content_path)
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.upload_dir)
    }

    /// The document as it currently sits on disk.
    pub fn stored_document(&self) -> Value {
        let raw = std::fs::read_to_string(self.content_path()).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": "admin", "password": "password" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "dev login should succeed");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestCms {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// The editable sections of the seed, ready to post to `/api/update`.
pub fn update_payload() -> Value {
    let mut doc = seed_document();
    let obj = doc.as_object_mut().unwrap();
    obj.remove("logo");
    obj.remove("favicon");
    obj.remove("opening_hours");
    doc
}
