//! Shared test infrastructure
//!
//! Runs the relay on an ephemeral port against a wiremock server that plays
//! both the Shopify Admin GraphQL API and the staging storage target.

#![allow(dead_code)]

use serde_json::{json, Value};
use shopify_upload_relay::config::{Config, ConfigLoader, Environment};
use shopify_upload_relay::server::Server;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "shpat_test_token";
pub const API_VERSION: &str = "2025-10";
pub const GRAPHQL_PATH: &str = "/admin/api/2025-10/graphql.json";
pub const STAGING_PATH: &str = "/staging";
pub const RESOURCE_URL: &str = "https://shopify-staged-uploads.storage.googleapis.com/tmp/123/cover.png";
pub const ALLOWED_ORIGIN: &str = "https://thereadcounts.com";

/// Relay under test plus its mocked upstream
pub struct RelayTestEnv {
    pub addr: SocketAddr,
    pub shopify: MockServer,
    pub client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl RelayTestEnv {
    pub async fn new() -> Self {
        Self::with(|_| {}).await
    }

    /// Start with a config tweak applied on top of the test defaults
    pub async fn with(tweak: impl FnOnce(&mut Config)) -> Self {
        let shopify = MockServer::start().await;
        let mut config = test_config(&shopify.uri());
        tweak(&mut config);

        let server = Server::new(config).await.expect("server should start");
        let addr = server.local_addr();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = server
                .run_until(async {
                    let _ = rx.await;
                })
                .await;
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("client should build");

        Self {
            addr,
            shopify,
            client,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn staging_url(&self) -> String {
        format!("{}{}", self.shopify.uri(), STAGING_PATH)
    }

    /// POST a single file to `/upload`
    pub async fn upload(&self, filename: &str, mime: &str, data: &[u8]) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime)
            .expect("valid mime");
        let form = reqwest::multipart::Form::new().part("file", part);

        self.client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .expect("request should complete")
    }

    /// Number of requests the mock received for `path`
    pub async fn requests_to(&self, path: &str) -> usize {
        self.shopify
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }

    // ------------------------------------------------------------------
    // Upstream stubs
    // ------------------------------------------------------------------

    pub async fn mock_staged_upload(&self, body: Value, expected: u64) {
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(header("X-Shopify-Access-Token", ACCESS_TOKEN))
            .and(body_string_contains("stagedUploadsCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected)
            .mount(&self.shopify)
            .await;
    }

    pub async fn mock_staging(&self, status: u16, body: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path(STAGING_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected)
            .mount(&self.shopify)
            .await;
    }

    pub async fn mock_file_create(&self, body: Value, expected: u64) {
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(header("X-Shopify-Access-Token", ACCESS_TOKEN))
            .and(body_string_contains("fileCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected)
            .mount(&self.shopify)
            .await;
    }

    /// Staged target pointing back at the mock's staging path
    pub fn staged_target_response(&self) -> Value {
        json!({
            "data": {
                "stagedUploadsCreate": {
                    "stagedTargets": [{
                        "url": self.staging_url(),
                        "resourceUrl": RESOURCE_URL,
                        "parameters": [
                            {"name": "Content-Type", "value": "image/png"},
                            {"name": "success_action_status", "value": "201"},
                            {"name": "acl", "value": "private"},
                            {"name": "key", "value": "tmp/123/cover.png"},
                            {"name": "x-goog-signature", "value": "sig"}
                        ]
                    }],
                    "userErrors": []
                }
            }
        })
    }
}

impl Drop for RelayTestEnv {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Config pointing the relay at `shopify_uri`
pub fn test_config(shopify_uri: &str) -> Config {
    let vars: HashMap<&str, String> = [
        ("SHOPIFY_ACCESS_TOKEN", ACCESS_TOKEN.to_string()),
        ("SHOPIFY_SHOP", "test-shop.myshopify.com".to_string()),
        ("SHOPIFY_API_VERSION", API_VERSION.to_string()),
        ("SHOPIFY_API_ENDPOINT", shopify_uri.to_string()),
    ]
    .into();

    let mut config =
        ConfigLoader::from_lookup(|key| vars.get(key).cloned()).expect("valid test config");
    config.server.address = "127.0.0.1:0".into();
    config.environment = Environment::Production;
    config
}

pub fn generic_file_response(id: &str, url: &str) -> Value {
    json!({
        "data": {
            "fileCreate": {
                "files": [{"id": id, "url": url}],
                "userErrors": []
            }
        }
    })
}

pub fn image_file_response(id: &str, url: &str) -> Value {
    json!({
        "data": {
            "fileCreate": {
                "files": [{"id": id, "image": {"url": url}}],
                "userErrors": []
            }
        }
    })
}

/// Minimal PNG signature plus padding
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.resize(len.max(8), 0);
    data
}
