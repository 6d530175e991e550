//! Shared harness: runs the router on an ephemeral port with an in-process ledger.

#![allow(dead_code)]

use academic_records::infra::ipfs::{ContentBackend, GatewayFetcher, IpfsNodeBackend};
use academic_records::infra::ledger::Ledger;
use academic_records::{
    transport, AdminKey, ContentStore, LocalLedger, RecordsService, StudentService,
    TransactionSigner,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ADMIN_SEED: [u8; 32] = [42u8; 32];
pub const ADA: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const BBB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<ContentStore>,
    server: JoinHandle<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn admin_key() -> AdminKey {
    AdminKey::from_seed(ADMIN_SEED)
}

/// Hex seed of a key that holds no admin role.
pub fn stranger_key_hex() -> String {
    AdminKey::from_seed([7u8; 32])
        .seed_hex()
        .expose_secret()
        .to_string()
}

/// Store whose only backend is a closed local port, with the given gateways.
pub fn offline_store(gateways: Vec<String>) -> ContentStore {
    let node: Arc<dyn ContentBackend> = Arc::new(
        IpfsNodeBackend::new("http://127.0.0.1:9", Duration::from_millis(500))
            .expect("client builds"),
    );
    ContentStore::new(vec![node], GatewayFetcher::new(gateways, Duration::from_secs(2)))
}

pub async fn spawn_app() -> TestApp {
    let ledger = Arc::new(LocalLedger::in_memory(&[admin_key().address()]));
    spawn_app_with(ledger, offline_store(Vec::new()), 10 * 1024 * 1024).await
}

pub async fn spawn_app_with(
    ledger: Arc<dyn Ledger>,
    store: ContentStore,
    max_upload_bytes: usize,
) -> TestApp {
    let store = Arc::new(store);
    let signer = Arc::new(TransactionSigner::new(Some(admin_key())));
    let state = transport::http::AppState {
        students: Arc::new(StudentService::new(ledger.clone(), signer.clone())),
        records: Arc::new(RecordsService::new(ledger.clone(), store.clone(), signer)),
        store: store.clone(),
        ledger,
        max_upload_bytes,
    };
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("client builds"),
        store,
        server,
    }
}
