//! Content store over HTTP, with wiremock standing in for the IPFS node and the
//! public gateways.

mod common;

use academic_records::content_address;
use academic_records::infra::config::PinataConfig;
use academic_records::infra::ipfs::{ContentBackend, GatewayFetcher, IpfsNodeBackend, PinataBackend};
use academic_records::{ContentStore, LocalLedger};
use common::{admin_key, offline_store, spawn_app, spawn_app_with};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pdf_form(bytes: Vec<u8>, mime: &str) -> Form {
    let part = Part::bytes(bytes)
        .file_name("diploma.pdf")
        .mime_str(mime)
        .expect("valid mime");
    Form::new().part("file", part)
}

#[tokio::test]
async fn upload_with_store_down_falls_back_and_reads_back() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;
    let payload = json!({ "data": "Degree: CS", "metadata": { "type": "degree" } });

    let resp = app
        .client
        .post(app.url("/ipfs/upload"))
        .json(&payload)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["backend"], "local-fingerprint");
    let hash = body["data"]["hash"].as_str().unwrap_or_default().to_string();
    assert!(hash.starts_with("Qm") && hash.len() == 46);

    let retrieved: Value = app
        .client
        .get(app.url(&format!("/ipfs/retrieve/{}", hash)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(retrieved["data"]["encoding"], "json");
    assert_eq!(retrieved["data"]["content"], payload);

    let diagnostics: Value = app
        .client
        .get(app.url("/diagnostics/ipfs"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(diagnostics["data"]["degraded"], true);
    assert_eq!(diagnostics["data"]["cachedEntries"], 1);
    Ok(())
}

#[tokio::test]
async fn retrieval_distinguishes_bad_format_from_missing() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;

    let resp = app.client.get(app.url("/ipfs/retrieve/not-a-cid")).send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let missing = content_address(b"never uploaded");
    let resp = app
        .client
        .get(app.url(&format!("/ipfs/file/{}", missing)))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn uploads_go_to_the_node_when_it_is_up() -> Result<(), Box<dyn std::error::Error>> {
    let node = MockServer::start().await;
    let node_hash = content_address(b"whatever the node computed");
    Mock::given(method("POST"))
        .and(path("/api/v0/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Version": "0.29.0" })))
        .mount(&node)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(query_param("pin", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "payload",
            "Hash": node_hash,
            "Size": "42"
        })))
        .expect(1)
        .mount(&node)
        .await;

    let backend: Arc<dyn ContentBackend> =
        Arc::new(IpfsNodeBackend::new(node.uri(), Duration::from_secs(2))?);
    let store = ContentStore::new(vec![backend], GatewayFetcher::new(Vec::new(), Duration::from_secs(1)));
    let ledger = Arc::new(LocalLedger::in_memory(&[admin_key().address()]));
    let app = spawn_app_with(ledger, store, 1024 * 1024).await;

    let body: Value = app
        .client
        .post(app.url("/ipfs/upload"))
        .json(&json!({ "hello": "ipfs" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["backend"], "ipfs-node");
    assert_eq!(body["data"]["hash"], node_hash);

    // Served from the write-through cache; the node has no `cat` mock.
    let retrieved: Value = app
        .client
        .get(app.url(&format!("/ipfs/retrieve/{}", node_hash)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(retrieved["data"]["content"], json!({ "hello": "ipfs" }));
    Ok(())
}

#[tokio::test]
async fn gateways_are_tried_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let slow = MockServer::start().await;
    let good = MockServer::start().await;
    let content = br#"{"data":"from gateway"}"#.to_vec();
    let hash = content_address(&content);

    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{}", hash)))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&slow)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{}", hash)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&good)
        .await;

    let store = offline_store(vec![slow.uri(), good.uri()]);
    let ledger = Arc::new(LocalLedger::in_memory(&[admin_key().address()]));
    let app = spawn_app_with(ledger, store, 1024 * 1024).await;

    let resp = app
        .client
        .get(app.url(&format!("/ipfs/file/{}", hash)))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(resp.bytes().await?.to_vec(), content);

    // Second read hits the cache, so the good gateway is asked exactly once.
    let retrieved: Value = app
        .client
        .get(app.url(&format!("/ipfs/retrieve/{}", hash)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(retrieved["data"]["content"]["data"], "from gateway");
    Ok(())
}

#[tokio::test]
async fn pdf_upload_accepts_only_pdfs_within_limit() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Arc::new(LocalLedger::in_memory(&[admin_key().address()]));
    let app = spawn_app_with(ledger, offline_store(Vec::new()), 1024).await;
    let pdf = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF".to_vec();

    let resp = app
        .client
        .post(app.url("/ipfs/upload-file"))
        .multipart(pdf_form(pdf.clone(), "application/pdf"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let document = &body["data"]["document"];
    assert_eq!(document["filename"], "diploma.pdf");
    assert_eq!(document["mimeType"], "application/pdf");
    assert_eq!(document["filesize"], pdf.len() as u64);
    let hash = document["contentHash"].as_str().unwrap_or_default().to_string();

    let resp = app
        .client
        .get(app.url(&format!("/ipfs/file/{}", hash)))
        .send()
        .await?;
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    assert_eq!(resp.bytes().await?.to_vec(), pdf);

    let resp = app
        .client
        .post(app.url("/ipfs/upload-file"))
        .multipart(pdf_form(b"plain text".to_vec(), "text/plain"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.url("/ipfs/upload-file"))
        .multipart(pdf_form(vec![b'%'; 2048], "application/pdf"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

fn node_backend(uri: String) -> Result<Arc<dyn ContentBackend>, Box<dyn std::error::Error>> {
    Ok(Arc::new(IpfsNodeBackend::new(uri, Duration::from_secs(2))?))
}

fn pinata_backend(server: &MockServer) -> Result<Arc<dyn ContentBackend>, Box<dyn std::error::Error>> {
    let config = PinataConfig {
        api_url: server.uri(),
        gateway_url: server.uri(),
        jwt: SecretString::from("test-jwt".to_string()),
    };
    Ok(Arc::new(PinataBackend::new(&config, Duration::from_secs(2))?))
}

#[tokio::test]
async fn cache_miss_is_served_by_the_node() -> Result<(), Box<dyn std::error::Error>> {
    let node = MockServer::start().await;
    let content = br#"{"data":"Degree: Physics"}"#.to_vec();
    let hash = content_address(&content);
    Mock::given(method("POST"))
        .and(path("/api/v0/cat"))
        .and(query_param("arg", hash.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&node)
        .await;

    let store = ContentStore::new(
        vec![node_backend(node.uri())?],
        GatewayFetcher::new(Vec::new(), Duration::from_secs(1)),
    );
    assert_eq!(store.health().await.cached_entries, 0);

    assert_eq!(store.get(&hash).await?.as_slice(), content.as_slice());
    // The node answer is cached; a second read does not reach it.
    assert_eq!(store.get_json(&hash).await?["data"], "Degree: Physics");
    Ok(())
}

#[tokio::test]
async fn writes_go_to_pinata_when_the_node_is_down() -> Result<(), Box<dyn std::error::Error>> {
    let pinata = MockServer::start().await;
    let pinned = content_address(b"pinned by pinata");
    Mock::given(method("GET"))
        .and(path("/data/testAuthentication"))
        .and(header("authorization", "Bearer test-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&pinata)
        .await;
    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .and(header("authorization", "Bearer test-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "IpfsHash": pinned,
            "PinSize": 16,
            "Timestamp": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&pinata)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{}", pinned)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pinned by pinata".to_vec()))
        .expect(1)
        .mount(&pinata)
        .await;

    let store = ContentStore::new(
        vec![node_backend("http://127.0.0.1:9".to_string())?, pinata_backend(&pinata)?],
        GatewayFetcher::new(Vec::new(), Duration::from_secs(1)),
    );

    let stored = store.put_bytes(b"pinned by pinata".to_vec()).await;
    assert_eq!(stored.backend, "pinata");
    assert_eq!(stored.hash, pinned);

    let health = store.health().await;
    assert!(!health.degraded);
    let names: Vec<(&str, bool)> = health.backends.iter().map(|b| (b.name, b.available)).collect();
    assert_eq!(
        names,
        vec![("ipfs-node", false), ("pinata", true), ("local-fingerprint", true)]
    );

    // Reads through the provider's own gateway.
    let backend = pinata_backend(&pinata)?;
    assert_eq!(backend.cat(&pinned).await?, Some(b"pinned by pinata".to_vec()));
    Ok(())
}

#[tokio::test]
async fn pinata_with_a_rejected_token_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let pinata = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/testAuthentication"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&pinata)
        .await;
    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pinata)
        .await;

    let store = ContentStore::new(
        vec![pinata_backend(&pinata)?],
        GatewayFetcher::new(Vec::new(), Duration::from_secs(1)),
    );
    let stored = store.put_bytes(b"local only".to_vec()).await;
    assert_eq!(stored.backend, "local-fingerprint");
    assert_eq!(stored.hash, content_address(b"local only"));
    Ok(())
}

#[tokio::test]
async fn node_errors_fall_through_to_gateways() -> Result<(), Box<dyn std::error::Error>> {
    let node = MockServer::start().await;
    let gateway = MockServer::start().await;
    let content = br#"{"data":"from gateway"}"#.to_vec();
    let hash = content_address(&content);
    Mock::given(method("POST"))
        .and(path("/api/v0/cat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("block was not found locally"))
        .expect(1)
        .mount(&node)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{}", hash)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&gateway)
        .await;

    let store = ContentStore::new(
        vec![node_backend(node.uri())?],
        GatewayFetcher::new(vec![gateway.uri()], Duration::from_secs(2)),
    );
    assert_eq!(store.get(&hash).await?.as_slice(), content.as_slice());
    assert_eq!(store.health().await.cached_entries, 1);
    Ok(())
}
