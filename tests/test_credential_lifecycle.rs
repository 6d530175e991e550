//! Credential registry over HTTP: issuance choreography, verification,
//! revocation, updates and the integrity check.

mod common;

use academic_records::record_hash;
use common::{spawn_app, stranger_key_hex, BBB};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn h256_hex(data: &str) -> String {
    format!("0x{}", hex::encode(record_hash(data).as_bytes()))
}

#[tokio::test]
async fn issue_verify_revoke() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({
            "studentAddress": BBB,
            "data": "Degree: CS",
            "metadata": { "type": "degree", "year": 2024 }
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let issued: Value = resp.json().await?;
    assert_eq!(issued["data"]["index"], 0);
    assert_eq!(issued["data"]["recordHash"], h256_hex("Degree: CS"));
    assert_eq!(issued["data"]["storageBackend"], "local-fingerprint");
    let content_hash = issued["data"]["contentHash"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(content_hash.starts_with("Qm"));
    assert_eq!(content_hash.len(), 46);

    let verify = |body: Value| {
        let client = app.client.clone();
        let url = app.url("/records/verify");
        async move {
            client
                .post(url)
                .json(&body)
                .send()
                .await?
                .json::<Value>()
                .await
        }
    };

    let by_data = verify(json!({ "studentAddress": BBB, "index": 0, "data": "Degree: CS" })).await?;
    assert_eq!(by_data["data"]["valid"], true);
    let by_hash = verify(json!({
        "studentAddress": BBB,
        "index": 0,
        "recordHash": h256_hex("Degree: CS")
    }))
    .await?;
    assert_eq!(by_hash["data"]["valid"], true);
    let wrong = verify(json!({ "studentAddress": BBB, "index": 0, "data": "Degree: Art" })).await?;
    assert_eq!(wrong["data"]["valid"], false);
    let unknown = verify(json!({ "studentAddress": BBB, "index": 9, "data": "Degree: CS" })).await?;
    assert_eq!(unknown["data"]["valid"], false);

    let resp = app
        .client
        .put(app.url("/records/revoke"))
        .json(&json!({ "studentAddress": BBB, "index": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let after = verify(json!({ "studentAddress": BBB, "index": 0, "data": "Degree: CS" })).await?;
    assert_eq!(after["data"]["valid"], false);

    let resp = app
        .client
        .put(app.url("/records/revoke"))
        .json(&json!({ "studentAddress": BBB, "index": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Revocation never removes the entry.
    let count: Value = app
        .client
        .get(app.url(&format!("/records/{}/count", BBB)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(count["data"]["count"], 1);

    let record: Value = app
        .client
        .get(app.url(&format!("/records/{}/0", BBB)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(record["data"]["credential"]["valid"], false);
    assert_eq!(record["data"]["credential"]["contentHash"], content_hash);
    assert_eq!(record["data"]["payload"]["data"], "Degree: CS");
    assert_eq!(record["data"]["payload"]["metadata"]["year"], 2024);
    Ok(())
}

#[tokio::test]
async fn indices_are_dense_per_subject() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;
    for (i, data) in ["Bachelor", "Master", "PhD"].iter().enumerate() {
        let issued: Value = app
            .client
            .post(app.url("/records/issue"))
            .json(&json!({ "studentAddress": BBB, "data": data }))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(issued["data"]["index"], i as u64);
    }

    let other = "0x00000000000000000000000000000000000000cc";
    let issued: Value = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": other, "data": "Bachelor" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(issued["data"]["index"], 0);

    let count: Value = app
        .client
        .get(app.url(&format!("/records/{}/count", BBB)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(count["data"]["count"], 3);

    let resp = app
        .client
        .get(app.url(&format!("/records/{}/3", BBB)))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_replaces_hashes_and_keeps_timestamp() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;
    app.client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": BBB, "data": "Degree: CS" }))
        .send()
        .await?
        .error_for_status()?;
    let before: Value = app
        .client
        .get(app.url(&format!("/records/{}/0", BBB)))
        .send()
        .await?
        .json()
        .await?;

    let resp = app
        .client
        .put(app.url("/records/update"))
        .json(&json!({ "studentAddress": BBB, "index": 0, "data": "Degree: CS (Honours)" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let after: Value = app
        .client
        .get(app.url(&format!("/records/{}/0", BBB)))
        .send()
        .await?
        .json()
        .await?;
    let (before, after) = (&before["data"]["credential"], &after["data"]["credential"]);
    assert_eq!(after["recordHash"], h256_hex("Degree: CS (Honours)"));
    assert_ne!(after["contentHash"], before["contentHash"]);
    assert_eq!(after["timestamp"], before["timestamp"]);
    assert_eq!(after["issuer"], before["issuer"]);
    assert_eq!(after["valid"], true);

    let report: Value = app
        .client
        .get(app.url(&format!("/records/{}/0/integrity", BBB)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(report["data"]["intact"], true);
    assert_eq!(report["data"]["payloadAvailable"], true);

    let resp = app
        .client
        .put(app.url("/records/update"))
        .json(&json!({ "studentAddress": BBB, "index": 5, "data": "x" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn rejects_bad_requests_before_touching_the_ledger() -> Result<(), Box<dyn std::error::Error>> {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": BBB }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Missing required field: data");

    let resp = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": BBB, "data": "x", "metadata": { "nested": { "a": 1 } } }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.url("/records/verify"))
        .json(&json!({ "studentAddress": BBB, "index": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A malformed key is refused before the payload reaches the store.
    let resp = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": BBB, "data": "x", "privateKey": "zz" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let store: Value = app
        .client
        .get(app.url("/diagnostics/ipfs"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(store["data"]["cachedEntries"], 0);

    let resp = app
        .client
        .post(app.url("/records/issue"))
        .json(&json!({ "studentAddress": BBB, "data": "x", "privateKey": stranger_key_hex() }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let count: Value = app
        .client
        .get(app.url(&format!("/records/{}/count", BBB)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(count["data"]["count"], 0);
    Ok(())
}
