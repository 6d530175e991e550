use crate::app::error::ServiceError;
use crate::app::signing::TransactionSigner;
use crate::crypto::hashing::record_hash;
use crate::domain::address::Address;
use crate::domain::payload::{Metadata, MetadataValue, PdfDocument, StoredPayload};
use crate::domain::registry::Credential;
use crate::infra::ipfs::ContentStore;
use crate::infra::ledger::{Command, Ledger, Receipt};
use chrono::Utc;
use primitive_types::H256;
use secrecy::SecretString;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Metadata key stamped on payloads that do not carry their own issue date.
pub const ISSUED_AT_KEY: &str = "issuedAt";

/// Credential content as submitted by a client.
#[derive(Clone, Debug)]
pub struct RecordContent {
    pub data: String,
    pub metadata: Metadata,
    pub pdf_document: Option<PdfDocument>,
}

impl RecordContent {
    fn into_payload(mut self) -> Result<StoredPayload, ServiceError> {
        self.metadata
            .entry(ISSUED_AT_KEY.to_string())
            .or_insert_with(|| MetadataValue::Text(Utc::now().to_rfc3339()));
        let payload = StoredPayload {
            data: self.data,
            metadata: self.metadata,
            pdf_document: self.pdf_document,
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// Outcome of an issuance or update: both hashes plus where the payload landed.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordWrite {
    #[schema(value_type = String)]
    pub subject_address: Address,
    pub index: u64,
    #[schema(value_type = String)]
    pub record_hash: H256,
    pub content_hash: String,
    pub storage_backend: String,
    #[schema(value_type = String)]
    pub tx_hash: H256,
    pub block_number: u64,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub credential: Credential,
    /// The stored payload, when the store can still serve it.
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

/// Result of comparing the on-chain commitment with the stored payload.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    #[schema(value_type = String)]
    pub subject_address: Address,
    pub index: u64,
    pub content_hash: String,
    #[schema(value_type = String)]
    pub on_chain_record_hash: H256,
    #[schema(value_type = Option<String>)]
    pub stored_record_hash: Option<H256>,
    pub payload_available: bool,
    /// Stored `data` hashes to the on-chain commitment.
    pub intact: bool,
    pub valid: bool,
}

pub struct RecordsService {
    ledger: Arc<dyn Ledger>,
    store: Arc<ContentStore>,
    signer: Arc<TransactionSigner>,
}

impl RecordsService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        store: Arc<ContentStore>,
        signer: Arc<TransactionSigner>,
    ) -> Self {
        Self {
            ledger,
            store,
            signer,
        }
    }

    async fn submit(
        &self,
        command: Command,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let tx = self.signer.sign(command, private_key)?;
        Ok(self.ledger.submit(tx).await?)
    }

    /// Stores the payload, then commits `hash(data)` and the content address.
    /// A ledger failure after a successful store leaves an orphaned payload.
    pub async fn issue(
        &self,
        subject: Address,
        content: RecordContent,
        private_key: Option<&SecretString>,
    ) -> Result<RecordWrite, ServiceError> {
        let payload = content.into_payload()?;
        let key = self.signer.resolve(private_key)?;
        let stored = self.store.put(&payload).await?;
        let record_hash = payload.record_hash();

        let tx = key.sign(Command::IssueCredential {
            subject,
            record_hash,
            content_hash: stored.hash.clone(),
        })?;
        let receipt = self
            .ledger
            .submit(tx)
            .await
            .map_err(ServiceError::from)
            .inspect_err(|e| {
                warn!(%subject, content_hash = %stored.hash, error = %e, "Issuance failed after payload was stored")
            })?;
        let index = receipt.issued_index().ok_or_else(|| {
            ServiceError::Internal("issuance receipt carries no credential index".to_string())
        })?;

        info!(%subject, index, content_hash = %stored.hash, backend = stored.backend, "Credential issued");
        Ok(RecordWrite {
            subject_address: subject,
            index,
            record_hash,
            content_hash: stored.hash,
            storage_backend: stored.backend.to_string(),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// Re-stores the payload and replaces both hashes of an existing credential.
    pub async fn update(
        &self,
        subject: Address,
        index: u64,
        content: RecordContent,
        private_key: Option<&SecretString>,
    ) -> Result<RecordWrite, ServiceError> {
        // Fail on an unknown index before writing anything to the store.
        self.ledger.credential(subject, index).await?;

        let payload = content.into_payload()?;
        let key = self.signer.resolve(private_key)?;
        let stored = self.store.put(&payload).await?;
        let record_hash = payload.record_hash();

        let tx = key.sign(Command::UpdateCredential {
            subject,
            index,
            record_hash,
            content_hash: stored.hash.clone(),
        })?;
        let receipt = self.ledger.submit(tx).await?;

        info!(%subject, index, content_hash = %stored.hash, "Credential updated");
        Ok(RecordWrite {
            subject_address: subject,
            index,
            record_hash,
            content_hash: stored.hash,
            storage_backend: stored.backend.to_string(),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }

    pub async fn revoke(
        &self,
        subject: Address,
        index: u64,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::RevokeCredential { subject, index }, private_key)
            .await?;
        info!(%subject, index, "Credential revoked");
        Ok(receipt)
    }

    pub async fn add_admin(
        &self,
        admin: Address,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::AddRegistryAdmin { admin }, private_key)
            .await?;
        info!(%admin, "Registry admin added");
        Ok(receipt)
    }

    /// The credential plus its payload when retrievable; a store miss is not an error.
    pub async fn get(&self, subject: Address, index: u64) -> Result<RecordView, ServiceError> {
        let credential = self.ledger.credential(subject, index).await?;
        let payload = match self.store.get_json(&credential.content_hash).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(%subject, index, error = %e, "Credential payload not retrievable");
                None
            }
        };
        Ok(RecordView {
            credential,
            payload,
        })
    }

    pub async fn count(&self, subject: Address) -> Result<u64, ServiceError> {
        Ok(self.ledger.credential_count(subject).await?)
    }

    pub async fn verify(
        &self,
        subject: Address,
        index: u64,
        candidate: H256,
    ) -> Result<bool, ServiceError> {
        Ok(self.ledger.verify_credential(subject, index, candidate).await?)
    }

    /// Hashes `data` the same way issuance does and verifies the result.
    pub async fn verify_data(
        &self,
        subject: Address,
        index: u64,
        data: &str,
    ) -> Result<bool, ServiceError> {
        self.verify(subject, index, record_hash(data)).await
    }

    pub async fn integrity(
        &self,
        subject: Address,
        index: u64,
    ) -> Result<IntegrityReport, ServiceError> {
        let credential = self.ledger.credential(subject, index).await?;
        let stored_record_hash = match self.store.get_json(&credential.content_hash).await {
            Ok(value) => match serde_json::from_value::<StoredPayload>(value) {
                Ok(payload) => Some(payload.record_hash()),
                Err(e) => {
                    warn!(%subject, index, error = %e, "Stored content is not a credential payload");
                    None
                }
            },
            Err(e) => {
                warn!(%subject, index, error = %e, "Credential payload not retrievable");
                None
            }
        };

        let intact = stored_record_hash == Some(credential.record_hash);
        if stored_record_hash.is_some() && !intact {
            warn!(%subject, index, "Stored payload does not match on-chain record hash");
        }
        Ok(IntegrityReport {
            subject_address: subject,
            index,
            content_hash: credential.content_hash,
            on_chain_record_hash: credential.record_hash,
            payload_available: stored_record_hash.is_some(),
            stored_record_hash,
            intact,
            valid: credential.valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::AdminKey;
    use crate::infra::ipfs::{ContentBackend, GatewayFetcher, StoreError};
    use crate::infra::ledger::LocalLedger;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl ContentBackend for Offline {
        fn name(&self) -> &'static str {
            "offline"
        }
        async fn is_available(&self) -> bool {
            false
        }
        async fn add(&self, _bytes: &[u8]) -> Result<String, StoreError> {
            Err(StoreError::backend("offline", "unreachable"))
        }
        async fn cat(&self, _hash: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }
    }

    fn service() -> (RecordsService, Arc<ContentStore>) {
        let key = AdminKey::from_seed([4u8; 32]);
        let ledger = Arc::new(LocalLedger::in_memory(&[key.address()]));
        let store = Arc::new(ContentStore::new(
            vec![Arc::new(Offline)],
            GatewayFetcher::new(Vec::new(), Duration::from_millis(50)),
        ));
        let signer = Arc::new(TransactionSigner::new(Some(key)));
        (RecordsService::new(ledger, store.clone(), signer), store)
    }

    fn degree(data: &str) -> RecordContent {
        RecordContent {
            data: data.to_string(),
            metadata: Metadata::from([("type".to_string(), MetadataValue::from("degree"))]),
            pdf_document: None,
        }
    }

    fn bbb() -> Address {
        "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".parse().unwrap()
    }

    #[tokio::test]
    async fn issue_verify_revoke() {
        let (service, _) = service();
        let written = service.issue(bbb(), degree("Degree: CS"), None).await.unwrap();
        assert_eq!(written.index, 0);
        assert_eq!(written.record_hash, record_hash("Degree: CS"));
        assert_eq!(written.storage_backend, "local-fingerprint");

        assert!(service.verify_data(bbb(), 0, "Degree: CS").await.unwrap());
        assert!(!service.verify_data(bbb(), 0, "Degree: Art").await.unwrap());

        service.revoke(bbb(), 0, None).await.unwrap();
        assert!(!service.verify_data(bbb(), 0, "Degree: CS").await.unwrap());
        assert_eq!(service.count(bbb()).await.unwrap(), 1);

        let second = service.issue(bbb(), degree("Master: CS"), None).await.unwrap();
        assert_eq!(second.index, 1);
    }

    #[tokio::test]
    async fn get_returns_payload_with_issue_date() {
        let (service, _) = service();
        service.issue(bbb(), degree("Degree: CS"), None).await.unwrap();
        let view = service.get(bbb(), 0).await.unwrap();
        let payload = view.payload.unwrap();
        assert_eq!(payload["data"], "Degree: CS");
        assert_eq!(payload["metadata"]["type"], "degree");
        assert!(payload["metadata"][ISSUED_AT_KEY].is_string());
        assert!(view.credential.valid);
    }

    #[tokio::test]
    async fn integrity_detects_mismatched_payload() {
        let (service, store) = service();
        service.issue(bbb(), degree("Degree: CS"), None).await.unwrap();
        let report = service.integrity(bbb(), 0).await.unwrap();
        assert!(report.intact);
        assert!(report.payload_available);

        // Point the credential at a payload whose data differs from the commitment.
        let forged = store
            .put(&StoredPayload {
                data: "Degree: Medicine".to_string(),
                metadata: Metadata::new(),
                pdf_document: None,
            })
            .await
            .unwrap();
        let receipt = service
            .submit(
                Command::UpdateCredential {
                    subject: bbb(),
                    index: 0,
                    record_hash: record_hash("Degree: CS"),
                    content_hash: forged.hash,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(receipt.block_number, 2);

        let report = service.integrity(bbb(), 0).await.unwrap();
        assert!(report.payload_available);
        assert!(!report.intact);
    }

    #[tokio::test]
    async fn update_of_unknown_index_stores_nothing() {
        let (service, store) = service();
        assert!(matches!(
            service.update(bbb(), 3, degree("x"), None).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(store.health().await.cached_entries, 0);
    }

    #[tokio::test]
    async fn malformed_key_is_rejected_before_the_payload_is_stored() {
        let (service, store) = service();
        let bad_key = SecretString::from("not-a-hex-seed".to_string());
        assert!(matches!(
            service.issue(bbb(), degree("Degree: CS"), Some(&bad_key)).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(store.health().await.cached_entries, 0);
        assert_eq!(service.count(bbb()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_data_is_rejected_before_storing() {
        let (service, store) = service();
        assert!(matches!(
            service.issue(bbb(), degree("  "), None).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(store.health().await.cached_entries, 0);
        assert_eq!(service.count(bbb()).await.unwrap(), 0);
    }
}
