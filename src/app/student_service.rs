use crate::app::error::ServiceError;
use crate::app::signing::TransactionSigner;
use crate::domain::address::Address;
use crate::domain::directory::{check_range, Subject, SubjectPage, SubjectProfile};
use crate::infra::ledger::{Command, Ledger, Receipt};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

/// Student directory operations on top of the ledger.
pub struct StudentService {
    ledger: Arc<dyn Ledger>,
    signer: Arc<TransactionSigner>,
}

impl StudentService {
    pub fn new(ledger: Arc<dyn Ledger>, signer: Arc<TransactionSigner>) -> Self {
        Self { ledger, signer }
    }

    async fn submit(
        &self,
        command: Command,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let tx = self.signer.sign(command, private_key)?;
        Ok(self.ledger.submit(tx).await?)
    }

    pub async fn register(
        &self,
        address: Address,
        profile: SubjectProfile,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::RegisterSubject { address, profile }, private_key)
            .await?;
        info!(%address, block_number = receipt.block_number, "Student registered");
        Ok(receipt)
    }

    pub async fn update(
        &self,
        address: Address,
        profile: SubjectProfile,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::UpdateSubject { address, profile }, private_key)
            .await?;
        info!(%address, "Student updated");
        Ok(receipt)
    }

    pub async fn deactivate(
        &self,
        address: Address,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::DeactivateSubject { address }, private_key)
            .await?;
        info!(%address, "Student deactivated");
        Ok(receipt)
    }

    pub async fn reactivate(
        &self,
        address: Address,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::ReactivateSubject { address }, private_key)
            .await?;
        info!(%address, "Student reactivated");
        Ok(receipt)
    }

    pub async fn add_admin(
        &self,
        admin: Address,
        private_key: Option<&SecretString>,
    ) -> Result<Receipt, ServiceError> {
        let receipt = self
            .submit(Command::AddDirectoryAdmin { admin }, private_key)
            .await?;
        info!(%admin, "Directory admin added");
        Ok(receipt)
    }

    pub async fn get(&self, address: Address) -> Result<Subject, ServiceError> {
        Ok(self.ledger.subject(address).await?)
    }

    pub async fn is_registered(&self, address: Address) -> Result<bool, ServiceError> {
        Ok(self.ledger.is_registered(address).await?)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.ledger.subject_count().await?)
    }

    /// Addresses only, in registration order.
    pub async fn list_range(&self, start: i64, count: i64) -> Result<Vec<Address>, ServiceError> {
        check_range(start, count)?;
        Ok(self.ledger.subject_range(start, count).await?)
    }

    /// Bounds are checked here as well as by the directory itself.
    pub async fn list_all_paginated(
        &self,
        start: i64,
        count: i64,
    ) -> Result<SubjectPage, ServiceError> {
        check_range(start, count)?;
        Ok(self.ledger.subject_page(start, count).await?)
    }
}
