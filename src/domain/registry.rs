//! Credential registry: the academic records contract.
//!
//! Each subject owns an append-only ledger of credentials indexed `0..count`.
//! Revocation flips `valid` and never removes an entry. The registry does not
//! consult the subject directory; any non-zero address can receive credentials.

use crate::domain::access::AdminRoles;
use crate::domain::address::Address;
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("caller {0} is not a registry admin")]
    Unauthorized(Address),
    #[error("invalid subject address {0}")]
    InvalidAddress(Address),
    #[error("credential {index} not found for {subject}")]
    NotFound { subject: Address, index: u64 },
    #[error("credential {index} for {subject} is already revoked")]
    AlreadyRevoked { subject: Address, index: u64 },
    #[error("content hash must not be empty")]
    EmptyContentHash,
    #[error("{0} is already a registry admin")]
    AlreadyAdmin(Address),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[schema(value_type = String)]
    pub subject_address: Address,
    pub index: u64,
    /// SHA-256 of the payload's `data` field, `0x` hex.
    #[schema(value_type = String)]
    pub record_hash: H256,
    /// Content address of the full payload.
    pub content_hash: String,
    #[schema(value_type = String)]
    pub issuer: Address,
    /// Unix seconds of issuance. Not refreshed by `update`.
    pub timestamp: i64,
    pub valid: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum RegistryEvent {
    #[serde(rename_all = "camelCase")]
    CredentialIssued {
        subject_address: Address,
        index: u64,
        record_hash: H256,
        content_hash: String,
        issuer: Address,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    CredentialUpdated {
        subject_address: Address,
        index: u64,
        record_hash: H256,
        content_hash: String,
        updated_by: Address,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    CredentialRevoked {
        subject_address: Address,
        index: u64,
        revoked_by: Address,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    RegistryAdminAdded { admin: Address, added_by: Address },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRegistry {
    admins: AdminRoles,
    records: BTreeMap<Address, Vec<Credential>>,
}

impl CredentialRegistry {
    pub fn new(admins: AdminRoles) -> Self {
        Self {
            admins,
            records: BTreeMap::new(),
        }
    }

    fn only_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if self.admins.is_admin(caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(*caller))
        }
    }

    fn entry_mut(&mut self, subject: Address, index: u64) -> Result<&mut Credential, RegistryError> {
        self.records
            .get_mut(&subject)
            .and_then(|list| list.get_mut(index as usize))
            .ok_or(RegistryError::NotFound { subject, index })
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.is_admin(address)
    }

    pub fn admins(&self) -> &AdminRoles {
        &self.admins
    }

    pub fn add_admin(&mut self, caller: Address, admin: Address) -> Result<RegistryEvent, RegistryError> {
        self.only_admin(&caller)?;
        if admin.is_zero() {
            return Err(RegistryError::InvalidAddress(admin));
        }
        if !self.admins.grant(admin) {
            return Err(RegistryError::AlreadyAdmin(admin));
        }
        Ok(RegistryEvent::RegistryAdminAdded {
            admin,
            added_by: caller,
        })
    }

    /// Appends a credential and returns the issuance event carrying its index.
    pub fn issue(
        &mut self,
        caller: Address,
        subject: Address,
        record_hash: H256,
        content_hash: String,
        now: i64,
    ) -> Result<RegistryEvent, RegistryError> {
        self.only_admin(&caller)?;
        if subject.is_zero() {
            return Err(RegistryError::InvalidAddress(subject));
        }
        if content_hash.trim().is_empty() {
            return Err(RegistryError::EmptyContentHash);
        }

        let list = self.records.entry(subject).or_default();
        let index = list.len() as u64;
        list.push(Credential {
            subject_address: subject,
            index,
            record_hash,
            content_hash: content_hash.clone(),
            issuer: caller,
            timestamp: now,
            valid: true,
        });

        Ok(RegistryEvent::CredentialIssued {
            subject_address: subject,
            index,
            record_hash,
            content_hash,
            issuer: caller,
            timestamp: now,
        })
    }

    /// Replaces both hashes in place. `index`, `issuer`, `timestamp` and
    /// `valid` are preserved, so a revoked credential stays revoked.
    pub fn update(
        &mut self,
        caller: Address,
        subject: Address,
        index: u64,
        record_hash: H256,
        content_hash: String,
        now: i64,
    ) -> Result<RegistryEvent, RegistryError> {
        self.only_admin(&caller)?;
        if content_hash.trim().is_empty() {
            return Err(RegistryError::EmptyContentHash);
        }
        let credential = self.entry_mut(subject, index)?;
        credential.record_hash = record_hash;
        credential.content_hash = content_hash.clone();

        Ok(RegistryEvent::CredentialUpdated {
            subject_address: subject,
            index,
            record_hash,
            content_hash,
            updated_by: caller,
            timestamp: now,
        })
    }

    pub fn revoke(
        &mut self,
        caller: Address,
        subject: Address,
        index: u64,
        now: i64,
    ) -> Result<RegistryEvent, RegistryError> {
        self.only_admin(&caller)?;
        let credential = self.entry_mut(subject, index)?;
        if !credential.valid {
            return Err(RegistryError::AlreadyRevoked { subject, index });
        }
        credential.valid = false;

        Ok(RegistryEvent::CredentialRevoked {
            subject_address: subject,
            index,
            revoked_by: caller,
            timestamp: now,
        })
    }

    pub fn get(&self, subject: &Address, index: u64) -> Result<&Credential, RegistryError> {
        self.records
            .get(subject)
            .and_then(|list| list.get(index as usize))
            .ok_or(RegistryError::NotFound {
                subject: *subject,
                index,
            })
    }

    /// Credentials ever issued to `subject`, revoked ones included.
    pub fn count(&self, subject: &Address) -> u64 {
        self.records.get(subject).map_or(0, |list| list.len() as u64)
    }

    /// True iff the credential exists, is still valid and commits to exactly `candidate`.
    pub fn verify(&self, subject: &Address, index: u64, candidate: &H256) -> bool {
        match self.get(subject, index) {
            Ok(credential) => credential.valid && credential.record_hash == *candidate,
            Err(_) => false,
        }
    }

    /// Number of subjects holding at least one credential.
    pub fn subject_count(&self) -> usize {
        self.records.len()
    }
}
