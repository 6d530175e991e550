//! In-process ledger hosting both contracts.
//!
//! All transactions execute one at a time under a single lock, so each command is
//! atomic with respect to every other. When a state file is configured the whole
//! state is written after each block (temp file + rename) and reloaded on start.

use crate::domain::access::AdminRoles;
use crate::domain::address::Address;
use crate::domain::directory::{Subject, SubjectDirectory, SubjectPage};
use crate::domain::registry::{Credential, CredentialRegistry};
use crate::infra::ledger::{
    Command, Contract, Ledger, LedgerError, LedgerEvent, LedgerStatus, LoggedEvent, Receipt,
    SignedTransaction,
};
use async_trait::async_trait;
use chrono::Utc;
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerState {
    block_number: u64,
    directory: SubjectDirectory,
    registry: CredentialRegistry,
    executed: BTreeSet<H256>,
    events: Vec<LoggedEvent>,
}

impl LedgerState {
    fn genesis(admins: &[Address]) -> Self {
        let roles = AdminRoles::with_admins(admins.iter().copied());
        Self {
            block_number: 0,
            directory: SubjectDirectory::new(roles.clone()),
            registry: CredentialRegistry::new(roles),
            executed: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    fn execute(
        &mut self,
        caller: Address,
        tx_hash: H256,
        command: Command,
        timestamp: i64,
    ) -> Result<Receipt, LedgerError> {
        let event = match command {
            Command::RegisterSubject { address, profile } => LedgerEvent::Directory(
                self.directory.register(caller, address, profile, timestamp)?,
            ),
            Command::UpdateSubject { address, profile } => {
                LedgerEvent::Directory(self.directory.update(caller, address, profile)?)
            }
            Command::DeactivateSubject { address } => {
                LedgerEvent::Directory(self.directory.deactivate(caller, address)?)
            }
            Command::ReactivateSubject { address } => {
                LedgerEvent::Directory(self.directory.reactivate(caller, address)?)
            }
            Command::AddDirectoryAdmin { admin } => {
                LedgerEvent::Directory(self.directory.add_admin(caller, admin)?)
            }
            Command::IssueCredential {
                subject,
                record_hash,
                content_hash,
            } => LedgerEvent::Registry(self.registry.issue(
                caller,
                subject,
                record_hash,
                content_hash,
                timestamp,
            )?),
            Command::UpdateCredential {
                subject,
                index,
                record_hash,
                content_hash,
            } => LedgerEvent::Registry(self.registry.update(
                caller,
                subject,
                index,
                record_hash,
                content_hash,
                timestamp,
            )?),
            Command::RevokeCredential { subject, index } => {
                LedgerEvent::Registry(self.registry.revoke(caller, subject, index, timestamp)?)
            }
            Command::AddRegistryAdmin { admin } => {
                LedgerEvent::Registry(self.registry.add_admin(caller, admin)?)
            }
        };

        self.block_number += 1;
        self.executed.insert(tx_hash);
        self.events.push(LoggedEvent {
            block_number: self.block_number,
            tx_hash,
            timestamp,
            event: event.clone(),
        });

        Ok(Receipt {
            tx_hash,
            block_number: self.block_number,
            timestamp,
            event,
        })
    }
}

pub struct LocalLedger {
    state: Mutex<LedgerState>,
    state_file: Option<PathBuf>,
}

impl LocalLedger {
    /// Volatile ledger whose genesis grants both admin roles to `admins`.
    pub fn in_memory(admins: &[Address]) -> Self {
        Self {
            state: Mutex::new(LedgerState::genesis(admins)),
            state_file: None,
        }
    }

    /// Loads the ledger from `state_file`, or creates it from genesis if the file
    /// does not exist yet. Genesis admins are ignored when resuming.
    pub async fn open(admins: &[Address], state_file: PathBuf) -> Result<Self, LedgerError> {
        let state = if tokio::fs::try_exists(&state_file)
            .await
            .map_err(|e| LedgerError::Persistence(e.to_string()))?
        {
            let state = Self::load_state(&state_file).await?;
            info!(
                path = %state_file.display(),
                block_number = state.block_number,
                "Resumed ledger from state file"
            );
            state
        } else {
            let state = LedgerState::genesis(admins);
            Self::save_state(&state_file, &state).await?;
            info!(
                path = %state_file.display(),
                admins = admins.len(),
                "Created ledger state file from genesis"
            );
            state
        };

        Ok(Self {
            state: Mutex::new(state),
            state_file: Some(state_file),
        })
    }

    async fn load_state(path: &Path) -> Result<LedgerState, LedgerError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| LedgerError::Persistence(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&content)
            .map_err(|e| LedgerError::Persistence(format!("{}: {}", path.display(), e)))
    }

    async fn save_state(path: &Path, state: &LedgerState) -> Result<(), LedgerError> {
        let content = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| LedgerError::Persistence(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| LedgerError::Persistence(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn submit(&self, tx: SignedTransaction) -> Result<Receipt, LedgerError> {
        let caller = tx.verify()?;
        let tx_hash = tx.hash()?;
        let method = tx.command.name();

        let mut state = self.state.lock().await;
        if state.executed.contains(&tx_hash) {
            warn!(?tx_hash, "Rejected replayed transaction");
            return Err(LedgerError::DuplicateTransaction(tx_hash));
        }
        let timestamp = Utc::now().timestamp();

        let receipt = match &self.state_file {
            Some(path) => {
                let mut next = state.clone();
                let receipt = next.execute(caller, tx_hash, tx.command, timestamp)?;
                Self::save_state(path, &next).await?;
                *state = next;
                receipt
            }
            None => state.execute(caller, tx_hash, tx.command, timestamp)?,
        };

        debug!(
            method,
            %caller,
            block_number = receipt.block_number,
            ?tx_hash,
            "Transaction executed"
        );
        Ok(receipt)
    }

    async fn subject(&self, address: Address) -> Result<Subject, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.directory.get(&address)?.clone())
    }

    async fn is_registered(&self, address: Address) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.directory.is_registered(&address))
    }

    async fn subject_count(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.directory.count())
    }

    async fn subject_range(&self, start: i64, count: i64) -> Result<Vec<Address>, LedgerError> {
        Ok(self.state.lock().await.directory.list_range(start, count)?)
    }

    async fn subject_page(&self, start: i64, count: i64) -> Result<SubjectPage, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .directory
            .list_all_paginated(start, count)?)
    }

    async fn credential(&self, subject: Address, index: u64) -> Result<Credential, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.registry.get(&subject, index)?.clone())
    }

    async fn credential_count(&self, subject: Address) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.registry.count(&subject))
    }

    async fn verify_credential(
        &self,
        subject: Address,
        index: u64,
        record_hash: H256,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .registry
            .verify(&subject, index, &record_hash))
    }

    async fn is_admin(&self, contract: Contract, address: Address) -> Result<bool, LedgerError> {
        let state = self.state.lock().await;
        Ok(match contract {
            Contract::Directory => state.directory.is_admin(&address),
            Contract::Registry => state.registry.is_admin(&address),
        })
    }

    async fn status(&self) -> Result<LedgerStatus, LedgerError> {
        let state = self.state.lock().await;
        Ok(LedgerStatus {
            block_number: state.block_number,
            subject_count: state.directory.count(),
            credential_holders: state.registry.subject_count() as u64,
            event_count: state.events.len() as u64,
            directory_admins: state.directory.admins().admins().copied().collect(),
            registry_admins: state.registry.admins().admins().copied().collect(),
            state_file: self
                .state_file
                .as_ref()
                .map(|p| p.display().to_string()),
        })
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<LoggedEvent>, LedgerError> {
        let state = self.state.lock().await;
        let skip = state.events.len().saturating_sub(limit);
        Ok(state.events[skip..].to_vec())
    }
}
