// Signed ledger transactions and their receipts.

use crate::crypto::signer::{address_from_public_key, verify_signature, AdminKey, PUBLIC_KEY_LEN};
use crate::domain::address::Address;
use crate::domain::directory::{DirectoryEvent, SubjectProfile};
use crate::domain::registry::RegistryEvent;
use crate::infra::ledger::LedgerError;
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain separation prefix for transaction signatures.
const TX_DOMAIN: &[u8] = b"ACADEMIC-RECORDS-TX";

/// A state-changing call against one of the two contracts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Command {
    RegisterSubject {
        address: Address,
        profile: SubjectProfile,
    },
    UpdateSubject {
        address: Address,
        profile: SubjectProfile,
    },
    DeactivateSubject {
        address: Address,
    },
    ReactivateSubject {
        address: Address,
    },
    AddDirectoryAdmin {
        admin: Address,
    },
    #[serde(rename_all = "camelCase")]
    IssueCredential {
        subject: Address,
        record_hash: H256,
        content_hash: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateCredential {
        subject: Address,
        index: u64,
        record_hash: H256,
        content_hash: String,
    },
    RevokeCredential {
        subject: Address,
        index: u64,
    },
    AddRegistryAdmin {
        admin: Address,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterSubject { .. } => "registerSubject",
            Command::UpdateSubject { .. } => "updateSubject",
            Command::DeactivateSubject { .. } => "deactivateSubject",
            Command::ReactivateSubject { .. } => "reactivateSubject",
            Command::AddDirectoryAdmin { .. } => "addDirectoryAdmin",
            Command::IssueCredential { .. } => "issueCredential",
            Command::UpdateCredential { .. } => "updateCredential",
            Command::RevokeCredential { .. } => "revokeCredential",
            Command::AddRegistryAdmin { .. } => "addRegistryAdmin",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBody<'a> {
    command: &'a Command,
    nonce: u64,
    public_key: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub command: Command,
    pub nonce: u64,
    /// Hex encoded Ed25519 public key of the signer.
    pub public_key: String,
    /// Hex encoded Ed25519 signature over the transaction body.
    pub signature: String,
}

impl SignedTransaction {
    pub fn sign(command: Command, nonce: u64, key: &AdminKey) -> Result<Self, LedgerError> {
        let public_key = hex::encode(key.public_key());
        let message = signing_message(&command, nonce, &public_key)?;
        let signature = hex::encode(key.sign(&message));
        Ok(Self {
            command,
            nonce,
            public_key,
            signature,
        })
    }

    /// Checks the signature and returns the signer's account address.
    pub fn verify(&self) -> Result<Address, LedgerError> {
        let public_key = hex::decode(&self.public_key)
            .map_err(|_| LedgerError::MalformedTransaction("public key is not hex".into()))?;
        let signature = hex::decode(&self.signature)
            .map_err(|_| LedgerError::MalformedTransaction("signature is not hex".into()))?;
        let public_key: [u8; PUBLIC_KEY_LEN] = public_key
            .try_into()
            .map_err(|_| LedgerError::MalformedTransaction("public key must be 32 bytes".into()))?;

        let message = signing_message(&self.command, self.nonce, &self.public_key)?;
        verify_signature(&public_key, &message, &signature)?;
        Ok(address_from_public_key(&public_key))
    }

    pub fn hash(&self) -> Result<H256, LedgerError> {
        let message = signing_message(&self.command, self.nonce, &self.public_key)?;
        let mut hasher = Sha256::new();
        hasher.update(&message);
        hasher.update(self.signature.as_bytes());
        Ok(H256::from_slice(&hasher.finalize()))
    }
}

fn signing_message(command: &Command, nonce: u64, public_key: &str) -> Result<Vec<u8>, LedgerError> {
    let body = serde_json::to_vec(&TransactionBody {
        command,
        nonce,
        public_key,
    })?;
    let mut message = Vec::with_capacity(TX_DOMAIN.len() + body.len());
    message.extend_from_slice(TX_DOMAIN);
    message.extend_from_slice(&body);
    Ok(message)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "contract", rename_all = "camelCase")]
pub enum LedgerEvent {
    Directory(DirectoryEvent),
    Registry(RegistryEvent),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: u64,
    pub timestamp: i64,
    pub event: LedgerEvent,
}

impl Receipt {
    /// Index assigned by an issuance, if this receipt is for one.
    pub fn issued_index(&self) -> Option<u64> {
        match &self.event {
            LedgerEvent::Registry(RegistryEvent::CredentialIssued { index, .. }) => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        Command::RevokeCredential {
            subject: "0x00000000000000000000000000000000000000bb".parse().unwrap(),
            index: 0,
        }
    }

    #[test]
    fn signed_transaction_recovers_signer() {
        let key = AdminKey::from_seed([3u8; 32]);
        let tx = SignedTransaction::sign(command(), 42, &key).unwrap();
        assert_eq!(tx.verify().unwrap(), key.address());
    }

    #[test]
    fn tampering_breaks_signature() {
        let key = AdminKey::from_seed([3u8; 32]);
        let mut tx = SignedTransaction::sign(command(), 42, &key).unwrap();
        tx.nonce = 43;
        assert!(matches!(tx.verify(), Err(LedgerError::InvalidSignature(_))));

        let mut tx = SignedTransaction::sign(command(), 42, &key).unwrap();
        tx.public_key = hex::encode(AdminKey::from_seed([4u8; 32]).public_key());
        assert!(tx.verify().is_err());

        let mut tx = SignedTransaction::sign(command(), 42, &key).unwrap();
        tx.signature = "zz".into();
        assert!(matches!(tx.verify(), Err(LedgerError::MalformedTransaction(_))));
    }

    #[test]
    fn hash_depends_on_nonce() {
        let key = AdminKey::from_seed([3u8; 32]);
        let a = SignedTransaction::sign(command(), 1, &key).unwrap();
        let b = SignedTransaction::sign(command(), 2, &key).unwrap();
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
        assert_eq!(a.hash().unwrap(), a.clone().hash().unwrap());
    }

    #[test]
    fn command_wire_shape() {
        let value = serde_json::to_value(command()).unwrap();
        assert_eq!(value["method"], "revokeCredential");
        assert_eq!(
            value["params"]["subject"],
            "0x00000000000000000000000000000000000000bb"
        );
    }
}
