use crate::app::error::ServiceError;
use crate::crypto::signer::AdminKey;
use crate::infra::ledger::{Command, SignedTransaction};
use secrecy::SecretString;

/// Builds signed transactions for the services.
///
/// The service layer does not decide who may mutate state: it signs with the
/// credential the request carries (or the configured default) and the ledger's
/// contracts check the resulting address.
pub struct TransactionSigner {
    default_key: Option<AdminKey>,
}

impl TransactionSigner {
    pub fn new(default_key: Option<AdminKey>) -> Self {
        Self { default_key }
    }

    pub fn from_secret(secret: Option<&SecretString>) -> Result<Self, ServiceError> {
        let default_key = secret.map(AdminKey::from_hex).transpose()?;
        Ok(Self::new(default_key))
    }

    pub fn has_default_key(&self) -> bool {
        self.default_key.is_some()
    }

    /// Picks the request key when present, else the configured one. Parsing
    /// happens here so callers can reject a bad key before any side effect.
    pub fn resolve(
        &self,
        private_key: Option<&SecretString>,
    ) -> Result<SigningKey<'_>, ServiceError> {
        match private_key {
            Some(secret) => Ok(SigningKey::Request(AdminKey::from_hex(secret)?)),
            None => match &self.default_key {
                Some(key) => Ok(SigningKey::Configured(key)),
                None => Err(ServiceError::missing_field("privateKey")),
            },
        }
    }

    pub fn sign(
        &self,
        command: Command,
        private_key: Option<&SecretString>,
    ) -> Result<SignedTransaction, ServiceError> {
        self.resolve(private_key)?.sign(command)
    }
}

/// A key ready to sign, either parsed from the request or the server default.
pub enum SigningKey<'a> {
    Request(AdminKey),
    Configured(&'a AdminKey),
}

impl SigningKey<'_> {
    fn key(&self) -> &AdminKey {
        match self {
            SigningKey::Request(key) => key,
            SigningKey::Configured(key) => *key,
        }
    }

    pub fn sign(&self, command: Command) -> Result<SignedTransaction, ServiceError> {
        let nonce = rand::random::<u64>();
        Ok(SignedTransaction::sign(command, nonce, self.key())?)
    }
}
