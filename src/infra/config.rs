//! Centralized configuration (environment variables + defaults).
//!
//! Built once at process start and handed to constructors; nothing reads the
//! environment after that.

use crate::crypto::signer::{AdminKey, KeyError};
use crate::domain::address::{Address, AddressParseError};
use secrecy::SecretString;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_IPFS_API_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_PINATA_GATEWAY_URL: &str = "https://gateway.pinata.cloud";
/// Public retrieval gateways, tried in this order.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io",
    "https://dweb.link",
    "https://cloudflare-ipfs.com",
];
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("ADMIN_PRIVATE_KEY is invalid: {0}")]
    AdminKey(#[from] KeyError),
    #[error("ADMIN_ADDRESS is invalid: {0}")]
    AdminAddress(#[from] AddressParseError),
    #[error("no genesis admin configured: set ADMIN_PRIVATE_KEY or ADMIN_ADDRESS")]
    NoAdmin,
}

#[derive(Clone, Debug)]
pub struct IpfsConfig {
    /// Base URL of the IPFS node HTTP API (Kubo `/api/v0`).
    pub api_url: String,
    pub api_timeout: Duration,
    pub gateways: Vec<String>,
    /// Per-gateway retrieval timeout.
    pub gateway_timeout: Duration,
    pub pinata: Option<PinataConfig>,
}

#[derive(Clone, Debug)]
pub struct PinataConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub jwt: SecretString,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Ledger state file; `None` keeps the ledger in memory.
    pub ledger_state_path: Option<PathBuf>,
    /// Addresses granted both admin roles at genesis.
    pub genesis_admins: Vec<Address>,
    /// Signs mutations whose request carries no `privateKey` of its own.
    pub admin_key: Option<SecretString>,
    pub ipfs: IpfsConfig,
    pub max_upload_bytes: usize,
    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let mut genesis_admins = Vec::new();
        let admin_key = get("ADMIN_PRIVATE_KEY").map(SecretString::from);
        if let Some(key) = &admin_key {
            genesis_admins.push(AdminKey::from_hex(key)?.address());
        }
        if let Some(address) = get("ADMIN_ADDRESS") {
            let address: Address = address.parse()?;
            if !genesis_admins.contains(&address) {
                genesis_admins.push(address);
            }
        }
        if genesis_admins.is_empty() {
            return Err(ConfigError::NoAdmin);
        }

        let gateways = match get("IPFS_GATEWAYS") {
            Some(list) => list
                .split(',')
                .map(|g| g.trim().trim_end_matches('/').to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            None => DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
        };

        let pinata = get("PINATA_JWT").map(|jwt| PinataConfig {
            api_url: get("PINATA_API_URL").unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string()),
            gateway_url: get("PINATA_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_PINATA_GATEWAY_URL.to_string()),
            jwt: SecretString::from(jwt),
        });

        Ok(Self {
            bind_addr,
            ledger_state_path: get("LEDGER_STATE_PATH").map(PathBuf::from),
            genesis_admins,
            admin_key,
            ipfs: IpfsConfig {
                api_url: get("IPFS_API_URL")
                    .unwrap_or_else(|| DEFAULT_IPFS_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_timeout: Duration::from_millis(parse_or(vars, "IPFS_API_TIMEOUT_MS", 10_000)?),
                gateways,
                gateway_timeout: Duration::from_millis(parse_or(
                    vars,
                    "IPFS_GATEWAY_TIMEOUT_MS",
                    5_000,
                )?),
                pinata,
            },
            max_upload_bytes: parse_or(vars, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES as u64)?
                as usize,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: get("LOG_JSON").is_some_and(|v| v == "true" || v == "1"),
        })
    }
}

fn parse_or(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
