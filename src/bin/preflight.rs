use academic_records::infra::config::Config;
use academic_records::infra::ipfs::{ContentBackend, GatewayFetcher, IpfsNodeBackend, PinataBackend};
use academic_records::infra::ledger::{Ledger, LocalLedger};
use academic_records::AdminKey;
use secrecy::ExposeSecret;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--init-state-if-missing] [--generate-key]\n\
         \n\
         Reads the same env vars as api_server:\n\
           ADMIN_PRIVATE_KEY or ADMIN_ADDRESS (required)\n\
           LEDGER_STATE_PATH, IPFS_API_URL, IPFS_GATEWAYS, PINATA_JWT (optional)\n\
         \n\
         --generate-key prints a fresh admin key and exits.\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    if args.iter().any(|a| a == "--generate-key") {
        let key = AdminKey::generate();
        println!("ADMIN_PRIVATE_KEY={}", key.seed_hex().expose_secret());
        println!("# address: {}", key.address());
        return Ok(());
    }
    let init_state_if_missing = args.iter().any(|a| a == "--init-state-if-missing");

    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  BIND_ADDR={}", config.bind_addr);
    for admin in &config.genesis_admins {
        println!("  Genesis admin: {}", admin);
    }
    if config.admin_key.is_none() {
        eprintln!("  Warning: ADMIN_PRIVATE_KEY not set; every mutating request must carry privateKey.");
    }

    // Ledger state file
    match &config.ledger_state_path {
        None => println!("  LEDGER_STATE_PATH not set: ledger state is lost on restart."),
        Some(path) if path.exists() => {
            let ledger = LocalLedger::open(&config.genesis_admins, path.clone())
                .await
                .map_err(|e| anyhow::anyhow!("Ledger state file {} is unreadable: {}", path.display(), e))?;
            let status = ledger.status().await?;
            println!(
                "  Ledger state: {} (block {}, {} students, {} credential holders)",
                path.display(),
                status.block_number,
                status.subject_count,
                status.credential_holders
            );
            let missing: Vec<_> = config
                .genesis_admins
                .iter()
                .filter(|a| !status.registry_admins.contains(a))
                .collect();
            if !missing.is_empty() {
                eprintln!(
                    "  Warning: configured admins {:?} are not registry admins in the stored state.",
                    missing
                );
            }
        }
        Some(path) if init_state_if_missing => {
            LocalLedger::open(&config.genesis_admins, path.clone()).await?;
            println!("  Created ledger state file {} from genesis.", path.display());
        }
        Some(path) => {
            println!(
                "  Ledger state file {} does not exist yet (created on first start, or pass --init-state-if-missing).",
                path.display()
            );
        }
    }

    // Content store
    let node = IpfsNodeBackend::new(config.ipfs.api_url.clone(), config.ipfs.api_timeout)?;
    let node_up = node.is_available().await;
    println!(
        "  IPFS node {}: {}",
        config.ipfs.api_url,
        if node_up { "reachable" } else { "UNREACHABLE" }
    );
    let mut pinata_up = false;
    if let Some(pinata) = &config.ipfs.pinata {
        pinata_up = PinataBackend::new(pinata, config.ipfs.api_timeout)?
            .is_available()
            .await;
        println!(
            "  Pinata {}: {}",
            pinata.api_url,
            if pinata_up { "authenticated" } else { "UNAVAILABLE" }
        );
    }
    if !node_up && !pinata_up {
        eprintln!("  Warning: no content backend available; uploads will use local fingerprints only.");
    }

    let gateways = GatewayFetcher::new(config.ipfs.gateways.clone(), config.ipfs.gateway_timeout);
    println!("  Retrieval gateways ({} ms timeout each):", config.ipfs.gateway_timeout.as_millis());
    for gateway in gateways.gateways() {
        println!("    {}", gateway);
    }

    println!("> Preflight OK.");
    Ok(())
}
