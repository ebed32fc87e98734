use std::collections::VecDeque;
use std::sync::Arc;

use authodox::chain_reader::ChainReader;
use authodox::content::{ContentResolver, PinataConfig, PinataContentStore};
use authodox::gallery::GalleryService;
use authodox::infra::{ProofCache, ProofLedger, SqliteProofCache};
use authodox::ledger::{AlloyLedger, LedgerConfig};
use authodox::telemetry::{init_telemetry, TelemetryConfig};
use authodox::ContentId;

fn print_help() {
    eprintln!(
        "\
authodox-admin

USAGE:
  authodox-admin <command> [options]

COMMANDS:
  migrate                         Run database migrations
  list-cache                      List cached proofs, newest first
  scan-chain                      Enumerate proofs directly from the registry
  gallery                         Cached and on-chain proofs, reconciled
  key-status                      Check the configured PINATA_JWT
  fetch-content                   Read content back by content id

COMMON OPTIONS:
  --database-url <sqlite_url>     (defaults to env DATABASE_URL, then sqlite://authodox.db)

list-cache / scan-chain / gallery OPTIONS:
  --author <address>              (optional) Only proofs by this wallet

fetch-content OPTIONS:
  --id <cid>                      (required) Content id to resolve

ENV:
  PINATA_JWT / PINATA_GATEWAY              content store
  RPC_URL / PROOF_REGISTRY_ADDRESS         registry contract (scan-chain, gallery)
"
    );
}

/// Options shared by every command.
#[derive(Debug, Default)]
struct Options {
    database_url: Option<String>,
    author: Option<String>,
    id: Option<String>,
}

fn parse_options(mut args: VecDeque<String>) -> anyhow::Result<Option<Options>> {
    let mut options = Options::default();
    while let Some(arg) = args.pop_front() {
        match arg.as_str() {
            "--database-url" => {
                options.database_url = Some(
                    args.pop_front()
                        .ok_or_else(|| anyhow::anyhow!("missing value for --database-url"))?,
                );
            }
            "--author" => {
                options.author = Some(
                    args.pop_front()
                        .ok_or_else(|| anyhow::anyhow!("missing value for --author"))?,
                );
            }
            "--id" => {
                options.id = Some(
                    args.pop_front()
                        .ok_or_else(|| anyhow::anyhow!("missing value for --id"))?,
                );
            }
            "-h" | "--help" => return Ok(None),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }
    Ok(Some(options))
}

fn database_url(database_url: Option<String>) -> String {
    database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://authodox.db".to_string())
}

async fn open_cache(options: &Options) -> anyhow::Result<SqliteProofCache> {
    let cache = SqliteProofCache::connect(&database_url(options.database_url.clone()), 1).await?;
    cache.initialize().await?;
    Ok(cache)
}

fn require_ledger() -> anyhow::Result<Arc<dyn ProofLedger>> {
    let config = LedgerConfig::from_env()
        .ok_or_else(|| anyhow::anyhow!("PROOF_REGISTRY_ADDRESS is required"))?;
    Ok(Arc::new(AlloyLedger::new(config)?))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(&TelemetryConfig::for_cli())
        .map_err(|e| anyhow::anyhow!("telemetry init failed: {e}"))?;

    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    let Some(options) = parse_options(args)? else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "migrate" => {
            open_cache(&options).await?;
            println!("ok: migrations applied");
            Ok(())
        }
        "list-cache" => {
            let cache = open_cache(&options).await?;
            let proofs = match options.author.as_deref() {
                Some(author) => cache.query_by_author(author).await?,
                None => cache.query_all().await?,
            };
            print_json(&proofs)
        }
        "scan-chain" => {
            let reader = ChainReader::new(require_ledger()?);
            let proofs = reader.list_records(options.author.as_deref()).await?;
            print_json(&proofs)
        }
        "gallery" => {
            let cache = open_cache(&options).await?;
            let chain = match LedgerConfig::from_env() {
                Some(config) => Some(ChainReader::new(Arc::new(AlloyLedger::new(config)?))),
                None => {
                    eprintln!("warning: PROOF_REGISTRY_ADDRESS not set; showing cache only");
                    None
                }
            };
            let gallery = GalleryService::new(Arc::new(cache), chain);
            let view = gallery.list(options.author.as_deref()).await?;
            print_json(&view)
        }
        "key-status" => {
            let status = PinataConfig::from_env().key_status();
            println!("{:?}: {}", status, status.message());
            if !status.is_valid() {
                std::process::exit(1);
            }
            Ok(())
        }
        "fetch-content" => {
            let id = options
                .id
                .ok_or_else(|| anyhow::anyhow!("--id is required"))?;
            let store = Arc::new(PinataContentStore::new(PinataConfig::from_env()));
            let resolver = ContentResolver::new(store);
            let content = resolver.resolve(&ContentId::new(id)).await?;
            print_json(&content)
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
