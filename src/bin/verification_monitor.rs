use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

use banking_client::auth::{FileTokenStore, TokenProvider};
use banking_client::backend::{BankingBackend, HttpBankingBackend, MockBackend};
use banking_client::clock::{Clock, SystemClock};
use banking_client::configure;
use banking_client::logger::setup_logger;
use banking_client::models::{Transfer, TransferId, TransferStatus};
use banking_client::user_service::UserService;
use banking_client::verification::{ConfirmationPoller, VerificationSnapshot};

#[derive(Parser)]
#[command(name = "verification_monitor")]
#[command(about = "Live view of transfers awaiting confirmation")]
struct Cli {
    /// Run against an in-memory bank with one pending transfer
    #[arg(long)]
    demo: bool,
}

fn print_snapshot(snapshot: &VerificationSnapshot) {
    println!();
    println!(
        "=== {} transfer(s), {} pending{} ===",
        snapshot.rows.len(),
        snapshot.pending_ids().len(),
        if snapshot.refreshing { ", refreshing" } else { "" }
    );
    for row in &snapshot.rows {
        println!("{}", row);
    }
    println!("[r] refresh  [f] focus  [q] quit");
}

fn demo_backend(clock: Arc<dyn Clock>) -> Arc<dyn BankingBackend> {
    let backend = MockBackend::new(clock.clone());
    let mut transfer = Transfer::new(TransferId::new(1), TransferStatus::Pending);
    transfer.amount = Decimal::new(150000, 2);
    transfer.receiver = Some("Demo Receiver".to_string());
    transfer.created_at = Some(clock.now_ms());
    transfer.otp = Some("123456".to_string());
    backend.insert_transfer(transfer);
    Arc::new(backend)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = configure::load_config().context("Failed to load configuration")?;
    if let Err(e) = setup_logger(&config) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = Cli::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut viewer = None;
    let backend: Arc<dyn BankingBackend> = if cli.demo {
        demo_backend(clock.clone())
    } else {
        let store = Arc::new(FileTokenStore::new(&config.token_file));
        let users = UserService::new(&config.user_client(), store.clone())?;
        if users.current_user_id().is_none() {
            return Err(anyhow!("Not logged in. Run `bank_cli login` first."));
        }
        viewer = users.viewer().await;
        let tokens: Arc<dyn TokenProvider> = store;
        Arc::new(HttpBankingBackend::new(&config.banking_client(), tokens)?)
    };

    let poller = ConfirmationPoller::new(
        backend,
        clock,
        config.code_tracker(),
        config.poller(),
    );
    poller.set_viewer(viewer);

    let handle = Arc::new(poller).spawn();
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
            line = lines.next_line() => {
                match line.context("Failed to read stdin")?.as_deref().map(str::trim) {
                    Some("r") => {
                        if !handle.refresh().await {
                            log::warn!("Manual refresh was not applied");
                        }
                    }
                    Some("f") => handle.activate(),
                    Some("q") | None => break,
                    Some(_) => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
