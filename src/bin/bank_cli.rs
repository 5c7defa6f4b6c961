use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use banking_client::accounts::AccountsOverview;
use banking_client::auth::{FileTokenStore, TokenProvider};
use banking_client::backend::{BankingBackend, HttpBankingBackend};
use banking_client::clock::{Clock, SystemClock};
use banking_client::configure::{self, AppConfig};
use banking_client::logger::setup_logger;
use banking_client::models::{AccountId, TransferId};
use banking_client::user_service::UserService;
use banking_client::verification::{
    format_timestamp, ConfirmationPoller, OtpVerifier, PaymentForm, TransferInitiator,
};

#[derive(Parser)]
#[command(name = "bank_cli")]
#[command(about = "Pay, confirm and inspect transfers from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// List your accounts
    Accounts,
    /// Show the history of one account
    Transactions {
        #[arg(long)]
        account: String,
    },
    /// Show recent transfers with their codes and countdowns
    Transfers,
    /// Create a pending transfer
    Pay {
        #[arg(long)]
        from: String,
        #[arg(long)]
        receiver: String,
        #[arg(long = "to")]
        recipient_account: String,
        #[arg(long = "code", default_value = "289")]
        payment_code: String,
        #[arg(long = "description")]
        payment_description: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        address: String,
        #[arg(long = "reference", default_value = "")]
        payment_reference: String,
        /// Confirm right away with the issued code
        #[arg(long)]
        confirm: bool,
    },
    /// Confirm a pending transfer with its one-time code
    Verify {
        #[arg(long = "transfer")]
        transfer_id: TransferId,
        #[arg(long)]
        otp: String,
    },
}

struct App {
    config: AppConfig,
    store: Arc<FileTokenStore>,
    backend: Arc<dyn BankingBackend>,
    clock: Arc<dyn Clock>,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let store = Arc::new(FileTokenStore::new(&config.token_file));
        let tokens: Arc<dyn TokenProvider> = store.clone();
        let backend = HttpBankingBackend::new(&config.banking_client(), tokens)
            .context("Failed to build banking client")?;
        Ok(Self {
            config,
            store,
            backend: Arc::new(backend),
            clock: Arc::new(SystemClock),
        })
    }

    fn users(&self) -> Result<UserService> {
        UserService::new(&self.config.user_client(), self.store.clone())
            .context("Failed to build user service client")
    }

    fn require_login(&self, users: &UserService) -> Result<AccountId> {
        users
            .current_user_id()
            .ok_or_else(|| anyhow!("Not logged in. Run `bank_cli login` first."))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = configure::load_config().context("Failed to load configuration")?;
    if let Err(e) = setup_logger(&config) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = Cli::parse();
    let app = App::new(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            let users = app.users()?;
            let user_id = users
                .login(&email, &password)
                .await
                .map_err(|e| anyhow!("Login failed: {}", e))?;
            println!("✅ Logged in as user {}", user_id);
        }
        Commands::Logout => {
            app.users()?.logout()?;
            println!("Logged out");
        }
        Commands::Accounts => {
            let users = app.users()?;
            let user_id = app.require_login(&users)?;
            let accounts = AccountsOverview::new(app.backend.clone())
                .accounts(&user_id)
                .await;
            if accounts.is_empty() {
                println!("No accounts");
            }
            for account in accounts {
                println!(
                    "{:<8} {:<12} {:<12} {}",
                    account.id, account.subtype, account.number, account.balance
                );
            }
        }
        Commands::Transactions { account } => {
            let users = app.users()?;
            app.require_login(&users)?;
            let account_id = AccountId::new(&account);
            let history = AccountsOverview::new(app.backend.clone())
                .transactions(&account_id)
                .await;
            if history.is_empty() {
                println!("No transactions for account {}", account_id);
            }
            for t in history {
                println!(
                    "{}  {}{} {}  {}",
                    format_timestamp(t.timestamp),
                    t.direction.sign(),
                    t.amount,
                    t.currency,
                    t.receiver_account
                );
            }
        }
        Commands::Transfers => {
            let users = app.users()?;
            app.require_login(&users)?;
            let mut poller = ConfirmationPoller::new(
                app.backend.clone(),
                app.clock.clone(),
                app.config.code_tracker(),
                app.config.poller(),
            );
            if let Some(viewer) = users.viewer().await {
                poller = poller.with_viewer(viewer);
            }
            if !poller.refresh().await {
                return Err(anyhow!("Could not load transfers"));
            }
            let snapshot = poller.snapshot();
            if snapshot.rows.is_empty() {
                println!("No transfers");
            }
            for row in &snapshot.rows {
                println!("{}", row);
            }
        }
        Commands::Pay {
            from,
            receiver,
            recipient_account,
            payment_code,
            payment_description,
            amount,
            address,
            payment_reference,
            confirm,
        } => {
            let form = PaymentForm {
                from_account_number: from,
                receiver_name: receiver,
                recipient_account,
                payment_code,
                payment_description,
                amount,
                address,
                payment_reference,
            };
            let initiator = TransferInitiator::new(app.backend.clone());
            let pending = initiator
                .submit_and_fetch_code(&form)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Transfer {} created, waiting for confirmation", pending.transfer_id);

            match (pending.otp, confirm) {
                (Some(otp), true) => {
                    let verifier = OtpVerifier::new(
                        app.backend.clone(),
                        app.clock.clone(),
                        app.config.code_tracker(),
                    );
                    verifier
                        .verify(pending.transfer_id, &otp)
                        .await
                        .map_err(|e| anyhow!("{}", e))?;
                    println!("✅ Transfer {} confirmed", pending.transfer_id);
                }
                (Some(otp), false) => {
                    println!(
                        "Code: {} (valid for {} s)",
                        otp.to_uppercase(),
                        app.config.otp_ttl_ms / 1000
                    );
                }
                (None, _) => {
                    println!("Code not available yet; run `bank_cli transfers` to see it");
                }
            }
        }
        Commands::Verify { transfer_id, otp } => {
            let verifier = OtpVerifier::new(
                app.backend.clone(),
                app.clock.clone(),
                app.config.code_tracker(),
            );
            verifier
                .verify(transfer_id, &otp)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("✅ Transfer {} confirmed", transfer_id);
        }
    }

    Ok(())
}
